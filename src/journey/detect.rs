//! Which tool a conversation turn is about

use super::catalog::{Tool, find_tool};

/// Phrases in the reply or the user's words that point at one tool
struct ToolCue {
    tool_id: &'static str,
    reply: &'static [&'static str],
    input: &'static [&'static str],
}

/// Checked in order; the first match wins
const CUES: [ToolCue; 4] = [
    ToolCue {
        tool_id: "treatment-calendar",
        reply: &["check your schedule", "next appointment", "calendar"],
        input: &["appointment", "schedule"],
    },
    ToolCue {
        tool_id: "appointment-prep",
        reply: &["prepare questions", "start a note", "question list"],
        input: &["questions"],
    },
    ToolCue {
        tool_id: "symptom-tracker",
        reply: &["food diary", "track your food", "track symptoms"],
        input: &["what can i eat", "symptoms"],
    },
    ToolCue {
        tool_id: "medical-translator",
        reply: &["explain", "translate", "medical terms"],
        input: &["what does", "explain this"],
    },
];

/// Find the tool a reply (and the utterance that prompted it) refers to
#[must_use]
pub fn detect_tool(reply: &str, user_input: &str) -> Option<&'static Tool> {
    let reply = reply.to_lowercase();
    let input = user_input.to_lowercase();

    CUES.iter()
        .find(|cue| {
            cue.reply.iter().any(|p| reply.contains(p))
                || cue.input.iter().any(|p| input.contains(p))
        })
        .and_then(|cue| find_tool(cue.tool_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_from_reply() {
        let tool = detect_tool("Let me check your schedule for you.", "hi").unwrap();
        assert_eq!(tool.id, "treatment-calendar");
    }

    #[test]
    fn test_calendar_from_input() {
        let tool = detect_tool("Sure.", "When is my next Appointment?").unwrap();
        assert_eq!(tool.id, "treatment-calendar");
    }

    #[test]
    fn test_first_match_wins() {
        // Both calendar and translator cues present
        let tool = detect_tool("I can explain your calendar", "").unwrap();
        assert_eq!(tool.id, "treatment-calendar");
    }

    #[test]
    fn test_question_prep_and_symptoms() {
        assert_eq!(
            detect_tool("Let's start a note.", "").unwrap().id,
            "appointment-prep"
        );
        assert_eq!(
            detect_tool("Okay.", "what can I eat today").unwrap().id,
            "symptom-tracker"
        );
    }

    #[test]
    fn test_translator() {
        assert_eq!(
            detect_tool("Okay.", "What does metastatic mean?").unwrap().id,
            "medical-translator"
        );
    }

    #[test]
    fn test_no_match() {
        assert!(detect_tool("I'm glad you're feeling hopeful.", "I feel good").is_none());
    }
}
