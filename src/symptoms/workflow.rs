//! Symptom-tracker workflow built from a transcript

use serde::Serialize;

use super::extract::{SymptomData, extract_symptom_data};

/// How sure the extractor is, bucketed for guidance wording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    #[must_use]
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.7 {
            Self::High
        } else if confidence > 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One step the tool panel replays, tagged the way the UI expects
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WorkflowStep {
    #[serde(rename = "show_tool_with_guidance")]
    ShowTool {
        #[serde(rename = "toolName")]
        tool_name: String,
        guidance: String,
    },
    #[serde(rename = "enableAutonomousSymptomTracking")]
    EnableTracking {},
    #[serde(rename = "update_guidance_for_tool")]
    Guidance { guidance: String },
    #[serde(rename = "updateSymptomData")]
    UpdateSymptom { symptom: String, severity: u8 },
    #[serde(rename = "submitSymptomLog")]
    Submit {},
}

/// A step plus the pause before it runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowAction {
    #[serde(flatten)]
    pub step: WorkflowStep,

    /// Milliseconds to wait before this step
    #[serde(rename = "delay", skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl WorkflowAction {
    const fn now(step: WorkflowStep) -> Self {
        Self {
            step,
            delay_ms: None,
        }
    }

    const fn after(delay_ms: u64, step: WorkflowStep) -> Self {
        Self {
            step,
            delay_ms: Some(delay_ms),
        }
    }
}

/// A scripted symptom-logging walk-through
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub name: String,
    pub description: String,
    pub extracted_data: SymptomData,
    pub actions: Vec<WorkflowAction>,
}

impl Workflow {
    /// Sum of all step delays, in milliseconds
    #[must_use]
    pub fn total_delay_ms(&self) -> u64 {
        self.actions.iter().filter_map(|a| a.delay_ms).sum()
    }
}

/// Build the symptom-tracker workflow for one transcript
#[must_use]
pub fn symptom_tracker_workflow(transcript: &str) -> Workflow {
    let data = extract_symptom_data(transcript);
    let SymptomData {
        symptom,
        severity,
        confidence,
    } = &data;

    let (intro, symptom_note, severity_note) = match ConfidenceLevel::from_confidence(*confidence) {
        ConfidenceLevel::High => (
            format!(
                "I understand you're experiencing {symptom}. Let me help you log this in your symptom tracker right away."
            ),
            format!("I'll record \"{symptom}\" as you described."),
            format!("Based on what you've told me, I'm rating this as a {severity} out of 10."),
        ),
        ConfidenceLevel::Medium => (
            "I can help you log what you're experiencing. Let me fill out the symptom tracker for you."
                .to_string(),
            format!("I'll enter \"{symptom}\" - let me know if you'd like me to adjust this."),
            format!("I'm estimating the severity as {severity} out of 10 based on your description."),
        ),
        ConfidenceLevel::Low => (
            "Let me help you log your symptoms. I'll fill out what I understood and you can correct anything if needed."
                .to_string(),
            format!(
                "I'll start with \"{symptom}\" - please let me know if this needs to be more specific."
            ),
            format!("I'm setting the severity to {severity} out of 10 as a starting point."),
        ),
    };

    let confirmation = if *confidence > 0.6 {
        "Perfect! I've logged this information. Let me save it to your health journal."
    } else {
        "I've filled in what I understood. Does this look accurate? I'll save it now."
    };

    let actions = vec![
        WorkflowAction::now(WorkflowStep::ShowTool {
            tool_name: "SymptomTracker".to_string(),
            guidance: intro,
        }),
        WorkflowAction::after(500, WorkflowStep::EnableTracking {}),
        WorkflowAction::after(
            1000,
            WorkflowStep::Guidance {
                guidance: format!("{symptom_note} {severity_note}"),
            },
        ),
        WorkflowAction::after(
            800,
            WorkflowStep::UpdateSymptom {
                symptom: symptom.clone(),
                severity: *severity,
            },
        ),
        WorkflowAction::after(
            1500,
            WorkflowStep::Guidance {
                guidance: confirmation.to_string(),
            },
        ),
        WorkflowAction::after(2000, WorkflowStep::Submit {}),
        WorkflowAction::after(
            1000,
            WorkflowStep::Guidance {
                guidance: "Done! Your symptom has been logged in your private health journal. I'm always here to help track how you're feeling.".to_string(),
            },
        ),
    ];

    Workflow {
        name: "Real-time Autonomous Symptom Tracker".to_string(),
        description: "Automatically extracts symptom information from conversation and fills the tracker in real-time.".to_string(),
        extracted_data: data,
        actions,
    }
}
