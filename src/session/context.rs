//! Patient context and session extras sent with every chat relay call

use serde::{Deserialize, Serialize};

use crate::journey::DEFAULT_AVAILABLE_TOOLS;

/// Fixed-shape patient metadata, built once per session
///
/// Field names on the wire match what the chat endpoint already receives,
/// including the mixed casing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientContext {
    #[serde(rename = "patientName")]
    pub patient_name: String,

    #[serde(rename = "emotionalState")]
    pub emotional_state: String,

    #[serde(rename = "journeyStage")]
    pub journey_stage: String,

    pub patient_id: String,

    #[serde(rename = "userRole")]
    pub user_role: String,
}

impl Default for PatientContext {
    fn default() -> Self {
        Self {
            patient_name: "Alex Johnson".to_string(),
            emotional_state: "hopeful".to_string(),
            journey_stage: "awareness".to_string(),
            patient_id: "patient_alex_johnson".to_string(),
            user_role: "patient".to_string(),
        }
    }
}

impl PatientContext {
    /// Context for a named patient with the remaining fields defaulted
    #[must_use]
    pub fn for_patient(name: &str) -> Self {
        Self {
            patient_name: name.to_string(),
            patient_id: format!("patient_{}", name.to_lowercase().replace(' ', "_")),
            ..Self::default()
        }
    }
}

/// Tool-panel metadata that travels beside the patient context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExtras {
    pub tool_panel_active: bool,
    pub demonstration_mode: bool,
    pub available_tools: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_tool: Option<String>,
}

impl Default for SessionExtras {
    fn default() -> Self {
        Self {
            tool_panel_active: true,
            demonstration_mode: false,
            available_tools: DEFAULT_AVAILABLE_TOOLS
                .iter()
                .map(ToString::to_string)
                .collect(),
            active_tool: None,
        }
    }
}

/// The `context` object of a chat relay request
#[derive(Debug, Serialize)]
pub struct RelayContext<'a> {
    #[serde(flatten)]
    pub patient: &'a PatientContext,

    #[serde(flatten)]
    pub extras: &'a SessionExtras,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_context_shape() {
        let patient = PatientContext::default();
        let extras = SessionExtras {
            active_tool: Some("symptom-tracker".to_string()),
            ..SessionExtras::default()
        };
        let json = serde_json::to_value(RelayContext {
            patient: &patient,
            extras: &extras,
        })
        .unwrap();

        assert_eq!(json["patientName"], "Alex Johnson");
        assert_eq!(json["emotionalState"], "hopeful");
        assert_eq!(json["journeyStage"], "awareness");
        assert_eq!(json["patient_id"], "patient_alex_johnson");
        assert_eq!(json["userRole"], "patient");
        assert_eq!(json["toolPanelActive"], true);
        assert_eq!(json["demonstrationMode"], false);
        assert_eq!(json["availableTools"].as_array().unwrap().len(), 6);
        assert_eq!(json["activeTool"], "symptom-tracker");
    }

    #[test]
    fn test_for_patient_derives_id() {
        let ctx = PatientContext::for_patient("Sam Rivera");
        assert_eq!(ctx.patient_id, "patient_sam_rivera");
        assert_eq!(ctx.journey_stage, "awareness");
    }
}
