//! Symptom extraction and the symptom-tracker workflow
//!
//! Both are pure functions of the transcript; nothing is precomputed.

mod extract;
mod workflow;

pub use extract::{DEFAULT_SEVERITY, SymptomData, extract_symptom_data};
pub use workflow::{
    ConfidenceLevel, Workflow, WorkflowAction, WorkflowStep, symptom_tracker_workflow,
};
