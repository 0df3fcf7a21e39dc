//! Journey stages, their tools, and tool detection

mod catalog;
mod detect;

pub use catalog::{
    DEFAULT_AVAILABLE_TOOLS, JourneyStage, Priority, StageInfo, TOOLS, Tool, ToolCategory,
    find_tool,
};
pub use detect::detect_tool;
