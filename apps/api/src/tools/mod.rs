//! Tool-calling bridge between the model and the admin API.

pub mod audit;
pub mod dispatch;
pub mod specs;

pub use dispatch::{run_tool_call, ToolRun};
pub use specs::tool_specs;
