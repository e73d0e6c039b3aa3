//! Tools the agent can call: in-process closures and tools listed by a
//! tool server at runtime.

pub mod arguments;
pub mod dynamic;
pub mod params;
pub mod tool;

pub use arguments::ToolArguments;
pub use dynamic::{DynamicToolAdapter, DynamicToolProvider};
pub use params::{no_parameters, ParameterBuilder};
pub use tool::{AgentTool, Tool, ToolExecutionContext};
