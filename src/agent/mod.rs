//! The tool-using conversational agent and the runner that drives it.

pub mod agent;
pub mod events;
pub mod holiday;
pub mod runner;

pub use agent::Agent;
pub use events::AgentEvent;
pub use holiday::christmas_tree_agent;
pub use runner::Runner;
