//! The Christmas tree's display state and the tools that read and change it.

pub mod state;
pub mod tools;

pub use state::{TreeState, TreeStateHandle};
pub use tools::tree_tools;
