//! Utility modules: timeouts and tracked background tasks.

pub mod tasks;
pub mod timeout;
