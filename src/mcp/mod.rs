//! Model Context Protocol (MCP) client side: spawning the image tool server
//! and exposing its tools to the agent.

pub mod bridge;
pub mod client;
pub mod transport;

pub use bridge::{McpConnector, McpSession, McpToolset};
pub use client::McpClient;
pub use transport::StdioServerCommand;
