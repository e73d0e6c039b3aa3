//! Tinsel: the Holiday Magic Assistant backend.
//!
//! A Gemini-backed tool-using agent that customizes a Christmas tree and
//! generates festive images through an MCP image tool server, served over a
//! small HTTP API.
//!
//! ```no_run
//! # async fn example() -> tinsel::error::Result<()> {
//! let config = tinsel::config::TinselConfig::from_env()?;
//! tinsel::server::run(config).await
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod image_tools;
pub mod mcp;
pub mod memory;
pub mod provider;
pub mod server;
pub mod session;
pub mod tools;
pub mod tree;
pub mod types;
pub mod util;
