//! Long-term memory: facts extracted from past sessions and recalled into
//! later conversations.

pub mod in_memory;
pub mod registration;
pub mod vertex;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::TinselConfig;
use crate::error::Result;
use crate::session::Session;

pub use in_memory::InMemoryMemoryService;
pub use vertex::{MemoryBankClient, VertexMemoryBankService};

/// A short fact about the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryFact {
    pub fact: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl MemoryFact {
    pub fn new(fact: impl Into<String>) -> Self {
        Self {
            fact: fact.into(),
            topics: Vec::new(),
        }
    }
}

#[async_trait]
pub trait MemoryService: Send + Sync {
    /// Extract and store facts from a finished session.
    async fn add_session_to_memory(&self, session: &Session) -> Result<()>;

    /// Facts relevant to `query` for one user.
    async fn search_memory(
        &self,
        app_name: &str,
        user_id: &str,
        query: &str,
    ) -> Result<Vec<MemoryFact>>;
}

/// The memory service the server runs with: the Vertex Memory Bank when
/// `USE_MEMORY_BANK` is on and an engine is registered, the in-process store
/// otherwise.
pub fn memory_service_from_config(config: &TinselConfig) -> Arc<dyn MemoryService> {
    match (config.use_memory_bank, &config.agent_engine_id) {
        (true, Some(engine_id)) => match MemoryBankClient::from_config(config) {
            Ok(client) => {
                info!(engine_id = %engine_id, "using Vertex AI Memory Bank");
                Arc::new(VertexMemoryBankService::new(client, engine_id.clone()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Memory Bank unavailable; using in-process memory");
                Arc::new(InMemoryMemoryService::new())
            }
        },
        _ => Arc::new(InMemoryMemoryService::new()),
    }
}

/// Render recalled facts for the system instruction.
pub fn format_memories(facts: &[MemoryFact]) -> Option<String> {
    if facts.is_empty() {
        return None;
    }
    let lines: Vec<String> = facts.iter().map(|f| format!("* {}", f.fact)).collect();
    Some(format!(
        "The following content is from your previous conversations with the user. \
         They may be useful for answering the user's current query.\n<PAST_CONVERSATIONS>\n{}\n</PAST_CONVERSATIONS>",
        lines.join("\n")
    ))
}
