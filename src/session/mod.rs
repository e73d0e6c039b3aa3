//! Conversation sessions keyed by app name, user id and session id.

mod memory_store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ModelMessage;

pub use memory_store::InMemorySessionService;

/// Identifies one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// A server-side conversation: its prior turns in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
    pub messages: Vec<ModelMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(key: SessionKey) -> Self {
        let now = Utc::now();
        Self {
            key,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.key.session_id
    }
}

/// Storage for sessions.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Create a session. `None` generates a fresh id. An existing session
    /// with the same key is replaced.
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<&str>,
    ) -> Result<Session>;

    /// Look a session up; `Ok(None)` when it does not exist.
    async fn get_session(&self, key: &SessionKey) -> Result<Option<Session>>;

    /// Append turns to an existing session.
    async fn append_messages(&self, key: &SessionKey, messages: Vec<ModelMessage>) -> Result<()>;
}
