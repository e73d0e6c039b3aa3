use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Session, SessionKey, SessionService};
use crate::error::{Result, TinselError};
use crate::types::ModelMessage;

/// Process-lifetime session store.
#[derive(Debug, Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<SessionKey, Session>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<&str>,
    ) -> Result<Session> {
        let session_id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let key = SessionKey::new(app_name, user_id, session_id);
        let session = Session::new(key.clone());

        let replaced = self
            .sessions
            .write()
            .await
            .insert(key, session.clone())
            .is_some();
        debug!(session_id = session.id(), replaced, "session created");
        Ok(session)
    }

    async fn get_session(&self, key: &SessionKey) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn append_messages(&self, key: &SessionKey, messages: Vec<ModelMessage>) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(key)
            .ok_or_else(|| TinselError::Session(format!("Session not found: {}", key.session_id)))?;
        session.messages.extend(messages);
        session.updated_at = Utc::now();
        Ok(())
    }
}
