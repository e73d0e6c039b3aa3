//! Keyword-matching memory kept in process.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MemoryFact, MemoryService};
use crate::error::Result;
use crate::session::Session;
use crate::types::Role;

type Scope = (String, String);

/// Stores the text turns of saved sessions and returns the ones sharing a
/// word with the query.
#[derive(Debug, Default)]
pub struct InMemoryMemoryService {
    // Latest snapshot per session id, within an (app, user) scope.
    entries: RwLock<HashMap<Scope, HashMap<String, Vec<String>>>>,
}

impl InMemoryMemoryService {
    pub fn new() -> Self {
        Self::default()
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl MemoryService for InMemoryMemoryService {
    async fn add_session_to_memory(&self, session: &Session) -> Result<()> {
        let turns: Vec<String> = session
            .messages
            .iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant))
            .map(|m| m.text())
            .filter(|t| !t.trim().is_empty())
            .collect();

        let scope = (session.key.app_name.clone(), session.key.user_id.clone());
        self.entries
            .write()
            .await
            .entry(scope)
            .or_default()
            .insert(session.key.session_id.clone(), turns);
        Ok(())
    }

    async fn search_memory(
        &self,
        app_name: &str,
        user_id: &str,
        query: &str,
    ) -> Result<Vec<MemoryFact>> {
        let query_words: Vec<String> = words(query).collect();
        let entries = self.entries.read().await;
        let Some(sessions) = entries.get(&(app_name.to_string(), user_id.to_string())) else {
            return Ok(Vec::new());
        };

        let mut session_ids: Vec<&String> = sessions.keys().collect();
        session_ids.sort();
        Ok(session_ids
            .into_iter()
            .flat_map(|id| sessions[id].iter())
            .filter(|turn| words(turn).any(|w| query_words.contains(&w)))
            .map(MemoryFact::new)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKey;
    use crate::types::ModelMessage;

    fn session(user: &str, id: &str, turns: &[ModelMessage]) -> Session {
        let mut session = Session::new(SessionKey::new("agents", user, id));
        session.messages.extend_from_slice(turns);
        session
    }

    #[tokio::test]
    async fn search_matches_shared_words() {
        let memory = InMemoryMemoryService::new();
        memory
            .add_session_to_memory(&session(
                "demo_user",
                "s1",
                &[
                    ModelMessage::user("I love skiing in the Alps"),
                    ModelMessage::assistant("Snowflakes it is!"),
                ],
            ))
            .await
            .unwrap();

        let facts = memory
            .search_memory("agents", "demo_user", "Make a SKIING sweater")
            .await
            .unwrap();
        assert_eq!(facts, vec![MemoryFact::new("I love skiing in the Alps")]);
    }

    #[tokio::test]
    async fn other_users_memories_are_invisible() {
        let memory = InMemoryMemoryService::new();
        memory
            .add_session_to_memory(&session("alice", "s1", &[ModelMessage::user("reindeer")]))
            .await
            .unwrap();
        let facts = memory.search_memory("agents", "bob", "reindeer").await.unwrap();
        assert!(facts.is_empty());
    }

    #[tokio::test]
    async fn saving_a_session_again_replaces_its_snapshot() {
        let memory = InMemoryMemoryService::new();
        let mut s = session("u", "s1", &[ModelMessage::user("red lights")]);
        memory.add_session_to_memory(&s).await.unwrap();
        s.messages.push(ModelMessage::assistant("Red lights are on"));
        memory.add_session_to_memory(&s).await.unwrap();

        let facts = memory.search_memory("agents", "u", "red").await.unwrap();
        assert_eq!(facts.len(), 2);
    }
}
