//! Vertex AI Memory Bank over REST (`v1beta1` reasoning engine memories).

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::{MemoryFact, MemoryService};
use crate::config::TinselConfig;
use crate::error::{Result, TinselError};
use crate::provider::google::vertex_base_url;
use crate::provider::http::{bearer_headers, shared_client, status_to_error};
use crate::session::Session;
use crate::types::Role;

const API_VERSION: &str = "v1beta1";
const RETRIEVE_TOP_K: u32 = 5;

/// Authenticated access to one project/location of the Vertex AI platform.
#[derive(Clone)]
pub struct MemoryBankClient {
    base_url: String,
    project_id: String,
    location: String,
    access_token: Option<String>,
}

impl std::fmt::Debug for MemoryBankClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBankClient")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl MemoryBankClient {
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        let location = location.into();
        Self {
            base_url: vertex_base_url(&location),
            project_id: project_id.into(),
            location,
            access_token,
        }
    }

    /// Requires `PROJECT_ID`.
    pub fn from_config(config: &TinselConfig) -> Result<Self> {
        let project_id = config.project_id.clone().ok_or_else(|| {
            TinselError::Configuration("PROJECT_ID not found in environment variables.".into())
        })?;
        let access_token = match &config.auth {
            crate::config::AuthMode::Vertex { access_token, .. } => access_token.clone(),
            crate::config::AuthMode::ApiKey { .. } => None,
        };
        let client = Self::new(project_id, config.location.clone(), access_token);
        Ok(match &config.vertex_base_url {
            Some(base) => client.with_base_url(base.clone()),
            None => client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `.../projects/{p}/locations/{l}/{path}` on the versioned API.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{API_VERSION}/projects/{}/locations/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            self.location,
            path.trim_start_matches('/')
        )
    }

    fn headers(&self) -> Result<HeaderMap> {
        self.access_token
            .as_deref()
            .map(bearer_headers)
            .ok_or_else(|| {
                TinselError::Authentication("Missing GOOGLE_ACCESS_TOKEN for Vertex AI".into())
            })
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "Vertex AI POST");
        let resp = shared_client()
            .post(&url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        Ok(resp.json().await?)
    }
}

/// Memory service backed by a registered Memory Bank (reasoning engine).
#[derive(Debug, Clone)]
pub struct VertexMemoryBankService {
    client: MemoryBankClient,
    engine_id: String,
}

impl VertexMemoryBankService {
    pub fn new(client: MemoryBankClient, engine_id: impl Into<String>) -> Self {
        Self {
            client,
            engine_id: engine_id.into(),
        }
    }

    fn memories_path(&self, verb: &str) -> String {
        format!("reasoningEngines/{}/memories:{verb}", self.engine_id)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveMemoriesResponse {
    #[serde(default)]
    retrieved_memories: Vec<RetrievedMemory>,
}

#[derive(Debug, Deserialize)]
struct RetrievedMemory {
    memory: StoredMemory,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredMemory {
    #[serde(default)]
    fact: String,
    #[serde(default)]
    topics: Vec<serde_json::Value>,
}

// Topics come back as {"managedMemoryTopic": "..."} or {"customMemoryTopicLabel": "..."}.
fn topic_label(topic: &serde_json::Value) -> Option<String> {
    topic
        .as_object()?
        .values()
        .find_map(|v| v.as_str())
        .map(str::to_string)
}

#[async_trait]
impl MemoryService for VertexMemoryBankService {
    async fn add_session_to_memory(&self, session: &Session) -> Result<()> {
        let events: Vec<serde_json::Value> = session
            .messages
            .iter()
            .filter_map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                    _ => return None,
                };
                let text = m.text();
                (!text.trim().is_empty()).then(|| {
                    json!({ "content": { "role": role, "parts": [{ "text": text }] } })
                })
            })
            .collect();

        if events.is_empty() {
            debug!(session_id = session.id(), "nothing to save to memory");
            return Ok(());
        }

        let body = json!({
            "directContentsSource": { "events": events },
            "scope": {
                "app_name": session.key.app_name,
                "user_id": session.key.user_id,
            },
        });
        let _operation: serde_json::Value =
            self.client.post(&self.memories_path("generate"), &body).await?;
        info!(session_id = session.id(), "session sent to Memory Bank");
        Ok(())
    }

    async fn search_memory(
        &self,
        app_name: &str,
        user_id: &str,
        query: &str,
    ) -> Result<Vec<MemoryFact>> {
        let body = json!({
            "scope": { "app_name": app_name, "user_id": user_id },
            "similaritySearchParams": { "searchQuery": query, "topK": RETRIEVE_TOP_K },
        });
        let response: RetrieveMemoriesResponse =
            self.client.post(&self.memories_path("retrieve"), &body).await?;

        Ok(response
            .retrieved_memories
            .into_iter()
            .filter(|r| !r.memory.fact.is_empty())
            .map(|r| MemoryFact {
                fact: r.memory.fact,
                topics: r.memory.topics.iter().filter_map(topic_label).collect(),
            })
            .collect())
    }
}
