//! Shared test helpers and mock provider.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;

use tinsel::agent::{christmas_tree_agent, Runner};
use tinsel::error::TinselError;
use tinsel::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use tinsel::server::{router, AppState};
use tinsel::session::InMemorySessionService;
use tinsel::tools::DynamicToolProvider;
use tinsel::tree::TreeStateHandle;
use tinsel::types::*;

/// A mock provider that returns canned responses in order, then a default
/// text answer.
#[derive(Default)]
pub struct MockProvider {
    responses: std::sync::Mutex<Vec<ProviderResponse>>,
    requests: std::sync::Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text response.
    pub fn queue_response(&self, text: &str) {
        self.responses
            .lock()
            .unwrap()
            .push(ProviderResponse::text(text));
    }

    /// Queue a tool call response.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) {
        self.responses
            .lock()
            .unwrap()
            .push(ProviderResponse::tool_calls(vec![AgentToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: args,
                thought_signature: None,
            }]));
    }

    /// Every request seen so far.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn model_id(&self) -> &str {
        "mock-model"
    }

    async fn generate(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, TinselError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(ProviderResponse::text("Mock response"));
        }
        Ok(responses.remove(0))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub provider: Arc<MockProvider>,
}

/// The HTTP app over `static_dir`, with the mock provider and an optional
/// stand-in for the image tool server.
pub fn test_app(static_dir: &Path, image_tools: Option<Arc<dyn DynamicToolProvider>>) -> TestApp {
    let provider = Arc::new(MockProvider::new());
    let tree = TreeStateHandle::default();
    let agent = christmas_tree_agent("gemini-2.5-flash", tree.clone(), image_tools);
    let runner = Runner::new(
        "agents",
        Arc::new(agent),
        provider.clone(),
        Arc::new(InMemorySessionService::new()),
    );
    let state = AppState::new(runner, tree, static_dir);
    TestApp {
        router: router(state.clone()),
        state,
        provider,
    }
}
