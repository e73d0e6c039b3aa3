//! The model seam the agent talks through, and its Gemini implementation.

pub mod google;
pub mod http;
pub mod schema;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{AgentToolCall, ModelMessage};

pub use google::{GeminiClient, GoogleProvider};

/// One model call: the whole conversation so far plus the callable tools.
#[derive(Debug, Clone, Default)]
pub struct ProviderRequest {
    pub messages: Vec<ModelMessage>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub temperature: Option<f64>,
}

/// A function declaration as the model sees it. `parameters` is a JSON
/// Schema object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other,
}

/// What the model produced for one call. A turn with tool calls expects
/// their results before the model answers.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub text: String,
    pub tool_calls: Vec<AgentToolCall>,
    pub finish_reason: Option<FinishReason>,
}

impl ProviderResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        }
    }

    pub fn tool_calls(calls: Vec<AgentToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn model_id(&self) -> &str;

    /// Run one non-streaming model turn.
    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse>;
}
