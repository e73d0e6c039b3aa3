//! Events yielded while an agent run progresses.

use serde::Serialize;

use crate::types::{AgentToolCall, AgentToolResult};

/// One step of an agent run. A run ends with exactly one
/// [`AgentEvent::FinalResponse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    ToolCall {
        call: AgentToolCall,
    },
    ToolResult {
        result: AgentToolResult,
        /// Static file name reported by an image tool, if any.
        artifact: Option<String>,
    },
    FinalResponse {
        text: String,
    },
}

impl AgentEvent {
    pub fn is_final_response(&self) -> bool {
        matches!(self, Self::FinalResponse { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::FinalResponse { text } => Some(text),
            _ => None,
        }
    }

    pub fn artifact(&self) -> Option<&str> {
        match self {
            Self::ToolResult { artifact, .. } => artifact.as_deref(),
            _ => None,
        }
    }

    /// Build a tool result event, picking up the `artifact` field image
    /// tools put in their structured output.
    pub fn tool_result(result: AgentToolResult) -> Self {
        let artifact = if result.is_error {
            None
        } else {
            result
                .result
                .get("artifact")
                .and_then(serde_json::Value::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        };
        Self::ToolResult { result, artifact }
    }
}
