//! MCP client for the image tool server.

use rmcp::model::{CallToolRequestParams, CallToolResult, Content, JsonObject, ResourceContents};
use rmcp::service::ServiceError;

use crate::error::TinselError;

use super::transport::McpRunningService;

/// Schema for a tool exposed by an MCP server.
#[derive(Debug, Clone, PartialEq)]
pub struct McpToolSchema {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

/// Result of a successful tool call.
#[derive(Debug, Clone, Default)]
pub struct McpToolCallResult {
    pub structured_content: Option<serde_json::Value>,
    pub text_content: Option<String>,
}

impl McpToolCallResult {
    /// Structured content when present, then text (parsed as JSON when it
    /// is JSON), then null.
    pub fn into_value(self) -> serde_json::Value {
        if let Some(structured) = self.structured_content {
            return structured;
        }
        match self.text_content {
            Some(text) => serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)),
            None => serde_json::Value::Null,
        }
    }
}

/// A connected MCP session.
pub struct McpClient {
    session: McpRunningService,
}

impl McpClient {
    pub fn new(session: McpRunningService) -> Self {
        Self { session }
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// List available tools from the server.
    pub async fn list_tools(&self) -> Result<Vec<McpToolSchema>, TinselError> {
        let tools = match self.session.list_all_tools().await {
            Ok(tools) => tools,
            Err(ServiceError::UnexpectedResponse) => {
                self.session
                    .list_tools(None)
                    .await
                    .map_err(|e| map_service_error("list_tools", e))?
                    .tools
            }
            Err(e) => return Err(map_service_error("list_tools", e)),
        };
        Ok(tools.into_iter().map(map_mcp_tool_schema).collect())
    }

    /// Execute a tool on the server.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<McpToolCallResult, TinselError> {
        let result = self
            .session
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments,
                task: None,
            })
            .await
            .map_err(|e| map_service_error("call_tool", e))?;

        map_call_result(name, result)
    }

    /// Stop the session; the child process exits when its stdin closes.
    pub async fn shutdown(self) {
        if let Err(e) = self.session.cancel().await {
            tracing::warn!(error = %e, "MCP session did not shut down cleanly");
        }
    }
}

fn map_mcp_tool_schema(tool: rmcp::model::Tool) -> McpToolSchema {
    McpToolSchema {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()),
        input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
    }
}

fn extract_text_content(content: &[Content]) -> Option<String> {
    let lines: Vec<String> = content
        .iter()
        .filter_map(|item| {
            if let Some(text) = item.as_text() {
                return Some(text.text.clone());
            }
            match &item.as_resource()?.resource {
                ResourceContents::TextResourceContents { text, .. } => Some(text.clone()),
                _ => None,
            }
        })
        .collect();

    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn map_call_result(name: &str, result: CallToolResult) -> Result<McpToolCallResult, TinselError> {
    let text_content = extract_text_content(&result.content);

    if result.is_error.unwrap_or(false) {
        let message = text_content
            .clone()
            .or_else(|| result.structured_content.as_ref().map(|v| v.to_string()))
            .unwrap_or_else(|| "tool returned an error result".into());

        return Err(TinselError::ToolExecution {
            tool_name: name.to_string(),
            message,
        });
    }

    Ok(McpToolCallResult {
        structured_content: result.structured_content,
        text_content,
    })
}

pub(crate) fn map_service_error(context: &str, error: ServiceError) -> TinselError {
    match error {
        ServiceError::McpError(error) => TinselError::mcp(format!(
            "{context}: MCP error {}: {}",
            error.code.0, error.message
        )),
        ServiceError::TransportSend(error) => {
            TinselError::mcp(format!("{context}: transport send failed: {error}"))
        }
        ServiceError::TransportClosed => {
            TinselError::mcp(format!("{context}: transport closed"))
        }
        ServiceError::UnexpectedResponse => {
            TinselError::mcp(format!("{context}: unexpected MCP response"))
        }
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            TinselError::mcp(format!("{context}: request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => TinselError::Timeout(timeout.as_millis() as u64),
        other => TinselError::mcp(format!("{context}: service error: {other}")),
    }
}
