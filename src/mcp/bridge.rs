//! Bridge the image tool server into the tool system.

use std::time::Duration;

use async_trait::async_trait;
use rmcp::model::JsonObject;
use tokio::sync::{Mutex, MutexGuard, OnceCell};
use tracing::{debug, info, warn};

use crate::error::TinselError;
use crate::tools::arguments::ToolArguments;
use crate::provider::ToolDefinition;
use crate::tools::dynamic::DynamicToolProvider;
use crate::tools::tool::ToolExecutionContext;
use crate::util::timeout::with_timeout;

use super::client::{McpClient, McpToolCallResult, McpToolSchema};
use super::transport::StdioServerCommand;

/// Operations the toolset needs from a live MCP session.
#[async_trait]
pub trait McpSession: Send + Sync {
    fn is_closed(&self) -> bool;
    async fn list_tools(&self) -> Result<Vec<McpToolSchema>, TinselError>;
    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<McpToolCallResult, TinselError>;

    /// End the session.
    async fn shutdown(self: Box<Self>) {}
}

#[async_trait]
impl McpSession for McpClient {
    fn is_closed(&self) -> bool {
        McpClient::is_closed(self)
    }

    async fn list_tools(&self) -> Result<Vec<McpToolSchema>, TinselError> {
        McpClient::list_tools(self).await
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<McpToolCallResult, TinselError> {
        McpClient::call_tool(self, name, arguments).await
    }

    async fn shutdown(self: Box<Self>) {
        McpClient::shutdown(*self).await
    }
}

/// Opens MCP sessions on demand.
#[async_trait]
pub trait McpConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn McpSession>, TinselError>;
}

#[async_trait]
impl McpConnector for StdioServerCommand {
    async fn connect(&self) -> Result<Box<dyn McpSession>, TinselError> {
        info!(program = %self.program, args = ?self.args, "starting image tool server");
        let session = StdioServerCommand::connect(self).await?;
        Ok(Box::new(McpClient::new(session)))
    }
}

/// Tools from an MCP server, exposed as a [`DynamicToolProvider`].
///
/// The server is spawned on first use. Calls are serialized through one
/// session and bounded by a fixed timeout; a timed-out call is not retried.
pub struct McpToolset {
    connector: Box<dyn McpConnector>,
    session: Mutex<Option<Box<dyn McpSession>>>,
    tools: OnceCell<Vec<ToolDefinition>>,
    call_timeout: Duration,
}

impl McpToolset {
    pub fn new(connector: impl McpConnector + 'static, call_timeout: Duration) -> Self {
        Self {
            connector: Box::new(connector),
            session: Mutex::new(None),
            tools: OnceCell::new(),
            call_timeout,
        }
    }

    /// Lock the session slot, spawning the server if there is no live session.
    async fn connected(&self) -> Result<MutexGuard<'_, Option<Box<dyn McpSession>>>, TinselError> {
        let mut guard = self.session.lock().await;
        if guard.as_ref().map_or(true, |s| s.is_closed()) {
            if guard.is_some() {
                warn!("image tool server session closed; reconnecting");
            }
            *guard = Some(self.connector.connect().await?);
        }
        Ok(guard)
    }

    /// Stop the server process if one is running.
    pub async fn shutdown(&self) {
        if let Some(session) = self.session.lock().await.take() {
            info!("stopping image tool server");
            session.shutdown().await;
        }
    }
}

#[async_trait]
impl DynamicToolProvider for McpToolset {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, TinselError> {
        let tools = self
            .tools
            .get_or_try_init(|| async {
                let guard = self.connected().await?;
                let session = guard
                    .as_deref()
                    .ok_or_else(|| TinselError::mcp("tool server session unavailable"))?;
                let schemas = session.list_tools().await?;
                debug!(count = schemas.len(), "discovered MCP tools");
                Ok::<_, TinselError>(schemas.into_iter().map(tool_definition).collect())
            })
            .await?;
        Ok(tools.clone())
    }

    async fn execute_tool(
        &self,
        name: &str,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, TinselError> {
        let arguments = args.as_object();
        debug!(tool = name, session_id = %ctx.session_id, "calling MCP tool");
        let mut guard = self.connected().await?;
        let session = guard
            .as_deref()
            .ok_or_else(|| TinselError::mcp("tool server session unavailable"))?;
        let result = with_timeout(self.call_timeout, session.call_tool(name, arguments)).await;
        let closed = session.is_closed();
        if closed {
            *guard = None;
        }
        if let Err(TinselError::Timeout(ms)) = &result {
            warn!(tool = name, timeout_ms = ms, "MCP tool call timed out");
        }
        Ok(result?.into_value())
    }
}

fn tool_definition(tool: McpToolSchema) -> ToolDefinition {
    ToolDefinition {
        name: tool.name,
        description: tool.description.unwrap_or_default(),
        parameters: tool.input_schema,
    }
}
