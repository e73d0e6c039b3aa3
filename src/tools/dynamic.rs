//! Tools discovered at runtime from a tool server.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use crate::error::TinselError;
use crate::provider::ToolDefinition;

/// A source of tools that are only known once it is asked, such as an MCP
/// server.
#[async_trait]
pub trait DynamicToolProvider: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, TinselError>;

    async fn execute_tool(
        &self,
        name: &str,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<Value, TinselError>;
}

/// One listed tool, callable through its provider.
pub struct DynamicToolAdapter {
    provider: Arc<dyn DynamicToolProvider>,
    definition: ToolDefinition,
}

impl DynamicToolAdapter {
    pub fn new(provider: Arc<dyn DynamicToolProvider>, definition: ToolDefinition) -> Self {
        Self {
            provider,
            definition,
        }
    }
}

#[async_trait]
impl Tool for DynamicToolAdapter {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<Value, TinselError> {
        self.provider
            .execute_tool(&self.definition.name, args, ctx)
            .await
    }
}
