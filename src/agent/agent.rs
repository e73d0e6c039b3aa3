//! Agent declaration: instruction, model and tools.

use std::sync::Arc;

use bon::Builder;

use crate::error::TinselError;
use crate::provider::ToolDefinition;
use crate::tools::dynamic::{DynamicToolAdapter, DynamicToolProvider};
use crate::tools::tool::Tool;

/// Upper bound on model calls in one run.
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// A named, tool-using conversational agent.
#[derive(Builder)]
pub struct Agent {
    #[builder(into)]
    name: String,
    #[builder(into)]
    model: String,
    #[builder(into)]
    instruction: String,
    /// In-process tools.
    #[builder(default)]
    tools: Vec<Arc<dyn Tool>>,
    /// Tool sources discovered at run time, such as an MCP server.
    #[builder(default)]
    toolsets: Vec<Arc<dyn DynamicToolProvider>>,
    #[builder(default = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,
    temperature: Option<f64>,
}

impl Agent {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// All tools available for a run: the static ones followed by every
    /// toolset's current listing. A toolset that cannot list its tools fails
    /// the run.
    pub async fn resolve_tools(&self) -> Result<Vec<Arc<dyn Tool>>, TinselError> {
        let mut tools = self.tools.clone();
        for toolset in &self.toolsets {
            for tool in toolset.list_tools().await? {
                tools.push(Arc::new(DynamicToolAdapter::new(toolset.clone(), tool)));
            }
        }
        Ok(tools)
    }
}

/// Declarations sent to the model for `tools`.
pub fn tool_definitions(tools: &[Arc<dyn Tool>]) -> Vec<ToolDefinition> {
    tools.iter().map(|t| t.definition().clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::arguments::ToolArguments;
    use crate::tools::tool::{AgentTool, ToolExecutionContext};
    use crate::tools::no_parameters;
    use async_trait::async_trait;
    use serde_json::json;

    struct OneTool;

    #[async_trait]
    impl DynamicToolProvider for OneTool {
        async fn list_tools(&self) -> Result<Vec<ToolDefinition>, TinselError> {
            Ok(vec![ToolDefinition {
                name: "generate_final_photo".into(),
                description: "Compose the final photo".into(),
                parameters: no_parameters(),
            }])
        }

        async fn execute_tool(
            &self,
            _name: &str,
            _args: &ToolArguments,
            _ctx: &ToolExecutionContext,
        ) -> Result<serde_json::Value, TinselError> {
            Ok(json!({}))
        }
    }

    struct Unreachable;

    #[async_trait]
    impl DynamicToolProvider for Unreachable {
        async fn list_tools(&self) -> Result<Vec<ToolDefinition>, TinselError> {
            Err(TinselError::mcp("server exited"))
        }

        async fn execute_tool(
            &self,
            _name: &str,
            _args: &ToolArguments,
            _ctx: &ToolExecutionContext,
        ) -> Result<serde_json::Value, TinselError> {
            unreachable!()
        }
    }

    fn noop_tool() -> Arc<dyn Tool> {
        Arc::new(AgentTool::new(
            "get_tree_state",
            "Read the tree",
            no_parameters(),
            |_args, _ctx| async { Ok(json!({})) },
        ))
    }

    #[tokio::test]
    async fn static_tools_come_before_dynamic_ones() {
        let agent = Agent::builder()
            .name("test")
            .model("gemini-2.5-flash")
            .instruction("be festive")
            .tools(vec![noop_tool()])
            .toolsets(vec![Arc::new(OneTool) as Arc<dyn DynamicToolProvider>])
            .build();
        let tools = agent.resolve_tools().await.unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["get_tree_state", "generate_final_photo"]);
        assert_eq!(agent.max_iterations(), DEFAULT_MAX_ITERATIONS);
    }

    #[tokio::test]
    async fn toolset_listing_failure_fails_resolution() {
        let agent = Agent::builder()
            .name("test")
            .model("gemini-2.5-flash")
            .instruction("be festive")
            .toolsets(vec![Arc::new(Unreachable) as Arc<dyn DynamicToolProvider>])
            .build();
        assert!(agent.resolve_tools().await.is_err());
    }
}
