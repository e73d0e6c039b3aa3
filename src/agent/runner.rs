//! Runner: drives an agent's tool loop against a session.

use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::BoxStream;
use futures::Stream;
use tracing::{debug, info, warn};

use crate::error::{Result, TinselError};
use crate::memory::{format_memories, MemoryService};
use crate::provider::{ModelProvider, ProviderRequest};
use crate::session::{SessionKey, SessionService};
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::{Tool, ToolExecutionContext};
use crate::types::{AgentToolCall, AgentToolResult, ModelMessage};
use crate::util::tasks::BackgroundTasks;

use super::agent::{tool_definitions, Agent};
use super::events::AgentEvent;

/// Runs one agent for one application, reading and extending sessions and,
/// when configured, recalling and saving long-term memory.
#[derive(Clone)]
pub struct Runner {
    app_name: String,
    agent: Arc<Agent>,
    provider: Arc<dyn ModelProvider>,
    sessions: Arc<dyn SessionService>,
    memory: Option<Arc<dyn MemoryService>>,
    tasks: BackgroundTasks,
}

impl Runner {
    pub fn new(
        app_name: impl Into<String>,
        agent: Arc<Agent>,
        provider: Arc<dyn ModelProvider>,
        sessions: Arc<dyn SessionService>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            agent,
            provider,
            sessions,
            memory: None,
            tasks: BackgroundTasks::new(),
        }
    }

    /// Preload memories before each run and save the session afterwards.
    pub fn with_memory(mut self, memory: Arc<dyn MemoryService>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Track memory saves on `tasks` instead of a private set.
    pub fn with_tasks(mut self, tasks: BackgroundTasks) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn sessions(&self) -> &Arc<dyn SessionService> {
        &self.sessions
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    /// Run the agent on `message` within an existing session.
    ///
    /// The stream yields tool calls and results as they happen and ends with
    /// one [`AgentEvent::FinalResponse`]. The new turns are stored in the
    /// session before that event is yielded.
    pub fn run(
        &self,
        user_id: &str,
        session_id: &str,
        message: ModelMessage,
    ) -> BoxStream<'static, Result<AgentEvent>> {
        let key = SessionKey::new(&self.app_name, user_id, session_id);
        Box::pin(self.clone().run_stream(key, message))
    }

    fn run_stream(
        self,
        key: SessionKey,
        message: ModelMessage,
    ) -> impl Stream<Item = Result<AgentEvent>> + Send + 'static {
        try_stream! {
            let session = self
                .sessions
                .get_session(&key)
                .await?
                .ok_or_else(|| TinselError::Session(format!("session '{}' not found", key.session_id)))?;

            let tools = self.agent.resolve_tools().await?;
            let definitions = tool_definitions(&tools);
            let ctx = ToolExecutionContext {
                user_id: key.user_id.clone(),
                session_id: key.session_id.clone(),
            };

            let mut messages = Vec::with_capacity(session.messages.len() + 2);
            messages.push(ModelMessage::system(self.system_instruction(&key, &message).await));
            messages.extend(session.messages);
            messages.push(message.clone());
            let mut turns = vec![message];

            let mut iteration = 0usize;
            loop {
                iteration += 1;
                if iteration > self.agent.max_iterations() {
                    Err::<(), _>(TinselError::InvalidState(
                        "tool loop exceeded max iterations".to_string(),
                    ))?;
                }

                let request = ProviderRequest {
                    messages: messages.clone(),
                    tools: (!definitions.is_empty()).then(|| definitions.clone()),
                    temperature: self.agent.temperature(),
                };
                let response = self.provider.generate(&request).await?;
                debug!(
                    session_id = %key.session_id,
                    model = self.provider.model_id(),
                    iteration,
                    tool_calls = response.tool_calls.len(),
                    text_len = response.text.len(),
                    "agent iteration complete"
                );

                if response.tool_calls.is_empty() {
                    if !response.text.trim().is_empty() {
                        turns.push(ModelMessage::assistant(response.text.clone()));
                    }
                    self.sessions
                        .append_messages(&key, std::mem::take(&mut turns))
                        .await?;
                    self.schedule_memory_save(&key).await;
                    yield AgentEvent::FinalResponse { text: response.text };
                    break;
                }

                let assistant =
                    ModelMessage::assistant_tool_calls(response.text, response.tool_calls.clone());
                messages.push(assistant.clone());
                turns.push(assistant);

                for call in response.tool_calls {
                    yield AgentEvent::ToolCall { call: call.clone() };
                    let result = execute_tool_call(&tools, &call, &ctx).await;
                    let tool_message = ModelMessage::tool_result(result.clone());
                    messages.push(tool_message.clone());
                    turns.push(tool_message);
                    yield AgentEvent::tool_result(result);
                }
            }
        }
    }

    async fn system_instruction(&self, key: &SessionKey, message: &ModelMessage) -> String {
        let mut instruction = self.agent.instruction().to_string();
        let Some(memory) = &self.memory else {
            return instruction;
        };
        match memory
            .search_memory(&key.app_name, &key.user_id, &message.text())
            .await
        {
            Ok(facts) => {
                if let Some(block) = format_memories(&facts) {
                    info!(count = facts.len(), user_id = %key.user_id, "preloaded memories");
                    instruction.push_str("\n\n");
                    instruction.push_str(&block);
                }
            }
            Err(e) => warn!(error = %e, "memory preload failed; continuing without memories"),
        }
        instruction
    }

    async fn schedule_memory_save(&self, key: &SessionKey) {
        let Some(memory) = self.memory.clone() else {
            return;
        };
        match self.sessions.get_session(key).await {
            Ok(Some(session)) => {
                self.tasks.spawn("memory_save", async move {
                    memory.add_session_to_memory(&session).await
                });
                info!(session_id = %key.session_id, "scheduled session save to memory");
            }
            Ok(None) => warn!(session_id = %key.session_id, "session vanished before memory save"),
            Err(e) => warn!(error = %e, "could not load session for memory save"),
        }
    }
}

async fn execute_tool_call(
    tools: &[Arc<dyn Tool>],
    call: &AgentToolCall,
    ctx: &ToolExecutionContext,
) -> AgentToolResult {
    let (result, is_error) = match tools.iter().find(|t| t.name() == call.name) {
        Some(tool) => {
            info!(tool = %call.name, "executing tool");
            match tool.execute(&ToolArguments::new(call.arguments.clone()), ctx).await {
                Ok(value) => (value, false),
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "tool failed");
                    (serde_json::Value::String(e.to_string()), true)
                }
            }
        }
        None => {
            warn!(tool = %call.name, "model called an unknown tool");
            (
                serde_json::Value::String(format!("Tool '{}' not found", call.name)),
                true,
            )
        }
    };
    AgentToolResult {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        result,
        is_error,
    }
}
