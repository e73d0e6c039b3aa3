//! Spawning the image tool server as a stdio child process.

use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService, ServiceExt};
use rmcp::transport::TokioChildProcess;
use tokio::process::Command;

use crate::config::TinselConfig;
use crate::error::{Result, TinselError};

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type McpRunningService = RunningService<RoleClient, DynClientService>;

/// Subcommand of this binary that runs the image tool server.
pub const IMAGE_TOOLS_SUBCOMMAND: &str = "image-tools";

/// Command line for a stdio MCP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdioServerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl StdioServerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The configured `TOOL_SERVER_COMMAND`, or this executable with the
    /// `image-tools` subcommand.
    pub fn from_config(config: &TinselConfig) -> Result<Self> {
        if let Some((program, args)) = config
            .tool_server_command
            .as_ref()
            .and_then(|parts| parts.split_first())
        {
            return Ok(Self::new(program.clone(), args.to_vec()));
        }
        let exe = std::env::current_exe()?;
        Ok(Self::new(
            exe.to_string_lossy().into_owned(),
            vec![IMAGE_TOOLS_SUBCOMMAND.to_string()],
        ))
    }

    /// Spawn the child and run the MCP initialize handshake. The child
    /// inherits this process's environment and stderr.
    pub async fn connect(&self) -> Result<McpRunningService> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        let transport = TokioChildProcess::new(command).map_err(|e| {
            TinselError::mcp(format!("failed to spawn tool server '{}': {e}", self.program))
        })?;

        ClientInfo::default()
            .into_dyn()
            .serve(transport)
            .await
            .map_err(map_client_initialize_error)
    }
}

pub(crate) fn map_client_initialize_error(error: ClientInitializeError) -> TinselError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            TinselError::mcp(format!("initialize connection closed: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => {
            TinselError::mcp(format!("initialize transport error ({context}): {error}"))
        }
        ClientInitializeError::JsonRpcError(error) => TinselError::mcp(format!(
            "initialize JSON-RPC error {}: {}",
            error.code.0, error.message
        )),
        ClientInitializeError::Cancelled => TinselError::mcp("initialize cancelled"),
        other => TinselError::mcp(format!("initialize error: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn configured_command_is_split_into_program_and_args() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("TOOL_SERVER_COMMAND", "/opt/tinsel/bin/tinsel image-tools")]);
        let config = TinselConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        let command = StdioServerCommand::from_config(&config).unwrap();
        assert_eq!(command.program, "/opt/tinsel/bin/tinsel");
        assert_eq!(command.args, vec!["image-tools".to_string()]);
    }

    #[test]
    fn default_command_runs_this_binary() {
        let config = TinselConfig::from_lookup(|_| None).unwrap();
        let command = StdioServerCommand::from_config(&config).unwrap();
        assert_eq!(command.args, vec![IMAGE_TOOLS_SUBCOMMAND.to_string()]);
        assert!(!command.program.is_empty());
    }

    #[test]
    fn jsonrpc_initialize_errors_are_mcp_errors() {
        let err = map_client_initialize_error(ClientInitializeError::JsonRpcError(
            rmcp::model::ErrorData::invalid_request("bad initialize payload", None),
        ));
        assert!(matches!(
            err,
            TinselError::Provider { provider, message }
                if provider == "mcp" && message.contains("bad initialize payload")
        ));
    }

    #[tokio::test]
    async fn spawning_a_missing_program_fails() {
        let command = StdioServerCommand::new("/nonexistent/tinsel-tool-server", Vec::new());
        let err = command.connect().await.err().expect("spawn should fail");
        assert!(matches!(err, TinselError::Provider { ref provider, .. } if provider == "mcp"));
    }
}
