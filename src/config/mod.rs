//! Configuration loaded from the environment (and `.env`).

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, TinselError};

pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 120;

/// How requests to the hosted model platform are authenticated.
///
/// A project id selects Vertex AI; the Gemini API key is then ignored since
/// the platform rejects requests carrying both.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    ApiKey {
        api_key: Option<String>,
    },
    Vertex {
        project_id: String,
        location: String,
        access_token: Option<String>,
    },
}

impl AuthMode {
    pub fn is_vertex(&self) -> bool {
        matches!(self, Self::Vertex { .. })
    }
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey { api_key } => f
                .debug_struct("ApiKey")
                .field("api_key", &api_key.as_ref().map(|_| ".."))
                .finish(),
            Self::Vertex {
                project_id,
                location,
                access_token,
            } => f
                .debug_struct("Vertex")
                .field("project_id", project_id)
                .field("location", location)
                .field("access_token", &access_token.as_ref().map(|_| ".."))
                .finish(),
        }
    }
}

/// Runtime configuration for the server, the image tool server and the
/// registration utility.
#[derive(Debug, Clone)]
pub struct TinselConfig {
    pub auth: AuthMode,
    pub project_id: Option<String>,
    pub location: String,
    pub use_memory_bank: bool,
    pub agent_engine_id: Option<String>,
    pub static_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub text_model: String,
    pub image_model: String,
    /// Command line used to spawn the image tool server. `None` means this
    /// executable with the `image-tools` subcommand.
    pub tool_server_command: Option<Vec<String>>,
    pub tool_timeout: Duration,
    pub gemini_base_url: Option<String>,
    pub vertex_base_url: Option<String>,
}

impl TinselConfig {
    /// Load from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let project_id = var("PROJECT_ID");
        let location = var("LOCATION").unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        let api_key = var("GOOGLE_API_KEY").or_else(|| var("GEMINI_API_KEY"));

        let auth = match &project_id {
            Some(project_id) => {
                if api_key.is_some() {
                    tracing::info!(
                        "ignoring GOOGLE_API_KEY: project/location and API key are mutually exclusive"
                    );
                }
                AuthMode::Vertex {
                    project_id: project_id.clone(),
                    location: location.clone(),
                    access_token: var("GOOGLE_ACCESS_TOKEN"),
                }
            }
            None => AuthMode::ApiKey { api_key },
        };

        let port = match var("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| TinselError::Configuration(format!("invalid PORT '{raw}': {e}")))?,
            None => 8000,
        };

        let tool_timeout = match var("TOOL_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|e| {
                TinselError::Configuration(format!("invalid TOOL_TIMEOUT_SECS '{raw}': {e}"))
            })?),
            None => Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
        };

        let tool_server_command = var("TOOL_SERVER_COMMAND").map(|raw| {
            raw.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        Ok(Self {
            auth,
            project_id,
            location,
            use_memory_bank: var("USE_MEMORY_BANK")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            agent_engine_id: var("AGENT_ENGINE_ID"),
            static_dir: var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            text_model: var("TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: var("IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            tool_server_command,
            tool_timeout,
            gemini_base_url: var("GEMINI_BASE_URL"),
            vertex_base_url: var("VERTEX_BASE_URL"),
        })
    }

    /// Non-fatal configuration gaps, logged at startup. Calls that need the
    /// missing piece fail when first made.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.project_id.is_none() {
            warnings.push(
                "PROJECT_ID not found in environment variables. Vertex AI services may fail."
                    .to_string(),
            );
        }
        match &self.auth {
            AuthMode::ApiKey { api_key: None } => warnings.push(
                "GOOGLE_API_KEY not found in environment variables. Agent may fail to initialize."
                    .to_string(),
            ),
            AuthMode::Vertex {
                access_token: None, ..
            } => warnings.push(
                "GOOGLE_ACCESS_TOKEN not set. Vertex AI requests will be rejected.".to_string(),
            ),
            _ => {}
        }
        if self.use_memory_bank && self.agent_engine_id.is_none() {
            warnings.push(
                "USE_MEMORY_BANK is true but AGENT_ENGINE_ID is missing. Falling back to in-process memory."
                    .to_string(),
            );
        }
        warnings
    }

    /// Directory where chat uploads are stored.
    pub fn uploads_dir(&self) -> PathBuf {
        self.static_dir.join("uploads")
    }

    /// Socket address string for the HTTP server.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
