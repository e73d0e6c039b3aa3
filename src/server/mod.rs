//! HTTP API: chat, photo listing, tree state and static files.

pub mod artifacts;
pub mod chat;
pub mod error;
pub mod photos;
pub mod state;

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use regex::Regex;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::agent::{christmas_tree_agent, Runner};
use crate::config::TinselConfig;
use crate::error::Result;
use crate::mcp::{McpToolset, StdioServerCommand};
use crate::memory::memory_service_from_config;
use crate::provider::{GeminiClient, GoogleProvider};
use crate::session::InMemorySessionService;
use crate::tools::DynamicToolProvider;
use crate::tree::{TreeState, TreeStateHandle};
use crate::util::tasks::BackgroundTasks;

pub use state::AppState;

const ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:3000",
];

static ORIGIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://.*(?:localhost|run\.app)(?::\d+)?|https?://.*\.run\.app|https?://.*\.cloudshell\.dev)$",
    )
    .expect("origin pattern must compile")
});

/// Time given to in-flight memory saves after the server stops.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub fn is_allowed_origin(origin: &str) -> bool {
    ALLOWED_ORIGINS.contains(&origin) || ORIGIN_PATTERN.is_match(origin)
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            origin.to_str().is_ok_and(is_allowed_origin)
        }))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(state.static_dir());
    Router::new()
        .route("/api/chat", post(chat::chat))
        .route("/api/photos", get(photos::list_photos))
        .route("/api/state", get(tree_state))
        .route("/health", get(health))
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

async fn tree_state(State(state): State<AppState>) -> Json<TreeState> {
    Json(state.tree.snapshot().await)
}

async fn health() -> &'static str {
    "ok"
}

/// Assemble the agent stack from `config` and serve until Ctrl-C.
pub async fn run(config: TinselConfig) -> Result<()> {
    for warning in config.warnings() {
        warn!("{warning}");
    }
    tokio::fs::create_dir_all(config.uploads_dir()).await?;

    let tree = TreeStateHandle::default();
    let toolset = Arc::new(McpToolset::new(
        StdioServerCommand::from_config(&config)?,
        config.tool_timeout,
    ));
    let agent = christmas_tree_agent(
        config.text_model.clone(),
        tree.clone(),
        Some(toolset.clone() as Arc<dyn DynamicToolProvider>),
    );
    let provider = GoogleProvider::new(GeminiClient::from_config(&config), config.text_model.clone());
    let tasks = BackgroundTasks::new();
    let mut runner = Runner::new(
        state::APP_NAME,
        Arc::new(agent),
        Arc::new(provider),
        Arc::new(InMemorySessionService::new()),
    )
    .with_tasks(tasks.clone());
    if config.use_memory_bank {
        runner = runner.with_memory(memory_service_from_config(&config));
    }

    let app = router(AppState::new(runner, tree, config.static_dir.clone()));
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped; draining background tasks");
    tasks.shutdown(SHUTDOWN_GRACE).await;
    toolset.shutdown().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
