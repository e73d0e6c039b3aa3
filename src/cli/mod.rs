//! Command-line interface for Tinsel.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::TinselConfig;
use crate::image_tools::{HolidayImageTools, ImageGenerator};
use crate::memory::registration::register_agent_engine;
use crate::memory::MemoryBankClient;

pub const DEFAULT_LOG_FILTER: &str = "tinsel=info,tower_http=info";

/// Holiday Magic Assistant backend
#[derive(Parser, Debug)]
#[command(name = "tinsel", version, about = "Holiday Magic Assistant backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve,
    /// Run the image tool server over stdin/stdout (spawned by `serve`)
    ImageTools,
    /// Create a Vertex AI reasoning engine with a customized Memory Bank
    RegisterMemory,
}

impl Commands {
    /// File the command's logs are appended to.
    pub fn log_file(&self) -> &'static str {
        match self {
            Self::ImageTools => "mcp_server.log",
            Self::Serve | Self::RegisterMemory => "backend.log",
        }
    }
}

/// Install the global subscriber: stderr plus an append-only log file.
/// Stdout is left alone since the image tool server speaks MCP on it.
/// Keep the returned guard alive to flush the file writer.
pub fn init_logging(log_file: &str) -> WorkerGuard {
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(".", log_file));
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init();
    guard
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = TinselConfig::from_env().context("invalid configuration")?;
    match cli.command {
        Commands::Serve => {
            info!(version = env!("CARGO_PKG_VERSION"), "starting Tinsel");
            crate::server::run(config).await?;
        }
        Commands::ImageTools => {
            info!(static_dir = %config.static_dir.display(), "starting image tool server");
            let tools = HolidayImageTools::new(
                ImageGenerator::from_config(&config),
                config.static_dir.clone(),
            );
            tools
                .serve_stdio()
                .await
                .context("image tool server failed")?;
            info!("image tool server stopped");
        }
        Commands::RegisterMemory => {
            let client = MemoryBankClient::from_config(&config)
                .context("PROJECT_ID is required to register a Memory Bank")?;
            let engine_id = register_agent_engine(&client).await?;
            println!("AGENT_ENGINE_ID={engine_id}");
            info!("add the line above to your .env file");
        }
    }
    Ok(())
}
