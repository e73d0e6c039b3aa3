//! Tinsel binary entry point.

use clap::Parser;
use tinsel::cli::{init_logging, run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.command.log_file());
    run(cli).await
}
