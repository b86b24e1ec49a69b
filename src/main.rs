use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};

mod cli;
mod config;
mod core;
mod error;
mod server;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting Flowsight v{}", env!("CARGO_PKG_VERSION"));

    cli.execute().await
}
