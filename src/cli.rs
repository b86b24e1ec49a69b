use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::core::Engine;
use crate::server;

#[derive(Parser)]
#[command(name = "flowsight")]
#[command(about = "Code explanation, flowchart and call-stack service")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Target path (defaults to flowsight.toml)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Run the HTTP service
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Verify that the configured AI gateway is reachable
    Check,

    /// Analyze one source file and print the results
    Analyze {
        /// Source file to analyze
        file: PathBuf,

        /// Language label passed to the model (defaults to the file extension)
        #[arg(short, long)]
        language: Option<String>,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Init { path } => {
                let path = path.unwrap_or_else(|| PathBuf::from("flowsight.toml"));
                Config::default().save(&path)?;
                println!("Wrote default configuration to {}", path.display());
                Ok(())
            }
            Commands::Serve { host, port } => {
                let engine = Engine::new(self.config.as_deref())?;
                server::serve(engine, host, port).await
            }
            Commands::Check => {
                let engine = Engine::new(self.config.as_deref())?;
                let gateway = engine.gateway();
                if gateway.health_check().await? {
                    println!(
                        "{} ({}) is reachable",
                        gateway.provider_name(),
                        gateway.model_name()
                    );
                    Ok(())
                } else {
                    anyhow::bail!(
                        "{} ({}) is not reachable",
                        gateway.provider_name(),
                        gateway.model_name()
                    )
                }
            }
            Commands::Analyze { file, language } => {
                let engine = Engine::new(self.config.as_deref())?;
                let code = std::fs::read_to_string(&file)?;
                let language = language.unwrap_or_else(|| {
                    file.extension()
                        .and_then(|e| e.to_str())
                        .unwrap_or("unknown")
                        .to_string()
                });

                let explanation = engine.explain(&code, &language).await?;
                println!("=== Explanation ===\n{explanation}\n");

                let graph = engine.flowchart(&code, &language).await?;
                println!(
                    "=== Flowchart ===\n{}\n",
                    serde_json::to_string_pretty(&graph)?
                );

                let stack = engine.call_stack(&code, &language).await?;
                println!("=== Call stack ===");
                for name in stack {
                    println!("  {name}");
                }
                Ok(())
            }
        }
    }
}
