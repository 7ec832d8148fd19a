//! Membrane: serverless function sidecar.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                  MEMBRANE                    │
//!                       │                                              │
//!   Provider call       │  ┌──────────┐   ┌─────────┐   ┌──────────┐   │
//!   ────────────────────┼─▶│ gateway  │──▶│ sources │──▶│ trigger  │   │
//!                       │  │ plugin   │   │ adapter │   │  model   │   │
//!                       │  └──────────┘   └─────────┘   └────┬─────┘   │
//!                       │                                    │         │
//!                       │                                    ▼         │
//!   Provider reply      │  ┌──────────┐   ┌─────────┐   ┌──────────┐   │      Function
//!   ◀───────────────────┼──│ gateway  │◀──│ sources │◀──│  proxy   │◀──┼────▶ process
//!                       │  │ reply    │   │ adapter │   │ forward  │   │
//!                       │  └──────────┘   └─────────┘   └──────────┘   │
//!                       │                                              │
//!                       │  config · lifecycle · observability          │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use membrane::config::resolve_config;
use membrane::lifecycle::{self, signals::spawn_signal_handler, Shutdown};
use membrane::observability::logging;

#[derive(Parser)]
#[command(name = "membrane")]
#[command(about = "Ingress sidecar for serverless functions", long_about = None)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long, env = "MEMBRANE_CONFIG")]
    config: Option<PathBuf>,

    /// Function command to start and supervise
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = resolve_config(cli.config.as_deref(), |name| std::env::var(name).ok())?;
    logging::init(&config.observability)?;

    if !cli.command.is_empty() {
        config.child.command = cli.command;
    } else if !config.child.command.is_empty() && std::env::var_os("INVOKE").is_some() {
        tracing::warn!("INVOKE is deprecated; pass the function command as arguments instead");
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "membrane starting");

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_handler(Arc::clone(&shutdown));

    lifecycle::run(config, shutdown).await?;
    Ok(())
}
