//! Bastion - authenticated gateway for the admin console
//!
//! Main entry point for the Bastion CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;

mod commands;

use commands::{config, start};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Bastion - authenticated gateway for the admin console
#[derive(Parser)]
#[command(name = "bastion")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file (overrides default discovery)
    #[arg(long, global = true, env = "BASTION_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway
    Start(start::StartArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Console (human-readable) plus an optional daily rolling JSON file.
///
/// The returned guard must live as long as the process or buffered file
/// output is lost.
fn init_tracing(verbose: bool, logging: &bastion_config::LoggingConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = if verbose {
        "bastion=debug,bastion_server=debug,bastion_upstream=debug,bastion_config=debug,tower_http=debug,info"
    } else {
        "bastion=info,bastion_server=info,bastion_upstream=info,bastion_config=info,warn"
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let console = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(console_filter);

    if !logging.json {
        tracing_subscriber::registry().with(console).init();
        return None;
    }

    let log_dir = logging
        .dir
        .clone()
        .or_else(|| bastion_config::config_dir().map(|d| d.join("logs")))
        .unwrap_or_else(|| PathBuf::from("logs"));

    let file_appender = tracing_appender::rolling::daily(&log_dir, "bastion.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(console)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(
                    "bastion=trace,bastion_server=trace,bastion_upstream=trace,bastion_config=trace,info",
                )),
        )
        .init();

    Some(guard)
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = commands::load(cli.config.as_deref())?;
    let _guard = init_tracing(cli.verbose, &loaded.config.logging());

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    let ctx = commands::Context {
        verbose: cli.verbose,
        config_path: cli.config,
        loaded,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
