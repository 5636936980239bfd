//! Start command - launches the gateway.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use bastion_config::{BastionConfig, DeploymentMode, UpstreamOverrides, resolve_upstream};
use bastion_server::{Server, ServerConfig};
use bastion_upstream::{ClientConfig, UpstreamClient};

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Upstream API base URL (overrides config and environment selection)
    #[arg(long, env = "BASTION_UPSTREAM_URL")]
    pub upstream: Option<String>,

    /// Named upstream environment, e.g. staging or production
    #[arg(long = "env", env = "BASTION_ENVIRONMENT")]
    pub environment: Option<String>,

    /// Directory holding the built console bundle (overrides config)
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Run in production mode (secure cookies)
    #[arg(long)]
    pub production: bool,
}

/// Fold CLI overrides into the `[server]` section.
fn apply_overrides(config: &mut BastionConfig, args: &StartArgs) {
    let mut server = config.server();
    if let Some(port) = args.port {
        server.port = port;
    }
    if let Some(ref bind) = args.bind {
        server.bind = bind.clone();
    }
    if let Some(ref dir) = args.static_dir {
        server.static_dir = Some(dir.clone());
    }
    if args.production {
        server.mode = DeploymentMode::Production;
    }
    config.server = Some(server);
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    // ── Load configuration ──────────────────────────────────────────────

    if ctx.verbose {
        let sources = ctx.loaded.loaded_from();
        if sources.is_empty() {
            println!("No config files found, using defaults + CLI args");
        } else {
            for source in sources {
                println!("Loaded config: {}", source.display());
            }
        }
    }

    let mut config = ctx.loaded.config.clone();
    apply_overrides(&mut config, &args);

    // ── Resolve upstream ────────────────────────────────────────────────

    let overrides = UpstreamOverrides {
        base_url: args.upstream.clone(),
        environment: args.environment.clone(),
    };
    let resolved =
        resolve_upstream(&config, &overrides).context("Invalid upstream configuration")?;

    let mut client_config = ClientConfig::new(resolved.base_url.clone());
    if let Some(timeout) = resolved.timeout {
        client_config = client_config.with_timeout(timeout);
    }
    let upstream = UpstreamClient::new(client_config)?;

    // ── Server ──────────────────────────────────────────────────────────

    let server_config = ServerConfig::from_bastion_config(&config)?;
    let addr = server_config.bind_address;

    tracing::info!(
        upstream = %resolved.base_url,
        resolved_from = %resolved.resolved_from,
        mode = %server_config.mode,
        secure_cookies = server_config.secure_cookies,
        "Gateway configured"
    );

    println!("Bastion listening on http://{}", addr);
    println!("Upstream: {} ({})", resolved.base_url, resolved.resolved_from);

    Server::new(server_config, upstream)
        .run_until(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
