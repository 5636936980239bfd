//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use bastion_config::{UpstreamOverrides, resolve_upstream};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show resolved configuration and the upstream target
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./bastion.toml) instead of user config
        #[arg(long)]
        local: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Init { local } => cmd_init(local),
        ConfigCommand::Path => cmd_path(ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;
    let config = &loaded.config;

    println!("# Bastion Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    let server = config.server();
    println!("Server:");
    println!("  bind: {}:{}", server.bind, server.port);
    println!("  mode: {}", server.mode);
    println!("  request logging: {}", server.request_logging);
    if let Some(ref dir) = server.static_dir {
        println!("  static dir: {}", dir.display());
    }
    println!();

    // Resolved without CLI overrides; environment variables still apply.
    let overrides = UpstreamOverrides {
        base_url: std::env::var("BASTION_UPSTREAM_URL").ok(),
        environment: std::env::var("BASTION_ENVIRONMENT").ok(),
    };
    println!("Upstream:");
    match resolve_upstream(config, &overrides) {
        Ok(resolved) => {
            println!("  base url: {}", resolved.base_url);
            println!("  from: {}", resolved.resolved_from);
            if let Some(timeout) = resolved.timeout {
                println!("  timeout: {}s", timeout.as_secs());
            }
        }
        Err(e) => println!("  error: {}", e),
    }
    println!("  environments:");
    for (name, url) in config.upstream().all_environments() {
        println!("    {:<12} {}", name, url);
    }
    println!();

    let session = config.session();
    println!("Session:");
    println!("  max age: {}s", session.max_age_secs);
    println!("  secure: {}", session.secure_for(server.mode));
    println!();

    let gate = config.gate();
    println!("Gate:");
    println!("  public: {}", gate.public_paths.join(", "));
    println!("  excluded: {}", gate.excluded_paths.join(", "));
    println!();

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        if let Ok(toml_str) = config.to_toml() {
            println!("{}", toml_str);
        }
    }

    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;

    println!("Config file search order (later overrides earlier):\n");

    for source in &loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not loaded"
        };
        println!("  {} {:<9} {}", status, source.layer, source.path.display());
    }

    println!();
    let loaded_count = loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'bastion config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"# Bastion Configuration

[server]
bind = "127.0.0.1"
port = 3000
# "development" or "production"; production sets Secure on cookies
mode = "development"
request_logging = true
# static_dir = "./out"

[upstream]
# Pick a named environment, or set base_url directly.
environment = "staging"
# base_url = "https://staging.unzolo.com/api"
# timeout_secs = 30

# [upstream.environments]
# qa = "https://qa.example.com/api"

[session]
max_age_secs = 604800

[logging]
json = true
"#;

fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from(bastion_config::discovery::PROJECT_CONFIG_FILE)
    } else {
        let dir = bastion_config::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        std::fs::create_dir_all(&dir)?;
        dir.join("config.toml")
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    std::fs::write(&path, CONFIG_TEMPLATE)?;
    println!("Created {}", path.display());

    Ok(())
}

fn cmd_path(ctx: &Context) -> Result<()> {
    if let Some(ref path) = ctx.config_path {
        println!("{}", path.display());
    } else if let Some(path) = bastion_config::user_config_path() {
        println!("{}", path.display());
    } else {
        eprintln!("Could not determine config directory");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses() {
        let config = bastion_config::BastionConfig::from_toml(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.server().port, 3000);
        assert_eq!(config.upstream().environment.as_deref(), Some("staging"));

        let resolved = resolve_upstream(&config, &UpstreamOverrides::default()).unwrap();
        assert_eq!(resolved.base_url.as_str(), bastion_config::STAGING_UPSTREAM_URL);
    }
}
