//! CLI command handlers.

pub mod config;
pub mod start;

use std::path::{Path, PathBuf};

use anyhow::Result;
use bastion_config::{ConfigSearch, LoadedConfig};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Verbose output enabled.
    pub verbose: bool,
    /// Explicit config file, if one was given.
    pub config_path: Option<PathBuf>,
    /// Configuration loaded at startup.
    pub loaded: LoadedConfig,
}

/// Load the explicit config file, or discover and merge the default layers.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    Ok(ConfigSearch::new(explicit).load()?)
}
