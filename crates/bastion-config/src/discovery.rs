//! Locating the gateway's TOML files.
//!
//! Without `--config` the gateway reads up to two layers, later wins:
//! the user layer (`$BASTION_CONFIG_DIR/config.toml`, or
//! `<platform config dir>/bastion/config.toml`) and the project layer
//! (`./bastion.toml`). With `--config` exactly that file is read and it
//! must exist and parse.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{BastionConfig, ConfigError, Result};

/// Project-local config file, relative to the working directory.
pub const PROJECT_CONFIG_FILE: &str = "bastion.toml";

const USER_CONFIG_FILE: &str = "config.toml";
const CONFIG_DIR_ENV: &str = "BASTION_CONFIG_DIR";

/// Which layer a config file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    User,
    Project,
    Explicit,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::User => write!(f, "user"),
            Layer::Project => write!(f, "project"),
            Layer::Explicit => write!(f, "--config"),
        }
    }
}

/// One file the loader looked at.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub layer: Layer,
    pub path: PathBuf,
    /// Found and merged.
    pub loaded: bool,
}

/// Merged configuration plus what went into it.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: BastionConfig,
    /// Lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Discovered layers that failed to parse. They are skipped, not fatal.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths that actually contributed to `config`.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Where to look for configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigSearch {
    /// `--config`: read only this file.
    pub explicit: Option<PathBuf>,
    /// Replaces [`config_dir`] for the user layer.
    pub user_dir: Option<PathBuf>,
    /// Directory holding `bastion.toml`. Defaults to the working directory.
    pub project_dir: Option<PathBuf>,
}

impl ConfigSearch {
    /// Search honouring an optional `--config` path.
    pub fn new(explicit: Option<&Path>) -> Self {
        Self {
            explicit: explicit.map(Path::to_path_buf),
            ..Default::default()
        }
    }

    pub fn with_user_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_dir = Some(dir.into());
        self
    }

    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    /// Read and merge the configured layers.
    pub fn load(&self) -> Result<LoadedConfig> {
        if let Some(path) = &self.explicit {
            return Ok(LoadedConfig {
                config: read_file(path)?,
                sources: vec![ConfigSource {
                    layer: Layer::Explicit,
                    path: path.clone(),
                    loaded: true,
                }],
                warnings: Vec::new(),
            });
        }

        let mut loaded = LoadedConfig {
            config: BastionConfig::new(),
            sources: Vec::new(),
            warnings: Vec::new(),
        };

        let user = self
            .user_dir
            .clone()
            .or_else(config_dir)
            .map(|dir| dir.join(USER_CONFIG_FILE));
        let project = self
            .project_dir
            .as_deref()
            .map_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE), |d| d.join(PROJECT_CONFIG_FILE));

        if let Some(path) = user {
            merge_layer(&mut loaded, Layer::User, path);
        }
        merge_layer(&mut loaded, Layer::Project, project);

        Ok(loaded)
    }
}

/// Directory of the user layer; also the parent of the default log directory.
pub fn config_dir() -> Option<PathBuf> {
    match std::env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join("bastion")),
    }
}

/// File of the user layer.
pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

fn read_file(path: &Path) -> Result<BastionConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    BastionConfig::from_toml(&contents)
}

fn merge_layer(loaded: &mut LoadedConfig, layer: Layer, path: PathBuf) {
    let merged = path.is_file()
        && match read_file(&path) {
            Ok(config) => {
                loaded.config.merge(config);
                true
            }
            Err(e) => {
                loaded
                    .warnings
                    .push(format!("Ignoring {} config {}: {}", layer, path.display(), e));
                false
            }
        };
    loaded.sources.push(ConfigSource {
        layer,
        path,
        loaded: merged,
    });
}
