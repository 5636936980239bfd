//! Configuration system for the Bastion admin gateway.
//!
//! Provides TOML-based configuration with:
//! - Server, session cookie, gate and logging sections
//! - Named upstream environments (`[upstream.environments]`) selected at boot
//! - Config file layering (user config dir + project-local overrides, or one `--config` file)
//!
//! The upstream base URL is resolved once, when the process starts, and handed
//! to the HTTP client factory. Nothing in the running gateway can change it.

pub mod discovery;
pub mod error;
pub mod resolver;
pub mod types;

pub use discovery::{
    ConfigSearch, ConfigSource, Layer, LoadedConfig, config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use resolver::{ResolvedFrom, ResolvedUpstream, UpstreamOverrides, resolve_upstream};
pub use types::*;
