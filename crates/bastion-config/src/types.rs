//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [server]                    # listener, deployment mode, console bundle
//! [upstream]                  # upstream API base URL / environment selection
//! [upstream.environments]     # named upstream base URLs
//! [session]                   # credential cookie settings
//! [gate]                      # public and excluded path prefixes
//! [logging]                   # log file settings
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default max body size for inbound requests (10 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Credential cookie lifetime: 7 days.
pub const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

/// Staging upstream API.
pub const STAGING_UPSTREAM_URL: &str = "https://staging.unzolo.com/api";

/// Production upstream API.
pub const PRODUCTION_UPSTREAM_URL: &str = "https://api.unzolo.com/api";

/// Paths reachable without a session.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &["/login", "/api/auth"];

/// Paths the gate never intercepts.
pub const DEFAULT_EXCLUDED_PATHS: &[&str] =
    &["/_next/static", "/_next/image", "/favicon.ico", "/health"];

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. a project-local
/// override that only selects an environment) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BastionConfig {
    /// Listener and deployment settings.
    pub server: Option<ServerConfig>,

    /// Upstream API selection.
    pub upstream: Option<UpstreamConfig>,

    /// Credential cookie settings.
    pub session: Option<SessionConfig>,

    /// Session gate path rules.
    pub gate: Option<GateConfig>,

    /// Log output settings.
    pub logging: Option<LoggingConfig>,
}

impl BastionConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config with every section populated with defaults, used by `config init`.
    pub fn with_defaults() -> Self {
        Self {
            server: Some(ServerConfig::default()),
            upstream: Some(UpstreamConfig::default()),
            session: Some(SessionConfig::default()),
            gate: Some(GateConfig::default()),
            logging: Some(LoggingConfig::default()),
        }
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Merging is per section: a section present in `other` replaces the
    /// whole section here.
    pub fn merge(&mut self, other: BastionConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }

        if other.upstream.is_some() {
            self.upstream = other.upstream;
        }

        if other.session.is_some() {
            self.session = other.session;
        }

        if other.gate.is_some() {
            self.gate = other.gate;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Server section or its defaults.
    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// Upstream section or its defaults.
    pub fn upstream(&self) -> UpstreamConfig {
        self.upstream.clone().unwrap_or_default()
    }

    /// Session section or its defaults.
    pub fn session(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }

    /// Gate section or its defaults.
    pub fn gate(&self) -> GateConfig {
        self.gate.clone().unwrap_or_default()
    }

    /// Logging section or its defaults.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Deployment mode. Production turns on the `Secure` cookie attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    #[default]
    Development,
    Production,
}

impl DeploymentMode {
    pub fn is_production(self) -> bool {
        self == DeploymentMode::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentMode::Development => "development",
            DeploymentMode::Production => "production",
        }
    }
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub bind: String,
    /// Deployment mode.
    pub mode: DeploymentMode,
    /// Enable request logging.
    pub request_logging: bool,
    /// Maximum inbound request body size in bytes.
    pub max_body_size: usize,
    /// Directory holding the built console bundle, served behind the gate.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            mode: DeploymentMode::default(),
            request_logging: true,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            static_dir: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Upstream Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Upstream API configuration section.
///
/// ```toml
/// [upstream]
/// environment = "staging"
/// timeout_secs = 30
///
/// [upstream.environments]
/// qa = "https://qa.unzolo.com/api"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Explicit base URL. Takes precedence over `environment`.
    pub base_url: Option<String>,
    /// Named environment to select from `environments`.
    pub environment: Option<String>,
    /// Request timeout. Unset means the HTTP client default (no timeout).
    pub timeout_secs: Option<u64>,
    /// Named base URLs. `staging` and `production` are built in and may be
    /// overridden here.
    pub environments: BTreeMap<String, String>,
}

impl UpstreamConfig {
    /// Built-in environments overlaid with configured ones.
    pub fn all_environments(&self) -> BTreeMap<String, String> {
        let mut all = BTreeMap::new();
        all.insert("staging".to_string(), STAGING_UPSTREAM_URL.to_string());
        all.insert(
            "production".to_string(),
            PRODUCTION_UPSTREAM_URL.to_string(),
        );
        for (name, url) in &self.environments {
            all.insert(name.clone(), url.clone());
        }
        all
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Credential cookie configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie lifetime in seconds, shared by both credential cookies.
    pub max_age_secs: u64,
    /// Force the `Secure` attribute on or off. Unset follows `server.mode`.
    pub secure: Option<bool>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: DEFAULT_SESSION_MAX_AGE_SECS,
            secure: None,
        }
    }
}

impl SessionConfig {
    /// Effective `Secure` flag for the given deployment mode.
    pub fn secure_for(&self, mode: DeploymentMode) -> bool {
        self.secure.unwrap_or_else(|| mode.is_production())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gate Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Session gate configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Path prefixes reachable without a session.
    pub public_paths: Vec<String>,
    /// Path prefixes the gate does not intercept at all.
    pub excluded_paths: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            public_paths: DEFAULT_PUBLIC_PATHS.iter().map(|p| p.to_string()).collect(),
            excluded_paths: DEFAULT_EXCLUDED_PATHS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the rolling JSON log. Defaults to `<config dir>/logs`.
    pub dir: Option<PathBuf>,
    /// Write the JSON log file.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            json: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_parses() {
        let config = BastionConfig::from_toml("").unwrap();
        assert_eq!(config, BastionConfig::new());
        assert_eq!(config.server().port, DEFAULT_PORT);
        assert_eq!(config.session().max_age_secs, 604_800);
    }

    #[test]
    fn test_full_config_parses() {
        let config = BastionConfig::from_toml(
            r#"
[server]
port = 8081
bind = "0.0.0.0"
mode = "production"
static_dir = "/srv/console"

[upstream]
environment = "qa"
timeout_secs = 15

[upstream.environments]
qa = "https://qa.example.com/api"

[session]
max_age_secs = 3600

[gate]
public_paths = ["/login"]
excluded_paths = ["/assets"]

[logging]
json = false
"#,
        )
        .unwrap();

        let server = config.server();
        assert_eq!(server.port, 8081);
        assert_eq!(server.bind, "0.0.0.0");
        assert!(server.mode.is_production());
        assert_eq!(server.static_dir, Some(PathBuf::from("/srv/console")));
        assert!(server.request_logging);

        let upstream = config.upstream();
        assert_eq!(upstream.environment.as_deref(), Some("qa"));
        assert_eq!(upstream.timeout_secs, Some(15));

        assert_eq!(config.session().max_age_secs, 3600);
        assert_eq!(config.gate().public_paths, vec!["/login".to_string()]);
        assert!(!config.logging().json);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result = BastionConfig::from_toml("[server]\nmode = \"qa\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_replaces_present_sections_only() {
        let mut base = BastionConfig::from_toml(
            r#"
[server]
port = 8080

[upstream]
environment = "staging"
"#,
        )
        .unwrap();

        let overlay = BastionConfig::from_toml("[server]\nport = 9090\n").unwrap();
        base.merge(overlay);

        assert_eq!(base.server().port, 9090);
        assert_eq!(base.upstream().environment.as_deref(), Some("staging"));
    }

    #[test]
    fn test_all_environments_includes_builtins() {
        let upstream = UpstreamConfig::default();
        let all = upstream.all_environments();
        assert_eq!(all.get("staging").map(String::as_str), Some(STAGING_UPSTREAM_URL));
        assert_eq!(
            all.get("production").map(String::as_str),
            Some(PRODUCTION_UPSTREAM_URL)
        );
    }

    #[test]
    fn test_configured_environment_overrides_builtin() {
        let mut upstream = UpstreamConfig::default();
        upstream
            .environments
            .insert("staging".to_string(), "http://localhost:4000/api".to_string());
        let all = upstream.all_environments();
        assert_eq!(
            all.get("staging").map(String::as_str),
            Some("http://localhost:4000/api")
        );
    }

    #[test]
    fn test_secure_follows_mode_unless_forced() {
        let session = SessionConfig::default();
        assert!(!session.secure_for(DeploymentMode::Development));
        assert!(session.secure_for(DeploymentMode::Production));

        let forced = SessionConfig {
            secure: Some(true),
            ..Default::default()
        };
        assert!(forced.secure_for(DeploymentMode::Development));
    }

    #[test]
    fn test_default_gate_paths() {
        let gate = GateConfig::default();
        assert!(gate.public_paths.contains(&"/api/auth".to_string()));
        assert!(gate.excluded_paths.contains(&"/_next/static".to_string()));
        assert!(gate.excluded_paths.contains(&"/favicon.ico".to_string()));
    }

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let config = BastionConfig::with_defaults();
        let text = config.to_toml().unwrap();
        let parsed = BastionConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
