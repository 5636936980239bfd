//! Server configuration.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use bastion_config::{
    BastionConfig, DEFAULT_EXCLUDED_PATHS, DEFAULT_MAX_BODY_SIZE, DEFAULT_PUBLIC_PATHS,
    DEFAULT_SESSION_MAX_AGE_SECS, DeploymentMode,
};

use crate::error::{Result, ServerError};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Deployment mode.
    pub mode: DeploymentMode,

    /// Set the `Secure` attribute on credential cookies.
    pub secure_cookies: bool,

    /// Lifetime shared by both credential cookies.
    pub session_max_age: Duration,

    /// Path prefixes reachable without a session.
    pub public_paths: Vec<String>,

    /// Path prefixes the session gate never intercepts.
    pub excluded_paths: Vec<String>,

    /// Enable request logging.
    pub request_logging: bool,

    /// Maximum inbound request body size in bytes.
    pub max_body_size: usize,

    /// Directory holding the built console bundle.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], bastion_config::DEFAULT_PORT)),
            mode: DeploymentMode::Development,
            secure_cookies: false,
            session_max_age: Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECS),
            public_paths: DEFAULT_PUBLIC_PATHS.iter().map(|p| p.to_string()).collect(),
            excluded_paths: DEFAULT_EXCLUDED_PATHS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            request_logging: true,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the file-based configuration.
    pub fn from_bastion_config(config: &BastionConfig) -> Result<Self> {
        let server = config.server();
        let session = config.session();
        let gate = config.gate();

        let ip: IpAddr = server.bind.parse().map_err(|e| {
            ServerError::Config(format!("Invalid bind address '{}': {}", server.bind, e))
        })?;

        Ok(Self {
            bind_address: SocketAddr::new(ip, server.port),
            mode: server.mode,
            secure_cookies: session.secure_for(server.mode),
            session_max_age: Duration::from_secs(session.max_age_secs),
            public_paths: gate.public_paths,
            excluded_paths: gate.excluded_paths,
            request_logging: server.request_logging,
            max_body_size: server.max_body_size,
            static_dir: server.static_dir,
        })
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the deployment mode. Production also turns on secure cookies.
    pub fn with_mode(mut self, mode: DeploymentMode) -> Self {
        self.mode = mode;
        if mode.is_production() {
            self.secure_cookies = true;
        }
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn with_session_max_age(mut self, max_age: Duration) -> Self {
        self.session_max_age = max_age;
        self
    }

    pub fn with_public_paths(mut self, paths: Vec<String>) -> Self {
        self.public_paths = paths;
        self
    }

    pub fn with_excluded_paths(mut self, paths: Vec<String>) -> Self {
        self.excluded_paths = paths;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set the maximum REST request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Serve the console bundle from this directory for unmatched routes.
    pub fn with_static_dir(mut self, dir: PathBuf) -> Self {
        self.static_dir = Some(dir);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.port(), 3000);
        assert!(!config.secure_cookies);
        assert_eq!(config.session_max_age, Duration::from_secs(604_800));
        assert!(config.public_paths.contains(&"/login".to_string()));
        assert!(config.excluded_paths.contains(&"/_next/image".to_string()));
    }

    #[test]
    fn test_from_bastion_config() {
        let file = BastionConfig::from_toml(
            r#"
[server]
bind = "0.0.0.0"
port = 8443
mode = "production"
request_logging = false

[session]
max_age_secs = 60
"#,
        )
        .unwrap();

        let config = ServerConfig::from_bastion_config(&file).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8443".parse().unwrap());
        assert!(config.mode.is_production());
        assert!(config.secure_cookies);
        assert!(!config.request_logging);
        assert_eq!(config.session_max_age, Duration::from_secs(60));
    }

    #[test]
    fn test_ipv6_bind() {
        let file = BastionConfig::from_toml("[server]\nbind = \"::1\"\nport = 3001\n").unwrap();
        let config = ServerConfig::from_bastion_config(&file).unwrap();
        assert_eq!(config.bind_address, "[::1]:3001".parse().unwrap());
    }

    #[test]
    fn test_invalid_bind_rejected() {
        let file = BastionConfig::from_toml("[server]\nbind = \"not-an-ip\"\n").unwrap();
        let err = ServerConfig::from_bastion_config(&file).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn test_production_mode_forces_secure_cookies() {
        let config = ServerConfig::new().with_mode(DeploymentMode::Production);
        assert!(config.secure_cookies);
    }
}
