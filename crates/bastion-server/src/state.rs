//! Application state shared across handlers.

use std::sync::Arc;

use bastion_upstream::UpstreamClient;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
///
/// Holds no per-session data: the session lives entirely in the browser's
/// cookies and the upstream decides whether a token is still good.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Client for the upstream API, fixed at boot.
    pub upstream: UpstreamClient,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: ServerConfig, upstream: UpstreamClient) -> Self {
        Self {
            config: Arc::new(config),
            upstream,
        }
    }
}
