//! Error types for upstream calls.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Errors that can occur talking to the upstream API.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Transport failure: DNS, connect, timeout, reset, or body read.
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a body that could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Client construction failed.
    #[error("Config error: {0}")]
    Config(String),
}

impl UpstreamError {
    /// Whether the failure happened below HTTP (no usable upstream reply).
    pub fn is_transport(&self) -> bool {
        matches!(self, UpstreamError::Network(_))
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            UpstreamError::Decode(e.to_string())
        } else if e.is_builder() {
            UpstreamError::Config(e.to_string())
        } else {
            UpstreamError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(e: serde_json::Error) -> Self {
        UpstreamError::Decode(e.to_string())
    }
}
