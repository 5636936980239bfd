//! Typed upstream reply used by the relay step.

use reqwest::StatusCode;
use reqwest::header::HeaderValue;

/// Body of an upstream reply, classified by its content type.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    /// `application/json` body that parsed.
    Json(serde_json::Value),
    /// Anything else, carried as text.
    Text(String),
    /// Zero-length body.
    Empty,
}

impl UpstreamBody {
    /// Classify a raw body by its `Content-Type`.
    ///
    /// A JSON content type whose body does not parse is carried as text so
    /// the reply still reaches the caller with its original status.
    pub fn classify(content_type: Option<&HeaderValue>, bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return UpstreamBody::Empty;
        }

        let is_json = content_type
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));

        if is_json {
            match serde_json::from_slice(bytes) {
                Ok(value) => return UpstreamBody::Json(value),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Upstream declared JSON but body did not parse; relaying as text"
                    );
                }
            }
        }

        UpstreamBody::Text(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn is_json(&self) -> bool {
        matches!(self, UpstreamBody::Json(_))
    }
}

/// A complete upstream reply: status plus classified body.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: UpstreamBody,
}
