//! Error types for the server.
//!
//! Every error reaching the browser uses the same envelope:
//! `{"success": false, "message": "..."}`. Internal detail goes to the log,
//! never into the body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Public message for any proxy transport failure.
pub const PROXY_FAILED_MESSAGE: &str = "Proxy request failed";

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Input validation failed. The message is shown to the caller.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No usable session credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Upstream refused the request; status and message are relayed.
    #[error("Upstream rejected request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    /// Upstream could not be reached while proxying.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// No route matched.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unexpected failure. `public` is shown to the caller, `detail` is logged.
    #[error("Internal error: {detail}")]
    Internal {
        public: &'static str,
        detail: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ServerError {
    pub fn internal(public: &'static str, detail: impl Into<String>) -> Self {
        ServerError::Internal {
            public,
            detail: detail.into(),
        }
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::Rejected { status, .. } => *status,
            ServerError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal { .. } | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show the caller.
    pub fn public_message(&self) -> String {
        match self {
            ServerError::BadRequest(msg)
            | ServerError::Unauthorized(msg)
            | ServerError::NotFound(msg) => msg.clone(),
            ServerError::Rejected { message, .. } => message.clone(),
            ServerError::BadGateway(_) => PROXY_FAILED_MESSAGE.to_string(),
            ServerError::Internal { public, .. } => public.to_string(),
            ServerError::Config(_) => "Internal server error".to_string(),
        }
    }
}

impl From<bastion_upstream::UpstreamError> for ServerError {
    fn from(e: bastion_upstream::UpstreamError) -> Self {
        match e {
            bastion_upstream::UpstreamError::Config(msg) => ServerError::Config(msg),
            other => ServerError::BadGateway(other.to_string()),
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ServerError::Internal { .. } | ServerError::BadGateway(_) | ServerError::Config(_) => {
                tracing::error!(status = %status, error = %self, "Server error");
            }
            _ => {
                tracing::warn!(status = %status, error = %self, "Client error");
            }
        }

        let body = ErrorResponse {
            success: false,
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(err: ServerError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_bad_gateway_hides_detail() {
        let (status, body) =
            render(ServerError::BadGateway("connection refused on 10.0.0.1".into())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Proxy request failed");
    }

    #[tokio::test]
    async fn test_internal_shows_public_message_only() {
        let (status, body) = render(ServerError::internal(
            "Failed to send OTP. Please try again.",
            "dns error: no such host",
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to send OTP. Please try again.");
    }

    #[tokio::test]
    async fn test_rejected_relays_status() {
        let (status, body) = render(ServerError::Rejected {
            status: StatusCode::FORBIDDEN,
            message: "Invalid OTP.".into(),
        })
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, serde_json::json!({"success": false, "message": "Invalid OTP."}));
    }

    #[test]
    fn test_upstream_network_error_maps_to_bad_gateway() {
        let err: ServerError = bastion_upstream::UpstreamError::Network("refused".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
