//! OTP identity calls against the upstream auth API.

use reqwest::{StatusCode, header};
use serde_json::{Value, json};

use crate::client::UpstreamClient;
use crate::credential::Credential;
use crate::error::{Result, UpstreamError};

/// Upstream path that sends an OTP to a phone number.
pub const SEND_OTP_PATH: &str = "admin/auth/send-otp";

/// Upstream path that verifies an OTP and issues an admin token.
pub const VERIFY_OTP_PATH: &str = "admin/auth/verify-otp";

/// Fallback message when upstream rejects a verification without one.
pub const DEFAULT_REJECTION_MESSAGE: &str = "Invalid OTP.";

/// Raw JSON reply from an identity call.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityReply {
    pub status: StatusCode,
    pub body: Value,
}

/// Normalised result of an OTP verification.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    /// Upstream accepted the OTP and issued a token.
    Verified { credential: Credential, user: Value },
    /// Upstream refused; status and message are relayed to the caller.
    Rejected { status: StatusCode, message: String },
}

impl VerifyOutcome {
    /// Interpret a verify reply. Success requires `success: true` and a
    /// non-empty `token`; anything else is a rejection carrying upstream's status.
    pub fn from_reply(reply: IdentityReply) -> Self {
        let succeeded = reply.body.get("success").and_then(Value::as_bool) == Some(true);
        let credential = reply
            .body
            .get("token")
            .and_then(Value::as_str)
            .and_then(Credential::new);

        match (succeeded, credential) {
            (true, Some(credential)) => VerifyOutcome::Verified {
                credential,
                user: reply.body.get("user").cloned().unwrap_or(Value::Null),
            },
            _ => VerifyOutcome::Rejected {
                status: reply.status,
                message: reply
                    .body
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_REJECTION_MESSAGE)
                    .to_string(),
            },
        }
    }
}

impl UpstreamClient {
    /// Ask upstream to send an OTP. The reply is returned verbatim.
    pub async fn send_otp(&self, phone_number: &str) -> Result<IdentityReply> {
        self.post_identity(SEND_OTP_PATH, &json!({ "phone_number": phone_number }))
            .await
    }

    /// Ask upstream to verify an OTP.
    pub async fn verify_otp(&self, phone_number: &str, otp: &str) -> Result<VerifyOutcome> {
        let reply = self
            .post_identity(
                VERIFY_OTP_PATH,
                &json!({ "phone_number": phone_number, "otp": otp }),
            )
            .await?;
        Ok(VerifyOutcome::from_reply(reply))
    }

    async fn post_identity(&self, path: &str, payload: &Value) -> Result<IdentityReply> {
        let url = self.target_url(path, None);

        let response = self
            .http()
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(format!("Failed to reach identity API: {}", e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Network(format!("Failed to read response: {}", e)))?;
        let body: Value = serde_json::from_slice(&bytes)?;

        tracing::info!(target_path = path, status = status.as_u16(), "Identity API responded");

        Ok(IdentityReply { status, body })
    }
}
