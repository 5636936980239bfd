//! OTP login, verification and logout.
//!
//! The gateway never decides who is an admin. It validates input shape,
//! forwards to the upstream identity API, and turns a successful verification
//! into the two session cookies.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};
use axum_extra::extract::cookie::CookieJar;
use bastion_upstream::VerifyOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credentials::{self, CookiePolicy};
use crate::error::{Result, ServerError};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────────────────

pub const INVALID_PHONE_MESSAGE: &str = "A valid 10-digit phone number is required.";
pub const MISSING_FIELDS_MESSAGE: &str = "Phone number and OTP are required.";
pub const SEND_OTP_FAILED_MESSAGE: &str = "Failed to send OTP. Please try again.";
pub const VERIFY_FAILED_MESSAGE: &str = "Verification failed. Please try again.";

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a successful verification. Carries the user, never the token.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub user: Value,
}

/// `{"success": true}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Read a string field from a loosely-typed login body.
///
/// Numbers are accepted and rendered as text; empty strings count as missing.
fn text_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Exactly ten ASCII digits.
pub fn is_valid_phone_number(phone: &str) -> bool {
    phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}

fn parse_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/auth/login`: ask upstream to send an OTP.
pub async fn login_handler(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let phone = text_field(&parse_body(&body), "phone_number")
        .filter(|p| is_valid_phone_number(p))
        .ok_or_else(|| ServerError::BadRequest(INVALID_PHONE_MESSAGE.to_string()))?;

    match state.upstream.send_otp(&phone).await {
        Ok(reply) => Ok((reply.status, Json(reply.body)).into_response()),
        Err(e) => Err(ServerError::internal(SEND_OTP_FAILED_MESSAGE, e.to_string())),
    }
}

/// `POST /api/auth/verify`: exchange an OTP for session cookies.
pub async fn verify_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<VerifyResponse>)> {
    let body = parse_body(&body);
    let (phone, otp) = match (text_field(&body, "phone_number"), text_field(&body, "otp")) {
        (Some(phone), Some(otp)) => (phone, otp),
        _ => return Err(ServerError::BadRequest(MISSING_FIELDS_MESSAGE.to_string())),
    };

    let outcome = state
        .upstream
        .verify_otp(&phone, &otp)
        .await
        .map_err(|e| ServerError::internal(VERIFY_FAILED_MESSAGE, e.to_string()))?;

    match outcome {
        VerifyOutcome::Verified { credential, user } => {
            tracing::info!(token = %credential.fingerprint(), "Admin session issued");
            let policy = CookiePolicy::from_config(&state.config);
            let jar = credentials::issue(jar, &credential, &policy);
            Ok((jar, Json(VerifyResponse { success: true, user })))
        }
        VerifyOutcome::Rejected { status, message } => {
            Err(ServerError::Rejected { status, message })
        }
    }
}

/// `POST /api/auth/logout`: clear both cookies. Always succeeds.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    let policy = CookiePolicy::from_config(&state.config);
    (
        credentials::clear(jar, &policy),
        Json(SuccessResponse { success: true }),
    )
}

/// Create the OTP and logout routes.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/verify", post(verify_handler))
        .route("/api/auth/logout", post(logout_handler))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
