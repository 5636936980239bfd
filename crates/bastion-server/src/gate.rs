//! Session gate middleware.
//!
//! Runs before routing. Only checks that `admin_token` is present; whether
//! the token is still valid is left to the upstream on the next proxied call.

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::config::ServerConfig;
use crate::credentials;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Decision
// ─────────────────────────────────────────────────────────────────────────────

/// Login page that unauthenticated navigations are sent to.
pub const LOGIN_PATH: &str = "/login";

/// Outcome of the gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Let the request through.
    Allow,
    /// Send the browser to the login page.
    RedirectToLogin { location: String },
}

/// Whether the gate ignores this path entirely.
pub fn is_excluded(config: &ServerConfig, path: &str) -> bool {
    config
        .excluded_paths
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
}

/// Whether this path is reachable without a session.
pub fn is_public(config: &ServerConfig, path: &str) -> bool {
    config
        .public_paths
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
}

/// `/login?from=<path>` with the original path percent-encoded.
pub fn login_location(path: &str) -> String {
    format!("{}?from={}", LOGIN_PATH, urlencoding::encode(path))
}

/// Decide what to do with a request for `path`.
///
/// Matching is by prefix. Public paths are allowed whether or not a session
/// exists; an authenticated user may still see the login page.
pub fn decide(config: &ServerConfig, path: &str, has_session: bool) -> AccessDecision {
    if is_excluded(config, path) || is_public(config, path) || has_session {
        return AccessDecision::Allow;
    }
    AccessDecision::RedirectToLogin {
        location: login_location(path),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Session gate middleware.
pub async fn session_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let jar = CookieJar::from_headers(request.headers());
    let has_session = credentials::read_credential(&jar).is_some();

    match decide(&state.config, &path, has_session) {
        AccessDecision::Allow => next.run(request).await,
        AccessDecision::RedirectToLogin { location } => {
            tracing::debug!(path = %path, "No session, redirecting to login");
            Redirect::temporary(&location).into_response()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
