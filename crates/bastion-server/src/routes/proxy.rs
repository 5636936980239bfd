//! Authenticated proxy: `/api/proxy/**` to the upstream API.
//!
//! The browser never holds a usable bearer header. It calls this route with
//! its cookie, and the gateway attaches `Authorization: Bearer <token>` and
//! relays the reply.

use std::net::SocketAddr;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{ConnectInfo, Request, State},
    http::{Method, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use bastion_upstream::{ForwardRequest, UpstreamBody, UpstreamResponse};
use serde_json::Value;

use crate::credentials;
use crate::error::{Result, ServerError};
use crate::logging::RequestId;
use crate::state::AppState;

/// Mount point of the proxy.
pub const PROXY_PREFIX: &str = "/api/proxy/";

pub const NOT_AUTHENTICATED_MESSAGE: &str = "Not authenticated. Please log in.";

// ─────────────────────────────────────────────────────────────────────────────
// Route descriptor
// ─────────────────────────────────────────────────────────────────────────────

/// The upstream target named by a proxy URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    /// Path segments after the prefix, still percent-encoded. Never empty.
    pub segments: Vec<String>,
    /// Raw query string without the `?`.
    pub query: Option<String>,
}

impl ProxyRoute {
    /// Parse a proxy URI. Empty segments are dropped.
    ///
    /// `None` if nothing remains, or if any segment would climb out of the
    /// upstream base path once decoded (`..`, `%2e%2e`, `.`).
    pub fn from_uri(uri: &Uri) -> Option<Self> {
        let rest = uri.path().strip_prefix(PROXY_PREFIX)?;
        let segments: Vec<String> = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            return None;
        }
        if segments.iter().any(|s| is_traversal_segment(s)) {
            tracing::warn!(path = %uri.path(), "Rejected proxy path that leaves the upstream base");
            return None;
        }
        Some(Self {
            segments,
            query: uri.query().filter(|q| !q.is_empty()).map(str::to_string),
        })
    }

    /// Path relative to the upstream base URL.
    pub fn upstream_path(&self) -> String {
        self.segments.join("/")
    }
}

/// `.` or `..` after percent-decoding, or anything holding a backslash,
/// which URL parsers treat as a path separator.
fn is_traversal_segment(segment: &str) -> bool {
    if segment.contains('\\') {
        return true;
    }
    matches!(
        urlencoding::decode(segment).as_deref(),
        Ok(".") | Ok("..")
    )
}

/// Existing `X-Forwarded-For` chain plus the peer address, if either is known.
fn forwarded_for(request: &Request) -> Option<String> {
    let existing = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    match (existing, peer) {
        (Some(chain), Some(peer)) => Some(format!("{}, {}", chain, peer)),
        (Some(chain), None) => Some(chain.to_string()),
        (None, Some(peer)) => Some(peer),
        (None, None) => None,
    }
}

/// Re-emit an upstream reply with its status preserved.
fn relay(response: UpstreamResponse) -> Response {
    match response.body {
        UpstreamBody::Json(value) => (response.status, Json(value)).into_response(),
        UpstreamBody::Text(text) => (response.status, Json(Value::String(text))).into_response(),
        UpstreamBody::Empty => response.status.into_response(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handler
// ─────────────────────────────────────────────────────────────────────────────

/// Forward one browser request upstream with the session credential.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    let route = ProxyRoute::from_uri(request.uri())
        .ok_or_else(|| ServerError::NotFound("Not found".to_string()))?;

    let jar = CookieJar::from_headers(request.headers());
    let credential = credentials::read_credential(&jar)
        .ok_or_else(|| ServerError::Unauthorized(NOT_AUTHENTICATED_MESSAGE.to_string()))?;

    let method = request.method().clone();
    let forwarded_for = forwarded_for(&request);
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.as_str().to_string());

    let body = if method == Method::GET || method == Method::HEAD {
        Bytes::new()
    } else {
        axum::body::to_bytes(request.into_body(), state.config.max_body_size)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Failed to read proxy request body");
                ServerError::BadRequest("Request body could not be read.".to_string())
            })?
    };

    let forward = ForwardRequest::new(method, route.upstream_path(), credential)
        .with_query(route.query)
        .with_body(body)
        .with_forwarded_for(forwarded_for)
        .with_request_id(request_id);

    let response = state.upstream.forward(forward).await?;
    Ok(relay(response))
}

/// Create the proxy routes.
///
/// The 401 for a missing credential is only reachable when these routes run
/// without [`crate::gate::session_gate`]; inside [`crate::Server::router`]
/// the gate redirects first.
pub fn proxy_routes() -> Router<AppState> {
    let handler = get(proxy_handler)
        .post(proxy_handler)
        .put(proxy_handler)
        .patch(proxy_handler)
        .delete(proxy_handler);

    Router::new().route("/api/proxy/{*path}", handler)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
