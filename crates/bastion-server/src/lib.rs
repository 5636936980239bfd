//! HTTP gateway in front of the admin console.
//!
//! This crate owns the only piece of the console that runs server side:
//! a session gate over every page, the OTP login exchange, and an
//! authenticated proxy that turns the browser's cookie into a bearer header
//! for the upstream API.
//!
//! # Features
//!
//! - Session gate with login redirect
//! - OTP login, verification and logout
//! - `/api/proxy/**` passthrough to the upstream API
//! - Request correlation ids and request logging
//! - Optional static console bundle
//!
//! # Example
//!
//! ```ignore
//! use bastion_server::{Server, ServerConfig};
//! use bastion_upstream::{ClientConfig, UpstreamClient};
//!
//! let upstream = UpstreamClient::new(ClientConfig::parse("https://api.unzolo.com/api")?)?;
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:3000".parse()?);
//!
//! Server::new(config, upstream).run().await?;
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod gate;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use credentials::{CLIENT_CREDENTIAL_COOKIE, CREDENTIAL_COOKIE, CookiePolicy};
pub use error::{ErrorResponse, Result, ServerError};
pub use gate::{AccessDecision, session_gate};
pub use logging::{RequestId, request_id_middleware, request_logging_middleware};
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use bastion_upstream::UpstreamClient;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Fallback for routes nothing else matched.
async fn not_found() -> ServerError {
    ServerError::NotFound("Not found".to_string())
}

/// The gateway server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration and upstream client.
    pub fn new(config: ServerConfig, upstream: UpstreamClient) -> Self {
        Self {
            state: AppState::new(config, upstream),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let router = Router::new()
            .merge(routes::health_routes())
            .merge(routes::auth_routes())
            .merge(routes::proxy_routes());

        let router = match &self.state.config.static_dir {
            Some(dir) => router.fallback_service(ServeDir::new(dir)),
            None => router.fallback(not_found),
        };

        router
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            // Session gate (innermost, sees every route and the fallback)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                gate::session_gate,
            ))
            // Request logging (logs gate redirects too)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            // Request id (outer, so logging and proxy can read it)
            .layer(middleware::from_fn(logging::request_id_middleware))
            // TraceLayer for detailed HTTP tracing
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until the process is stopped.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config.bind_address;
        self.serve(addr, shutdown).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        self.serve(addr, std::future::pending()).await
    }

    async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();

        info!(
            upstream = %self.state.upstream.base_url(),
            mode = %self.state.config.mode,
            "Starting server on {}",
            addr
        );

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Config(format!("Failed to bind {}: {}", addr, e)))?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| {
            ServerError::internal("Internal server error", format!("Server error: {}", e))
        })?;

        info!("Server stopped");
        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use bastion_upstream::ClientConfig;
    use tower::ServiceExt;

    fn create_test_server(config: ServerConfig) -> Server {
        let client_config = ClientConfig::parse("http://127.0.0.1:9/api").unwrap();
        let upstream = UpstreamClient::new(client_config).unwrap();
        Server::new(config, upstream)
    }

    async fn get(server: &Server, uri: &str) -> axum::response::Response {
        server
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_server_health_endpoint_bypasses_gate() {
        let server = create_test_server(ServerConfig::default());
        let response = get(&server, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_gated() {
        let server = create_test_server(ServerConfig::default());
        let response = get(&server, "/dashboard").await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    #[tokio::test]
    async fn test_unknown_route_with_session_is_json_404() {
        let server = create_test_server(ServerConfig::default());
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/nothing-here")
                    .header("cookie", "admin_token=tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "message": "Not found"}));
    }

    #[tokio::test]
    async fn test_static_dir_serves_console_bundle() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>console</h1>").unwrap();

        let server =
            create_test_server(ServerConfig::default().with_static_dir(dir.path().to_path_buf()));
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/index.html")
                    .header("cookie", "admin_token=tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"<h1>console</h1>");
    }

    #[test]
    fn test_server_bind_address() {
        let server = create_test_server(
            ServerConfig::new().with_bind_address("0.0.0.0:9000".parse().unwrap()),
        );
        assert_eq!(server.bind_address().port(), 9000);
    }
}
