//! HTTP routes.

pub mod auth;
pub mod health;
pub mod proxy;

pub use auth::{
    SuccessResponse, VerifyResponse, auth_routes, login_handler, logout_handler, verify_handler,
};
pub use health::{HealthResponse, health_routes};
pub use proxy::{ProxyRoute, proxy_handler, proxy_routes};
