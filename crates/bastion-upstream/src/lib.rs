//! Upstream API client for the Bastion admin gateway.
//!
//! Every call the gateway makes to the backend service goes through
//! [`UpstreamClient`]: the two identity calls of the OTP login flow and the
//! raw forwarding used by the proxy.
//!
//! # Components
//!
//! - [`credential`]: opaque bearer token with a redacted `Debug` and a log-safe fingerprint
//! - [`identity`]: OTP send/verify calls and normalisation of the verify reply
//! - [`body`]: typed relay body (`Json` / `Text` / `Empty`) chosen by content type
//! - [`client`]: the reqwest-backed client and request forwarding

pub mod body;
pub mod client;
pub mod credential;
pub mod error;
pub mod identity;

pub use body::{UpstreamBody, UpstreamResponse};
pub use client::{ClientConfig, ForwardRequest, UpstreamClient};
pub use credential::{Credential, token_fingerprint};
pub use error::{Result, UpstreamError};
pub use identity::{IdentityReply, VerifyOutcome};
