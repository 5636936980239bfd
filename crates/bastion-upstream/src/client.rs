//! reqwest-backed client for the upstream API.
//!
//! Forwarding is payload-agnostic: the body is passed through as raw bytes
//! and the reply is classified, not validated.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Method, header};
use url::Url;

use crate::body::{UpstreamBody, UpstreamResponse};
use crate::credential::Credential;
use crate::error::{Result, UpstreamError};

/// Header carrying the caller's address chain.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Header carrying the request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Configuration for the upstream client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Absolute base URL, e.g. `https://api.unzolo.com/api`.
    pub base_url: Url,
    /// Whole-request timeout. `None` keeps the reqwest default (no timeout).
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: None,
        }
    }

    /// Parse `base_url`; it must be an absolute http(s) URL with a host.
    pub fn parse(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| UpstreamError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(UpstreamError::Config(format!(
                "Base URL must be an absolute http(s) URL: {}",
                base_url
            )));
        }
        Ok(Self::new(url))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One request to forward upstream on behalf of the browser.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    /// Upstream path relative to the base URL, without a leading slash.
    pub path: String,
    /// Original query string, still encoded, without the `?`.
    pub query: Option<String>,
    pub credential: Credential,
    pub body: Option<Bytes>,
    pub forwarded_for: Option<String>,
    pub request_id: Option<String>,
}

impl ForwardRequest {
    pub fn new(method: Method, path: impl Into<String>, credential: Credential) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            credential,
            body: None,
            forwarded_for: None,
            request_id: None,
        }
    }

    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query.filter(|q| !q.is_empty());
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_forwarded_for(mut self, forwarded_for: Option<String>) -> Self {
        self.forwarded_for = forwarded_for;
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Body to send, if any. GET and HEAD never carry one; empty bodies are dropped.
    fn outbound_body(&self) -> Option<Bytes> {
        if self.method == Method::GET || self.method == Method::HEAD {
            return None;
        }
        self.body.clone().filter(|b| !b.is_empty())
    }
}

/// Client for the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    config: ClientConfig,
}

impl UpstreamClient {
    /// Build a client. Trailing slashes are dropped from the base path, and
    /// any query or fragment on the base is discarded.
    pub fn new(mut config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| UpstreamError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let base = &mut config.base_url;
        let path = base.path().trim_end_matches('/').to_string();
        base.set_path(&path);
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self { client, config })
    }

    /// The upstream base URL.
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Absolute upstream URL for a relative path and optional raw query.
    ///
    /// `path` is appended below the base path as given; the query is set
    /// verbatim, so existing percent-escapes survive.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.config.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url.set_query(query.filter(|q| !q.is_empty()));
        url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Forward a request upstream with the bearer credential attached.
    ///
    /// Any HTTP status is a successful forward; only transport failures are
    /// errors.
    pub async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse> {
        let url = self.target_url(&request.path, request.query.as_deref());

        let mut req = self
            .client
            .request(request.method.clone(), url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(request.credential.expose());

        if let Some(forwarded_for) = &request.forwarded_for {
            req = req.header(FORWARDED_FOR_HEADER, forwarded_for);
        }
        if let Some(request_id) = &request.request_id {
            req = req.header(REQUEST_ID_HEADER, request_id);
        }
        if let Some(body) = request.outbound_body() {
            req = req.body(body);
        }

        tracing::debug!(
            method = %request.method,
            url = %url,
            token = %request.credential.fingerprint(),
            "Forwarding request upstream"
        );

        let response = req
            .send()
            .await
            .map_err(|e| UpstreamError::Network(format!("Failed to forward request: {}", e)))?;

        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Network(format!("Failed to read response: {}", e)))?;

        let body = UpstreamBody::classify(content_type.as_ref(), &bytes);

        tracing::info!(
            method = %request.method,
            url = %url,
            status = status.as_u16(),
            token = %request.credential.fingerprint(),
            "Upstream responded"
        );

        Ok(UpstreamResponse { status, body })
    }
}
