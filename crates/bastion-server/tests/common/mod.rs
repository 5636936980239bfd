//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum_extra::extract::cookie::Cookie;
use reqwest::{Client, redirect};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use wiremock::MockServer;

use bastion_server::{Server, ServerConfig};
use bastion_upstream::{ClientConfig, UpstreamClient};

/// A gateway running in the background against a mock upstream.
pub struct TestGateway {
    /// The gateway's address.
    pub addr: SocketAddr,
    /// Mock upstream API.
    pub upstream: MockServer,
    /// HTTP client that does not follow redirects.
    pub client: Client,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
}

impl TestGateway {
    /// Start a gateway with default configuration.
    pub async fn start() -> Result<Self> {
        Self::start_with(|config| config).await
    }

    /// Start a gateway, letting the caller adjust the configuration.
    pub async fn start_with(configure: impl FnOnce(ServerConfig) -> ServerConfig) -> Result<Self> {
        let upstream = MockServer::start().await;
        let base_url = format!("{}/api", upstream.uri());
        Self::launch(upstream, base_url, configure).await
    }

    /// Start a gateway whose upstream base URL points at a closed port.
    pub async fn start_unreachable() -> Result<Self> {
        let upstream = MockServer::start().await;
        let dead = find_available_port().await?;
        Self::launch(upstream, format!("http://{}/api", dead), |config| config).await
    }

    async fn launch(
        upstream: MockServer,
        base_url: String,
        configure: impl FnOnce(ServerConfig) -> ServerConfig,
    ) -> Result<Self> {
        let addr = find_available_port().await?;

        let config = configure(
            ServerConfig::new()
                .with_bind_address(addr)
                .with_request_logging(false),
        );
        let upstream_client = UpstreamClient::new(ClientConfig::parse(&base_url)?)?;
        let server = Server::new(config, upstream_client);

        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::builder().redirect(redirect::Policy::none()).build()?;
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            upstream,
            client,
            _handle: handle,
        })
    }

    /// Get the base URL for the gateway.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Request builder carrying the session cookie.
    pub fn with_session(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("cookie", format!("admin_token={}", token))
    }

    /// POST a raw JSON string to the gateway.
    pub async fn post_json(&self, path: &str, body: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url(path))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await?)
    }
}

/// Every `Set-Cookie` on a response, parsed.
pub fn set_cookies(response: &reqwest::Response) -> Vec<Cookie<'static>> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse(v.to_string()).ok())
        .collect()
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
