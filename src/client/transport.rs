//! HTTP transport used by the catalog client
//!
//! The client only needs a plain GET returning a status and a body, so the
//! transport is a small trait. The default implementation wraps a process-wide
//! [`reqwest::Client`] so every catalog client shares one connection pool.

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use super::{ClientError, ClientResult};

/// HTTP connect timeout (seconds) - time to establish TCP connection
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// HTTP request timeout (seconds) - overall time for the entire request
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Raw response returned by a [`Transport`]
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Response body
    pub body: Bytes,
}

impl TransportResponse {
    /// Build a response from a status and body
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Performs a single HTTP GET
///
/// Implementations must not retry; retries and rate limiting are applied by
/// the caller. Failures to reach the server map to [`ClientError::Network`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET the absolute `url` and return its status and full body
    async fn get(&self, url: &str) -> ClientResult<TransportResponse>;
}

/// Shared HTTP client used by [`ReqwestTransport::shared`]
///
/// Configured with explicit timeouts to prevent indefinite hangs:
/// - Connect timeout: 10 seconds
/// - Request timeout: 30 seconds
///
/// Falls back to a default client if the configured builder fails.
static GLOBAL_HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to build configured HTTP client, using defaults: {}", e);
            Client::new()
        })
});

/// [`Transport`] backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Wrap an existing reqwest client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Transport over the process-wide shared client
    ///
    /// Cloning a reqwest client only bumps a reference count, so all
    /// transports created this way share one connection pool.
    pub fn shared() -> Self {
        Self::new(GLOBAL_HTTP_CLIENT.clone())
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::shared()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> ClientResult<TransportResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

/// Default transport shared by clients that do not override it
pub fn default_transport() -> Arc<dyn Transport> {
    Arc::new(ReqwestTransport::shared())
}
