//! Rate-limited, retrying GET executor
//!
//! Every catalog request goes through [`CatalogHttpClient::get`]:
//! - Rate-limiter admission (cancellable)
//! - GET with the protocol version injected into the query
//! - Status classification (404 is absence, 200 is decoded, anything else retried)
//! - JSON decoding into the caller's record shape

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::config::{ClientConfig, API_VERSION, API_VERSION_PARAM};
use super::diagnostics::{pretty_body, DiagnosticSink};
use super::rate_limit::{RateLimitError, RateLimiter};
use super::retry::{RetryBudget, RetryContext};
use super::transport::Transport;
use super::{ClientError, ClientResult};
use crate::cancel::Cancellation;

/// Executes catalog GET requests with rate limiting and retries
pub struct CatalogHttpClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    rate_limiter: Option<Arc<RateLimiter>>,
    budget: RetryBudget,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl CatalogHttpClient {
    /// Create an executor from a configuration
    pub fn new(config: ClientConfig) -> Self {
        Self {
            transport: config.transport,
            base_url: config.base_url,
            rate_limiter: config.rate_limit.build().map(Arc::new),
            budget: RetryBudget::from_count(config.retries),
            diagnostics: config.diagnostics,
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attempt budget per request
    pub fn budget(&self) -> RetryBudget {
        self.budget
    }

    /// Execute GET request with generic deserialization
    ///
    /// # Arguments
    /// * `cancel` - Aborts the rate-limiter wait, the transport call and any remaining retries
    /// * `path` - API path (e.g., "/psref/mobile/new")
    /// * `params` - Query parameters; `api_v` is appended automatically
    ///
    /// # Errors
    /// - [`ClientError::NotFound`] on HTTP 404, never retried
    /// - [`ClientError::Cancelled`] as soon as `cancel` fires
    /// - The last attempt's error once the retry budget is exhausted
    pub async fn get<T>(
        &self,
        cancel: &Cancellation,
        path: &str,
        params: &[(&str, String)],
    ) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.build_url(path, params);
        let mut attempt: u32 = 1;

        loop {
            match self.get_once(cancel, path, &url).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("{}", RetryContext::format_success(attempt, self.budget, path));
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    let ctx = RetryContext::new(attempt, self.budget, &err, path);
                    if !self.budget.allows_another(attempt) {
                        if attempt > 1 {
                            error!("{}", ctx.format_failure());
                        }
                        return Err(err);
                    }
                    warn!("{}", ctx.format_retry());
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    /// Single attempt, no retry
    async fn get_once<T>(&self, cancel: &Cancellation, path: &str, url: &str) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire(cancel).await.map_err(|e| match e {
                RateLimitError::Cancelled => ClientError::Cancelled,
                other => ClientError::Network(other.to_string()),
            })?;
        }
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        debug!("Making GET request to: {}", url);
        let response = tokio::select! {
            resp = self.transport.get(url) => resp?,
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
        };

        match response.status {
            StatusCode::NOT_FOUND => return Err(ClientError::NotFound),
            StatusCode::OK => {}
            status => {
                return Err(ClientError::Status {
                    path: path.to_string(),
                    code: status.as_u16(),
                    status: status.to_string(),
                })
            }
        }

        if let Some(sink) = &self.diagnostics {
            sink.record(url, &pretty_body(&response.body));
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            ClientError::Decode(format!("failed to deserialize response from {path}: {e}"))
        })
    }

    fn build_url(&self, path: &str, params: &[(&str, String)]) -> String {
        format!("{}{}?{}", self.base_url, path, encode_query(params))
    }
}

/// Form-encode query pairs plus `api_v`, sorted by key
fn encode_query(params: &[(&str, String)]) -> String {
    let mut pairs: Vec<(&str, &str)> = params
        .iter()
        .filter(|(key, _)| *key != API_VERSION_PARAM)
        .map(|(key, value)| (*key, value.as_str()))
        .collect();
    pairs.push((API_VERSION_PARAM, API_VERSION));
    pairs.sort_by_key(|(key, _)| *key);
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", form_encode(key), form_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn form_encode(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, QUERY_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}

/// Everything except unreserved characters is escaped in query components
const QUERY_ENCODE_SET: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
