//! Client configuration
//!
//! Endpoint paths live in a single const table so the wire layout is kept in
//! one place. [`ClientConfig`] collects the independent options (base URL,
//! transport, retry count, rate limit, diagnostics); each one falls back to
//! its default when left unset.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::diagnostics::{DiagnosticSink, WriterSink};
use super::rate_limit::RateLimit;
use super::transport::{default_transport, Transport};
use super::{ClientError, ClientResult};

/// Protocol version sent as `api_v` on every request
pub const API_VERSION: &str = "2";

/// Query parameter carrying [`API_VERSION`]
pub const API_VERSION_PARAM: &str = "api_v";

/// Default number of attempts per request
pub const DEFAULT_RETRIES: i32 = 3;

/// Default token refill interval (three requests per second)
pub const DEFAULT_RATE_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 3);

/// Default token bucket capacity
pub const DEFAULT_RATE_BURST: u32 = 10;

/// Default base URL
///
/// The historical `psrefapi.lenovo.com:8081` host name now resolves elsewhere,
/// so the service is addressed by IP.
pub const DEFAULT_BASE_URL: &str = "http://104.232.254.26:8081";

/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "PSREF_BASE_URL";
/// Environment variable overriding the retry count
pub const ENV_RETRIES: &str = "PSREF_RETRIES";
/// Environment variable enabling raw response mirroring to stderr
pub const ENV_DEBUG: &str = "PSREF_DEBUG";

/// Paths of the catalog endpoints, relative to the base URL
#[derive(Debug, Clone)]
pub struct CatalogEndpoints {
    /// Active product hierarchy
    pub products: &'static str,
    /// Withdrawn product hierarchy (legacy field names)
    pub withdrawn_products: &'static str,
    /// Change feed
    pub updates: &'static str,
    /// Product detail prefix, followed by `/{pid}`
    pub product: &'static str,
    /// Model detail prefix, followed by `/{pid}/{code}`
    pub model: &'static str,
    /// Books and other reading resources
    pub books: &'static str,
    /// Keyword search
    pub search: &'static str,
}

/// Endpoint table of the mobile catalog API
pub const PSREF_ENDPOINTS: CatalogEndpoints = CatalogEndpoints {
    products: "/",
    withdrawn_products: "/psref/mobile/withdrawproducts",
    updates: "/psref/mobile/new",
    product: "/psref/mobile/product",
    model: "/psref/mobile/Model",
    books: "/psref/mobile/book",
    search: "/psref/mobile/searchv3",
};

/// Immutable client configuration
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL without a trailing slash
    pub base_url: String,
    /// HTTP transport
    pub transport: Arc<dyn Transport>,
    /// Retry count: 0 or 1 sends once, negative retries until completion
    pub retries: i32,
    /// Client-side rate limit
    pub rate_limit: RateLimit,
    /// Optional mirror for raw request URLs and response bodies
    pub diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("retries", &self.retries)
            .field("rate_limit", &self.rate_limit)
            .field("diagnostics", &self.diagnostics.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            transport: default_transport(),
            retries: DEFAULT_RETRIES,
            rate_limit: default_rate_limit(),
            diagnostics: None,
        }
    }
}

impl ClientConfig {
    /// Start building a configuration from defaults
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Defaults overridden by `PSREF_BASE_URL`, `PSREF_RETRIES` and `PSREF_DEBUG`
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if `PSREF_RETRIES` is not an integer
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(url) = lookup(ENV_BASE_URL) {
            builder = builder.base_url(url);
        }
        if let Some(raw) = lookup(ENV_RETRIES) {
            let retries = raw.trim().parse::<i32>().map_err(|e| {
                ClientError::Config(format!("invalid {ENV_RETRIES} value '{raw}': {e}"))
            })?;
            builder = builder.retries(retries);
        }
        if lookup(ENV_DEBUG).is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            builder = builder.diagnostics(Arc::new(WriterSink::new(std::io::stderr())));
        }
        Ok(builder.build())
    }
}

/// Builder for [`ClientConfig`]
#[derive(Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    retries: Option<i32>,
    rate_limit: Option<RateLimit>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl ClientConfigBuilder {
    /// Override the base URL. An empty string keeps the default.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = if url.is_empty() {
            None
        } else {
            Some(url.trim_end_matches('/').to_string())
        };
        self
    }

    /// Override the HTTP transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the number of attempts per request
    ///
    /// 0 or 1 sends each request once; a negative value retries until
    /// success, absence or cancellation.
    pub fn retries(mut self, retries: i32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Set the client-side rate limit
    pub fn rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Mirror raw request URLs and response bodies to `sink`
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Finish the configuration
    pub fn build(self) -> ClientConfig {
        ClientConfig {
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            transport: self.transport.unwrap_or_else(default_transport),
            retries: self.retries.unwrap_or(DEFAULT_RETRIES),
            rate_limit: self.rate_limit.unwrap_or_else(default_rate_limit),
            diagnostics: self.diagnostics,
        }
    }
}

fn default_rate_limit() -> RateLimit {
    RateLimit::PerInterval {
        interval: DEFAULT_RATE_INTERVAL,
        burst: DEFAULT_RATE_BURST,
    }
}
