//! Catalog API client
//!
//! [`Client`] exposes one async method per catalog endpoint. Each method runs
//! through the shared [`http::CatalogHttpClient`] executor (rate limit, retry,
//! decode) and normalizes the decoded record before returning it.
//!
//! # Error Handling
//!
//! All operations return [`ClientResult`]. Errors fall into four groups:
//! - Absence ([`ClientError::NotFound`]), never retried
//! - Request failures (status, network, decode), retried up to the budget
//! - Ambiguity ([`ClientError::AmbiguousProduct`], [`ClientError::AmbiguousModel`]), terminal
//! - Cancellation ([`ClientError::Cancelled`]), propagated immediately

use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::cancel::Cancellation;
use crate::{Book, Model, ModelCode, Pid, Product, ProductType, SearchResult, Updates, WithdrawnProductType};

pub mod config;
pub mod diagnostics;
pub mod http;
pub mod rate_limit;
pub mod resolver;
pub mod retry;
pub mod transport;

pub use config::{ClientConfig, ClientConfigBuilder, PSREF_ENDPOINTS};
pub use diagnostics::{DiagnosticSink, WriterSink};
pub use http::CatalogHttpClient;
pub use rate_limit::{RateLimit, RateLimitError, RateLimiter};
pub use retry::RetryBudget;
pub use transport::{ReqwestTransport, Transport, TransportResponse};

/// Client errors
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ClientError {
    /// The requested resource does not exist
    #[error("not found")]
    NotFound,

    /// Unexpected HTTP status
    #[error("{path}: status {status}")]
    Status {
        /// Request path
        path: String,
        /// Numeric status code
        code: u16,
        /// Status line text (e.g. "503 Service Unavailable")
        status: String,
    },

    /// Transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not decode
    #[error("decode error: {0}")]
    Decode(String),

    /// A model code matched more than one product
    #[error("more than one product matched")]
    AmbiguousProduct,

    /// A model code matched more than one model
    #[error("more than one model matched")]
    AmbiguousModel,

    /// The caller cancelled the request or its deadline passed
    #[error("request cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Status { .. } | ClientError::Network(_) | ClientError::Decode(_)
        )
    }

    /// Whether the error reports absence rather than failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound)
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Optional filters accepted by the product detail endpoint
///
/// Empty strings and a zero page are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Classification filter
    pub clsf: String,
    /// Search condition
    pub sc: String,
    /// Query type
    pub qt: String,
    /// Keyword filter
    pub kw: String,
    /// Page number of the model list
    pub page: u32,
}

impl ProductQuery {
    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.clsf.is_empty() {
            params.push(("clsf", self.clsf.clone()));
        }
        if !self.sc.is_empty() {
            params.push(("sc", self.sc.clone()));
        }
        if !self.qt.is_empty() {
            params.push(("qt", self.qt.clone()));
        }
        if self.page != 0 {
            params.push(("pagenumber", self.page.to_string()));
        }
        if !self.kw.is_empty() {
            params.push(("kw", self.kw.clone()));
        }
        params
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    #[serde(rename = "result")]
    results: Option<Vec<SearchResult>>,
}

/// Client for the catalog API
///
/// Cheap to clone; clones share the transport and the rate limiter.
#[derive(Clone)]
pub struct Client {
    http: Arc<CatalogHttpClient>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.http.base_url())
            .field("budget", &self.http.budget())
            .finish()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Client with the default configuration
    ///
    /// Retries each request a few times and applies a conservative rate limit.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Client with an explicit configuration
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            http: Arc::new(CatalogHttpClient::new(config)),
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// List all active products. See [`Client::withdrawn_products`] for discontinued ones.
    pub async fn products(&self, cancel: &Cancellation) -> ClientResult<Vec<ProductType>> {
        let resp: Option<Vec<ProductType>> =
            self.http.get(cancel, PSREF_ENDPOINTS.products, &[]).await?;
        let mut types = resp.unwrap_or_default();
        types.iter_mut().for_each(ProductType::normalize);
        Ok(types)
    }

    /// List discontinued products
    pub async fn withdrawn_products(&self, cancel: &Cancellation) -> ClientResult<Vec<ProductType>> {
        let resp: Option<Vec<WithdrawnProductType>> = self
            .http
            .get(cancel, PSREF_ENDPOINTS.withdrawn_products, &[])
            .await?;
        Ok(resp
            .unwrap_or_default()
            .into_iter()
            .map(|raw| {
                let mut pt = ProductType::from(raw);
                pt.normalize();
                pt
            })
            .collect())
    }

    /// Current catalog version and the lists of added, updated and withdrawn products
    ///
    /// A `null` body does not decode and is retried like any other decode failure.
    pub async fn updates(&self, cancel: &Cancellation) -> ClientResult<Updates> {
        let mut updates: Updates = self.http.get(cancel, PSREF_ENDPOINTS.updates, &[]).await?;
        updates.normalize();
        debug!(
            "Catalog version {} with {} new, {} updated, {} withdrawn",
            updates.version,
            updates.new.len(),
            updates.updated.len(),
            updates.withdrawn.len()
        );
        Ok(updates)
    }

    /// Product record, including its full model list
    pub async fn product_by_id(&self, cancel: &Cancellation, id: Pid) -> ClientResult<Product> {
        self.product_with_query(cancel, id, &ProductQuery::default())
            .await
    }

    /// Product record with optional model-list filters
    pub async fn product_with_query(
        &self,
        cancel: &Cancellation,
        id: Pid,
        query: &ProductQuery,
    ) -> ClientResult<Product> {
        let path = format!("{}/{}", PSREF_ENDPOINTS.product, id);
        let mut product: Product = self.http.get(cancel, &path, &query.to_params()).await?;
        product.normalize();
        Ok(product)
    }

    /// Model record with specifications
    ///
    /// The returned record's code is always the requested `code`.
    pub async fn model_by_id(
        &self,
        cancel: &Cancellation,
        id: Pid,
        code: &ModelCode,
    ) -> ClientResult<Model> {
        let path = format!("{}/{}/{}", PSREF_ENDPOINTS.model, id, code);
        let mut model: Model = self.http.get(cancel, &path, &[]).await?;
        model.code = code.clone();
        model.normalize();
        Ok(model)
    }

    /// Reading resources
    pub async fn books(&self, cancel: &Cancellation) -> ClientResult<Vec<Book>> {
        let resp: Option<Vec<Book>> = self.http.get(cancel, PSREF_ENDPOINTS.books, &[]).await?;
        let mut books = resp.unwrap_or_default();
        books.iter_mut().for_each(Book::normalize);
        Ok(books)
    }

    /// Keyword search
    pub async fn search(&self, cancel: &Cancellation, keywords: &str) -> ClientResult<Vec<SearchResult>> {
        let resp: Option<SearchResponse> = self
            .http
            .get(cancel, PSREF_ENDPOINTS.search, &[("kw", keywords.to_string())])
            .await?;
        Ok(resp.and_then(|r| r.results).unwrap_or_default())
    }
}
