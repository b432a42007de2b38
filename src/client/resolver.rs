//! Lookup by model code
//!
//! The catalog has no endpoint keyed by model code, so these lookups go through
//! keyword search and require the hits to agree on a single product. They cost
//! an extra request and are noticeably slower than ID-based lookup; prefer
//! [`Client::product_by_id`] and [`Client::model_by_id`] when the ID is known.

use tracing::debug;

use super::{Client, ClientError, ClientResult};
use crate::cancel::Cancellation;
use crate::{Model, ModelCode, Pid, Product, SearchResult};

/// Reduce search hits to a single product and the total number of matching models
///
/// # Errors
/// - [`ClientError::NotFound`] if there are no hits
/// - [`ClientError::AmbiguousProduct`] if hits name more than one product
pub fn resolve_search_results(results: &[SearchResult]) -> ClientResult<(Pid, u64)> {
    let (first, rest) = results.split_first().ok_or(ClientError::NotFound)?;
    let mut models = first.models;
    for hit in rest {
        if hit.id != first.id {
            return Err(ClientError::AmbiguousProduct);
        }
        models = models.saturating_add(hit.models);
    }
    Ok((first.id, models))
}

impl Client {
    /// Resolve a model code to its product ID and the number of matching models
    pub async fn resolve_model_code(
        &self,
        cancel: &Cancellation,
        code: &ModelCode,
    ) -> ClientResult<(Pid, u64)> {
        let results = self.search(cancel, code.as_str()).await?;
        let (pid, models) = resolve_search_results(&results)?;
        debug!("Model code {} resolved to product {} ({} models)", code, pid, models);
        Ok((pid, models))
    }

    /// Product record for the product owning the given model code
    ///
    /// Uses the search API, which is considerably slower than [`Client::product_by_id`].
    pub async fn product_by_model_code(
        &self,
        cancel: &Cancellation,
        code: ModelCode,
    ) -> ClientResult<Product> {
        let (pid, _) = self.resolve_model_code(cancel, &code).await?;
        self.product_by_id(cancel, pid).await
    }

    /// Model record for the given model code
    ///
    /// Uses the search API, which is considerably slower than [`Client::model_by_id`].
    ///
    /// # Errors
    /// [`ClientError::AmbiguousModel`] if the code matches more than one model
    pub async fn model_by_code(&self, cancel: &Cancellation, code: ModelCode) -> ClientResult<Model> {
        let (pid, models) = self.resolve_model_code(cancel, &code).await?;
        if models > 1 {
            return Err(ClientError::AmbiguousModel);
        }
        self.model_by_id(cancel, pid, &code).await
    }
}
