//! Slug → long URL resolution for redirects.

use serde_json::json;
use std::sync::Arc;

use crate::domain::store::{RecordStore, StoreError};
use crate::error::AppError;
use crate::shortening::SlugCodec;

/// Initial capacity of the lookup buffer; covers typical URLs in one allocation.
const URL_BUFFER_CAPACITY: usize = 256;

pub struct LookupService {
    store: Arc<dyn RecordStore>,
    codec: Arc<SlugCodec>,
}

impl LookupService {
    pub fn new(store: Arc<dyn RecordStore>, codec: Arc<SlugCodec>) -> Self {
        Self { store, codec }
    }

    /// Resolves a request path segment to its long URL.
    ///
    /// Segments that are not well-formed slugs never reach the store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for malformed or unknown slugs and
    /// [`AppError::Internal`] on store failures.
    pub async fn resolve(&self, candidate: &str) -> Result<String, AppError> {
        let Some(slug) = self.codec.parse_slug(candidate) else {
            tracing::debug!(path = %candidate, "Not a slug");
            return Err(AppError::not_found("Slug not found", json!({})));
        };

        let mut long_url = String::with_capacity(URL_BUFFER_CAPACITY);
        match self.store.get_into(slug, &mut long_url).await {
            Ok(()) => Ok(long_url),
            Err(StoreError::NotFound) => {
                tracing::debug!(%slug, "Slug not found");
                Err(AppError::not_found("Slug not found", json!({ "slug": slug })))
            }
            Err(e) => {
                tracing::error!(%slug, error = %e, "Lookup failed");
                Err(AppError::from(e))
            }
        }
    }
}
