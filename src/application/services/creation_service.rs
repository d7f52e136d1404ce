//! Short URL creation: CAPTCHA verification, then collision-aware minting.

use serde_json::json;
use std::sync::Arc;

use super::mint_pool::MintPool;
use crate::domain::store::{RecordStore, StoreError};
use crate::domain::verification::{Verifier, VerifyError};
use crate::error::AppError;
use crate::metrics;
use crate::shortening::{SlugCodec, SlugError};

pub const DEFAULT_MAX_MINT_ATTEMPTS: u32 = 100;

/// A minted (or previously minted) short URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedLink {
    pub slug: String,
    pub short_url: String,
    /// False when the URL already had a record under the same slug.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintOutcome {
    pub slug: String,
    pub created: bool,
    pub attempts: u32,
}

/// Drives a creation request from verification to a persisted record.
///
/// Each accepted request makes exactly one verification call, at most
/// `max_attempts` store probes and at most one store write.
pub struct CreationService {
    verifier: Arc<dyn Verifier>,
    store: Arc<dyn RecordStore>,
    codec: Arc<SlugCodec>,
    pool: MintPool,
    max_attempts: u32,
    base_url: String,
}

impl CreationService {
    pub fn new(
        verifier: Arc<dyn Verifier>,
        store: Arc<dyn RecordStore>,
        codec: Arc<SlugCodec>,
        pool: MintPool,
        max_attempts: u32,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            store,
            codec,
            pool,
            max_attempts,
            base_url: base_url.into(),
        }
    }

    /// Verifies `token`, then mints a slug for `long_url` on the minting pool.
    ///
    /// # Errors
    ///
    /// - [`AppError::VerificationFailed`] if the service refused the token or
    ///   answered with something other than a verification reply
    /// - [`AppError::Gateway`] if the service could not be reached
    /// - [`AppError::SlugSpaceExhausted`] if no free slug was found
    /// - [`AppError::Internal`] on store failures
    pub async fn create(&self, token: &str, long_url: &str) -> Result<CreatedLink, AppError> {
        self.verify(token).await?;
        tracing::debug!("Verification passed, minting");

        let store = Arc::clone(&self.store);
        let codec = Arc::clone(&self.codec);
        let url = long_url.to_string();
        let max_attempts = self.max_attempts;

        let outcome = self
            .pool
            .run(async move { mint_slug(store.as_ref(), &codec, &url, max_attempts).await })
            .await?;

        metrics::record_slug_minted(outcome.created);

        Ok(CreatedLink {
            short_url: format!("{}{}", self.base_url, outcome.slug),
            slug: outcome.slug,
            created: outcome.created,
        })
    }

    async fn verify(&self, token: &str) -> Result<(), AppError> {
        match self.verifier.verify(token).await {
            Ok(outcome) if outcome.success => Ok(()),
            Ok(outcome) => {
                metrics::record_verification_failure("refused");
                tracing::info!(error_codes = ?outcome.error_codes, "Verification refused");
                Err(AppError::verification_failed(
                    "Verification failed",
                    json!({ "error_codes": outcome.error_codes }),
                ))
            }
            Err(VerifyError::Transport(reason)) => {
                metrics::record_verification_failure("unreachable");
                tracing::error!(%reason, "Verification service unreachable");
                Err(AppError::gateway(
                    "Verification service unavailable",
                    json!({}),
                ))
            }
            Err(e) => {
                metrics::record_verification_failure("bad_reply");
                tracing::warn!(error = %e, "Verification reply rejected");
                Err(AppError::verification_failed("Verification failed", json!({})))
            }
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn mint_pool(&self) -> &MintPool {
        &self.pool
    }
}

/// Finds a slug for `long_url` that is free or already maps to it.
///
/// Walks retry indices `0..max_attempts`. A free slug is written; a slug
/// already holding `long_url` is returned without writing; a slug holding a
/// different URL is a collision and the next index is tried.
pub async fn mint_slug(
    store: &dyn RecordStore,
    codec: &SlugCodec,
    long_url: &str,
    max_attempts: u32,
) -> Result<MintOutcome, AppError> {
    for retry_index in 0..max_attempts {
        let slug = match codec.derive(long_url, retry_index) {
            Ok(slug) => slug,
            Err(SlugError::HashExhausted { windows, .. }) => {
                tracing::error!(
                    retry_index,
                    windows,
                    "Ran out of hash windows before finding a free slug"
                );
                return Err(AppError::slug_space_exhausted(
                    "Could not allocate a slug",
                    json!({ "attempts": retry_index }),
                ));
            }
            Err(e) => {
                tracing::error!(error = %e, "Slug derivation failed");
                return Err(AppError::internal("Slug derivation failed", json!({})));
            }
        };

        match store.get(&slug).await {
            Err(StoreError::NotFound) => {
                store.put(&slug, long_url).await.map_err(|e| {
                    tracing::error!(%slug, error = %e, "Failed to persist new record");
                    AppError::from(e)
                })?;
                tracing::info!(%slug, attempts = retry_index + 1, "Minted slug");
                return Ok(MintOutcome {
                    slug,
                    created: true,
                    attempts: retry_index + 1,
                });
            }
            Ok(existing) if existing == long_url => {
                tracing::debug!(%slug, "URL already shortened");
                return Ok(MintOutcome {
                    slug,
                    created: false,
                    attempts: retry_index + 1,
                });
            }
            Ok(_) => {
                metrics::record_slug_collision();
                tracing::warn!(%slug, retry_index, "Slug collision, trying next candidate");
            }
            Err(e) => {
                tracing::error!(%slug, error = %e, "Store probe failed during minting");
                return Err(AppError::from(e));
            }
        }
    }

    tracing::error!(
        max_attempts,
        "Every slug candidate collided, giving up"
    );
    Err(AppError::slug_space_exhausted(
        "Could not allocate a slug",
        json!({ "attempts": max_attempts }),
    ))
}
