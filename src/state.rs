//! Shared application state injected into handlers.

use anyhow::Result;
use std::sync::Arc;

use crate::application::services::{CreationService, LookupService, MintPool};
use crate::config::Config;
use crate::domain::{RecordStore, Verifier};
use crate::security::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub creation_service: Arc<CreationService>,
    pub lookup_service: Arc<LookupService>,
    pub store: Arc<dyn RecordStore>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wires services over an opened store and verifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured slug alphabet or length is invalid.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn RecordStore>,
        verifier: Arc<dyn Verifier>,
    ) -> Result<Self> {
        let codec = Arc::new(config.slug_codec()?);

        let creation_service = Arc::new(CreationService::new(
            verifier,
            store.clone(),
            codec.clone(),
            MintPool::new(config.mint_workers),
            config.max_mint_attempts,
            config.base_url.clone(),
        ));
        let lookup_service = Arc::new(LookupService::new(store.clone(), codec));
        let rate_limiter = Arc::new(RateLimiter::new(
            config.trust_resolver(),
            config.rate_limit_per_minute,
            config.rate_limit_ttl(),
        ));

        Ok(Self {
            creation_service,
            lookup_service,
            store,
            rate_limiter,
        })
    }
}
