//! Record store contract: a flat, durable slug → long URL mapping.

use async_trait::async_trait;

/// Failure taxonomy shared by every store backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The slug has no record. Expected on every fresh mint, not a fault.
    #[error("record not found")]
    NotFound,

    /// Transient contention; the operation may succeed if repeated.
    #[error("store is busy, try again")]
    TryAgain,

    #[error("store I/O error: {0}")]
    Io(String),

    #[error("store internal error: {0}")]
    Internal(String),
}

/// Key/value store holding short URL records.
///
/// Implementations must tolerate concurrent `get`/`put` from many tasks
/// without external locking.
///
/// # Implementations
///
/// - [`crate::infrastructure::store::PgRecordStore`] - PostgreSQL
/// - [`crate::infrastructure::store::MemoryRecordStore`] - in-process map
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts or overwrites the record. Durable once this returns `Ok`.
    async fn put(&self, slug: &str, long_url: &str) -> Result<(), StoreError>;

    /// Fetches the long URL for `slug`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record exists.
    async fn get(&self, slug: &str) -> Result<String, StoreError>;

    /// Like [`RecordStore::get`], but writes into `buf` (cleared first) so the
    /// caller can reuse one allocation across lookups.
    async fn get_into(&self, slug: &str, buf: &mut String) -> Result<(), StoreError>;

    /// Cheap liveness probe for the health endpoint.
    async fn health_check(&self) -> bool;
}
