//! Bounded pool for slug minting work.

use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::AppError;

/// Runs minting jobs on detached tasks, at most `size` at a time.
///
/// A job waits for a permit on the caller's future, so a caller that goes
/// away while queued cancels it. Once it holds a permit the job runs on its
/// own task and completes even if the caller is dropped; its result is then
/// discarded.
#[derive(Debug, Clone)]
pub struct MintPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl MintPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Twice the available parallelism.
    pub fn default_size() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get() * 2)
            .unwrap_or(2)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Permits not held by a running job.
    pub fn idle(&self) -> usize {
        self.permits.available_permits()
    }

    pub async fn run<F, T>(&self, job: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| AppError::internal("Minting pool is closed", json!({})))?;

        let handle = tokio::spawn(async move {
            let _permit = permit;
            job.await
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Minting task failed");
                Err(AppError::internal("Minting task failed", json!({})))
            }
        }
    }
}

impl Default for MintPool {
    fn default() -> Self {
        Self::new(Self::default_size())
    }
}
