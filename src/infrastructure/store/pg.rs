//! PostgreSQL implementation of the record store.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::domain::store::{RecordStore, StoreError};

/// PostgreSQL store backed by the `short_urls` table.
pub struct PgRecordStore {
    pool: Arc<PgPool>,
}

impl PgRecordStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn put(&self, slug: &str, long_url: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO short_urls (slug, long_url)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET long_url = EXCLUDED.long_url
            "#,
        )
        .bind(slug)
        .bind(long_url)
        .execute(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get(&self, slug: &str) -> Result<String, StoreError> {
        sqlx::query_scalar::<_, String>("SELECT long_url FROM short_urls WHERE slug = $1")
            .bind(slug)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(StoreError::NotFound)
    }

    async fn get_into(&self, slug: &str, buf: &mut String) -> Result<(), StoreError> {
        buf.clear();
        let row = sqlx::query("SELECT long_url FROM short_urls WHERE slug = $1")
            .bind(slug)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(StoreError::NotFound)?;

        // Borrowed straight from the row buffer.
        let long_url: &str = row.try_get(0).map_err(map_sqlx_error)?;
        buf.push_str(long_url);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}

/// Maps sqlx failures onto the store error taxonomy.
pub fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolTimedOut => StoreError::TryAgain,
        sqlx::Error::Io(io) => StoreError::Io(io.to_string()),
        sqlx::Error::Tls(tls) => StoreError::Io(tls.to_string()),
        sqlx::Error::Protocol(msg) => StoreError::Io(msg),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            // serialization_failure, deadlock_detected
            Some("40001") | Some("40P01") => StoreError::TryAgain,
            _ => StoreError::Internal(db.message().to_string()),
        },
        other => StoreError::Internal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_sqlx_error() {
        assert_eq!(map_sqlx_error(sqlx::Error::RowNotFound), StoreError::NotFound);
        assert_eq!(map_sqlx_error(sqlx::Error::PoolTimedOut), StoreError::TryAgain);
        assert!(matches!(
            map_sqlx_error(sqlx::Error::Protocol("bad frame".into())),
            StoreError::Io(_)
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolClosed),
            StoreError::Internal(_)
        ));
    }
}
