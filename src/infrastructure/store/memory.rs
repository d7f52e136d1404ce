//! In-process record store for tests and local development.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::store::{RecordStore, StoreError};

/// Record store kept in a sharded concurrent map. Not durable.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: DashMap<String, String>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, slug: &str, long_url: &str) -> Result<(), StoreError> {
        self.records.insert(slug.to_string(), long_url.to_string());
        Ok(())
    }

    async fn get(&self, slug: &str) -> Result<String, StoreError> {
        self.records
            .get(slug)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn get_into(&self, slug: &str, buf: &mut String) -> Result<(), StoreError> {
        buf.clear();
        let entry = self.records.get(slug).ok_or(StoreError::NotFound)?;
        buf.push_str(entry.value());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
