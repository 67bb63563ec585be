//! Persistence sink
//!
//! The pipeline needs exactly one operation from its sink - insert a record,
//! get back an identifier - plus a read-all used by the reporting consumer.
//! Backends implement [`PayloadStore`]:
//!
//! - [`MemoryStore`] - in-process storage, the default when no sink URL is
//!   configured and the double used by tests
//! - [`HttpStore`] - forwards records to an HTTP sink service with a bounded
//!   timeout and backoff on transient failures

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::contracts::PersistedRecord;

pub mod http;

pub use http::{HttpStore, HttpStoreConfig};

/// Sink failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or timed out
    #[error("sink unreachable: {0}")]
    Unreachable(String),

    /// The backend refused the write
    #[error("sink rejected the record: {0}")]
    Rejected(String),

    /// The backend answered but the response was unusable
    #[error("sink response unreadable: {0}")]
    BadResponse(String),
}

impl StoreError {
    /// Transient failures may be retried by the adapter; rejections may not
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unreachable(_))
    }
}

/// Persistence sink interface required by the ingestion pipeline.
///
/// Implementations must be safe for concurrent use; the pipeline shares one
/// instance across all in-flight requests and performs no locking of its own.
#[async_trait]
pub trait PayloadStore: Send + Sync {
    /// Short backend label for logs and health reporting
    fn backend_tag(&self) -> &'static str;

    /// Durably insert one record, returning its sink-assigned identifier.
    ///
    /// Called exactly once per accepted payload. Re-delivered payloads insert
    /// again; deduplication is not this interface's concern.
    async fn insert(&self, record: &PersistedRecord) -> Result<String, StoreError>;

    /// Every stored record, oldest first, for the read-only reporting consumer.
    async fn all(&self) -> Result<Vec<PersistedRecord>, StoreError>;

    /// Whether the backend is currently reachable
    async fn healthy(&self) -> bool;
}

/// In-process record store
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<(String, PersistedRecord)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// True when nothing has been stored yet
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl PayloadStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, record: &PersistedRecord) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.records.lock().await.push((id.clone(), record.clone()));
        tracing::debug!(record_id = %id, "record stored in memory");
        Ok(id)
    }

    async fn all(&self) -> Result<Vec<PersistedRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::RawPayload;
    use crate::pipeline::enrich::enrich;
    use serde_json::json;

    fn sample_record() -> PersistedRecord {
        let payload = RawPayload::from_value(json!({
            "secret": "s",
            "version": "2.0",
            "type": "DevicesSeen",
            "data": {"observations": [{"clientMac": "m", "location": {"lat": 1.0, "lng": 2.0}}]}
        }))
        .unwrap();
        enrich(payload).0
    }

    #[tokio::test]
    async fn test_insert_assigns_distinct_identifiers() {
        let store = MemoryStore::new();
        let record = sample_record();
        let first = store.insert(&record).await.unwrap();
        let second = store.insert(&record).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_identical_records_are_not_deduplicated() {
        let store = MemoryStore::new();
        let record = sample_record();
        store.insert(&record).await.unwrap();
        store.insert(&record).await.unwrap();
        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], all[1]);
    }

    #[tokio::test]
    async fn test_all_preserves_insertion_order() {
        let store = MemoryStore::new();
        let first = sample_record();
        let mut second_value = first.as_value().clone();
        second_value["data"]["apFloors"] = json!(["floor-2"]);
        let second = enrich(RawPayload::from_value(second_value).unwrap()).0;

        store.insert(&first).await.unwrap();
        store.insert(&second).await.unwrap();

        let all = store.all().await.unwrap();
        assert!(all[0].as_value().get("data").unwrap().get("apFloors").is_none());
        assert!(all[1].as_value()["data"]["apFloors"].is_array());
    }

    #[tokio::test]
    async fn test_memory_store_is_always_healthy() {
        assert!(MemoryStore::new().healthy().await);
        assert_eq!(MemoryStore::new().backend_tag(), "memory");
    }

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Unreachable("timeout".into()).is_transient());
        assert!(!StoreError::Rejected("bad record".into()).is_transient());
        assert!(!StoreError::BadResponse("not json".into()).is_transient());
    }
}
