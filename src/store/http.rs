//! HTTP sink adapter
//!
//! Forwards persisted records to a sink service over HTTP:
//! `POST {base}/records` with the record as the JSON body, expecting
//! `{"id": "..."}` back. Requests carry a bounded timeout; transient
//! failures (connection errors, 5xx) are retried with exponential backoff,
//! permanent rejections (4xx) are not. Retry policy lives here, in the
//! adapter - the pipeline itself never retries.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;

use crate::contracts::PersistedRecord;

use super::{PayloadStore, StoreError};

/// Configuration for the HTTP sink adapter
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL of the sink service
    pub base_url: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// Maximum retry attempts for transient failures
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    pub max_backoff_ms: u64,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 5000,
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 5000,
        }
    }
}

/// Sink acknowledgment for one inserted record
#[derive(Debug, Deserialize)]
struct InsertAck {
    id: String,
}

/// Record listing returned by the sink
#[derive(Debug, Deserialize)]
struct RecordListing {
    #[serde(default)]
    records: Vec<PersistedRecord>,
}

/// HTTP-backed [`PayloadStore`]
pub struct HttpStore {
    client: Client,
    config: HttpStoreConfig,
}

impl HttpStore {
    /// Create an adapter against the given sink base URL
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        let config = HttpStoreConfig {
            base_url: base_url.into(),
            timeout_ms,
            ..Default::default()
        };
        Self::with_config(config)
    }

    /// Create an adapter with full control over retry behavior
    pub fn with_config(config: HttpStoreConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// The configured sink base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Send one insert request, without retrying
    async fn send_insert(&self, record: &PersistedRecord) -> Result<String, StoreError> {
        let url = format!("{}/records", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        let status = response.status();

        if status.is_success() {
            let ack: InsertAck = response
                .json()
                .await
                .map_err(|e| StoreError::BadResponse(e.to_string()))?;
            Ok(ack.id)
        } else if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Rejected(format!("{}: {}", status, body)))
        } else {
            Err(StoreError::Unreachable(format!("server error: {}", status)))
        }
    }
}

#[async_trait]
impl PayloadStore for HttpStore {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    async fn insert(&self, record: &PersistedRecord) -> Result<String, StoreError> {
        let mut backoff_ms = self.config.initial_backoff_ms;
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(attempt, backoff_ms, "retrying sink insert");
                sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(self.config.max_backoff_ms);
            }

            match self.send_insert(record).await {
                Ok(id) => {
                    tracing::debug!(record_id = %id, "record accepted by sink");
                    return Ok(id);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "sink insert failed");
                    let transient = e.is_transient();
                    last_error = Some(e);
                    if !transient {
                        break;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| StoreError::Unreachable("sink insert never attempted".to_string())))
    }

    async fn all(&self) -> Result<Vec<PersistedRecord>, StoreError> {
        let url = format!("{}/records", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Unreachable(format!(
                "listing failed: {}",
                response.status()
            )));
        }

        let listing: RecordListing = response
            .json()
            .await
            .map_err(|e| StoreError::BadResponse(e.to_string()))?;
        Ok(listing.records)
    }

    async fn healthy(&self) -> bool {
        let url = format!("{}/health", self.config.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "sink health probe failed");
                false
            }
        }
    }
}
