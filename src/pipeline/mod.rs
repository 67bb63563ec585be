//! Ingestion pipeline
//!
//! Orchestrates one payload through the fixed stage order:
//!
//! 1. structural validation (fatal on a missing `data`/`observations`)
//! 2. authentication (diagnostic by default, fatal only on missing fields
//!    or when enforcement is configured)
//! 3. classification (never fails)
//! 4. enrichment (best-effort per observation)
//! 5. persistence (fatal when the sink refuses the write)
//!
//! Each call processes one payload independently and completely; the only
//! state shared across requests is the configuration, the sink handle, and
//! the metrics registry, none of which the pipeline mutates per-request.

pub mod auth;
pub mod classify;
pub mod enrich;
pub mod geometry;

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::config::ReceiverConfig;
use crate::contracts::{DeviceType, RawPayload};
use crate::error::{ReceiverError, Result};
use crate::store::{PayloadStore, StoreError};
use crate::telemetry::{IngestOutcome, ReceiverMetrics};

use self::auth::authenticate;
use self::classify::classify;
use self::enrich::enrich;

/// Diagnostic receipt for one accepted payload
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    /// Sink-assigned record identifier
    pub record_id: String,
    /// Classified observation source
    pub device_type: DeviceType,
    /// Observations present in the envelope
    pub observations: usize,
    /// Observations that received a geo feature
    pub enriched: usize,
    /// Observations skipped by enrichment
    pub skipped: usize,
    /// Secret check outcome (diagnostic unless enforced)
    pub secret_ok: bool,
    /// Version check outcome (diagnostic unless enforced)
    pub version_ok: bool,
}

/// The ingestion orchestrator shared by all request handlers
pub struct IngestionPipeline {
    config: Arc<ReceiverConfig>,
    store: Arc<dyn PayloadStore>,
    metrics: Arc<ReceiverMetrics>,
}

impl IngestionPipeline {
    pub fn new(
        config: Arc<ReceiverConfig>,
        store: Arc<dyn PayloadStore>,
        metrics: Arc<ReceiverMetrics>,
    ) -> Self {
        Self {
            config,
            store,
            metrics,
        }
    }

    /// Run one raw request body through the pipeline.
    ///
    /// Returns the receipt once the sink confirms the write; every error
    /// path leaves the sink untouched for this payload.
    pub async fn ingest(&self, body: &[u8]) -> Result<IngestReceipt> {
        let started = Instant::now();
        let ingest_id = Uuid::new_v4();

        let result = self.run(body, ingest_id).await;
        self.metrics
            .observe_ingest_duration(started.elapsed().as_secs_f64());

        match &result {
            Ok(receipt) => {
                self.metrics.record_outcome(IngestOutcome::Accepted);
                self.metrics.record_device_type(receipt.device_type);
                tracing::info!(
                    ingest_id = %ingest_id,
                    record_id = %receipt.record_id,
                    device_type = receipt.device_type.as_str(),
                    observations = receipt.observations,
                    enriched = receipt.enriched,
                    skipped = receipt.skipped,
                    secret_ok = receipt.secret_ok,
                    version_ok = receipt.version_ok,
                    "payload persisted"
                );
            }
            Err(error) => {
                self.metrics.record_outcome(outcome_for(error));
                if let ReceiverError::Persistence(_) = error {
                    self.metrics.record_sink_failure();
                }
                tracing::warn!(ingest_id = %ingest_id, error = %error, "payload not persisted");
            }
        }

        result
    }

    async fn run(&self, body: &[u8], ingest_id: Uuid) -> Result<IngestReceipt> {
        let payload = RawPayload::from_slice(body)?;

        let auth = authenticate(&payload, &self.config)?;
        if !auth.secret_ok {
            self.metrics.record_auth_mismatch("secret");
        }
        if !auth.version_ok {
            self.metrics.record_auth_mismatch("version");
        }

        let device_type = classify(payload.payload_type());
        tracing::debug!(
            ingest_id = %ingest_id,
            device_type = device_type.as_str(),
            observations = payload.observation_count(),
            "payload classified"
        );

        let (record, summary) = enrich(payload);
        self.metrics.record_enrichment(&summary);

        // The write runs on its own task: a caller abort drops this future,
        // but must not cancel an insert already in flight.
        let store = Arc::clone(&self.store);
        let write = tokio::spawn(async move { store.insert(&record).await });
        let record_id = write
            .await
            .map_err(|e| StoreError::Unreachable(format!("sink task failed: {}", e)))??;

        Ok(IngestReceipt {
            record_id,
            device_type,
            observations: summary.observations,
            enriched: summary.enriched,
            skipped: summary.skipped,
            secret_ok: auth.secret_ok,
            version_ok: auth.version_ok,
        })
    }
}

fn outcome_for(error: &ReceiverError) -> IngestOutcome {
    match error {
        ReceiverError::MalformedPayload(_) => IngestOutcome::Malformed,
        ReceiverError::SecretRejected => IngestOutcome::RejectedSecret,
        ReceiverError::VersionRejected(_) => IngestOutcome::RejectedVersion,
        ReceiverError::Persistence(_) => IngestOutcome::SinkError,
    }
}
