//! Prometheus metrics for the CMX receiver
//!
//! One registry per process, exposed in text form at `GET /metrics`:
//! - `payloads_total` (counter) - ingestion outcomes
//! - `device_types_total` (counter) - classified payload types
//! - `auth_mismatches_total` (counter) - diagnostic secret/version mismatches
//! - `observations_enriched_total` / `observations_skipped_total` (counters)
//! - `ingest_duration_seconds` (histogram)
//! - `sink_failures_total` (counter)

use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;

use crate::contracts::DeviceType;
use crate::pipeline::enrich::EnrichmentSummary;

/// Ingestion outcome labels for `payloads_total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Accepted,
    Malformed,
    RejectedSecret,
    RejectedVersion,
    SinkError,
}

impl IngestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestOutcome::Accepted => "accepted",
            IngestOutcome::Malformed => "malformed",
            IngestOutcome::RejectedSecret => "rejected_secret",
            IngestOutcome::RejectedVersion => "rejected_version",
            IngestOutcome::SinkError => "sink_error",
        }
    }
}

/// Receiver metrics, registered once and shared across handlers
pub struct ReceiverMetrics {
    registry: Arc<Registry>,

    payloads_total: CounterVec,
    device_types_total: CounterVec,
    auth_mismatches_total: CounterVec,
    observations_enriched_total: Counter,
    observations_skipped_total: Counter,
    ingest_duration_seconds: Histogram,
    sink_failures_total: Counter,
}

impl ReceiverMetrics {
    /// Create and register the full metric set
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Arc::new(Registry::new());

        let payloads_total = CounterVec::new(
            Opts::new("payloads_total", "Ingested payloads by outcome").namespace("cmx_receiver"),
            &["outcome"],
        )?;

        let device_types_total = CounterVec::new(
            Opts::new("device_types_total", "Accepted payloads by classified device type")
                .namespace("cmx_receiver"),
            &["device_type"],
        )?;

        let auth_mismatches_total = CounterVec::new(
            Opts::new(
                "auth_mismatches_total",
                "Diagnostic secret/version mismatches on accepted payloads",
            )
            .namespace("cmx_receiver"),
            &["check"],
        )?;

        let observations_enriched_total = Counter::with_opts(
            Opts::new(
                "observations_enriched_total",
                "Observations that received a geo feature",
            )
            .namespace("cmx_receiver"),
        )?;

        let observations_skipped_total = Counter::with_opts(
            Opts::new(
                "observations_skipped_total",
                "Observations skipped for missing or invalid location fields",
            )
            .namespace("cmx_receiver"),
        )?;

        let ingest_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("ingest_duration_seconds", "End-to-end ingestion duration")
                .namespace("cmx_receiver")
                .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;

        let sink_failures_total = Counter::with_opts(
            Opts::new("sink_failures_total", "Writes refused or failed by the persistence sink")
                .namespace("cmx_receiver"),
        )?;

        registry.register(Box::new(payloads_total.clone()))?;
        registry.register(Box::new(device_types_total.clone()))?;
        registry.register(Box::new(auth_mismatches_total.clone()))?;
        registry.register(Box::new(observations_enriched_total.clone()))?;
        registry.register(Box::new(observations_skipped_total.clone()))?;
        registry.register(Box::new(ingest_duration_seconds.clone()))?;
        registry.register(Box::new(sink_failures_total.clone()))?;

        Ok(Self {
            registry,
            payloads_total,
            device_types_total,
            auth_mismatches_total,
            observations_enriched_total,
            observations_skipped_total,
            ingest_duration_seconds,
            sink_failures_total,
        })
    }

    /// Record one ingestion outcome
    pub fn record_outcome(&self, outcome: IngestOutcome) {
        self.payloads_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Record the classified device type of an accepted payload
    pub fn record_device_type(&self, device_type: DeviceType) {
        self.device_types_total
            .with_label_values(&[device_type.as_str()])
            .inc();
    }

    /// Record a non-fatal secret or version mismatch
    pub fn record_auth_mismatch(&self, check: &str) {
        self.auth_mismatches_total.with_label_values(&[check]).inc();
    }

    /// Record a batch's enrichment accounting
    pub fn record_enrichment(&self, summary: &EnrichmentSummary) {
        self.observations_enriched_total.inc_by(summary.enriched as f64);
        self.observations_skipped_total.inc_by(summary.skipped as f64);
    }

    /// Observe one end-to-end ingestion duration
    pub fn observe_ingest_duration(&self, duration_secs: f64) {
        self.ingest_duration_seconds.observe(duration_secs);
    }

    /// Record a sink write failure
    pub fn record_sink_failure(&self) {
        self.sink_failures_total.inc();
    }

    /// The underlying registry
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Encode every metric in Prometheus text exposition format
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
