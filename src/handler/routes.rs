//! Route definitions for the CMX receiver
//!
//! This module defines the HTTP surface:
//! - `GET /` - handshake: answers with the configured validator token
//! - `POST /` - payload ingestion
//! - `GET /health` - health check
//! - `GET /observations` - flattened stored observations (reporting read)
//! - `GET /metrics` - Prometheus text exposition
//!
//! The handshake and ingestion bodies are fixed plain-text strings the
//! sender matches on; they must not change shape.

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ReceiverConfig;
use crate::contracts::PersistedRecord;
use crate::error::ReceiverError;
use crate::pipeline::IngestionPipeline;
use crate::store::PayloadStore;
use crate::telemetry::ReceiverMetrics;

use super::middleware::request_logging_middleware;
use super::{ComponentHealth, HealthResponse, HealthStatus};

/// Acknowledgment body for an accepted POST
pub const POST_ACK: &str = "CMX POST Received";

/// Body for a structurally invalid POST
pub const INVALID_DATA: &str = "invalid data";

/// Body for an enforced secret rejection
pub const INVALID_SECRET: &str = "invalid secret";

/// Body for an enforced version rejection
pub const INVALID_VERSION: &str = "invalid version";

/// Body when the persistence sink fails the write
pub const PERSISTENCE_FAILED: &str = "persistence failure";

/// Handler state shared across all routes
#[derive(Clone)]
pub struct AppState {
    /// Immutable process configuration
    pub config: Arc<ReceiverConfig>,
    /// Ingestion orchestrator
    pub pipeline: Arc<IngestionPipeline>,
    /// Persistence sink, shared with the pipeline
    pub store: Arc<dyn PayloadStore>,
    /// Metrics registry
    pub metrics: Arc<ReceiverMetrics>,
    /// Start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: Arc<ReceiverConfig>,
        store: Arc<dyn PayloadStore>,
        metrics: Arc<ReceiverMetrics>,
    ) -> Self {
        let pipeline = Arc::new(IngestionPipeline::new(
            Arc::clone(&config),
            Arc::clone(&store),
            Arc::clone(&metrics),
        ));
        Self {
            config,
            pipeline,
            store,
            metrics,
            start_time: Instant::now(),
        }
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handshake).post(ingest))
        .route("/health", get(health_check))
        .route("/observations", get(list_observations))
        .route("/metrics", get(metrics_text))
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .with_state(state)
}

/// GET / - Handshake
///
/// Answers the liveness/ownership check with the configured validator token
/// as the full response body, unconditionally. The caller's network origin
/// is logged for observability; this operation cannot fail.
pub async fn handshake(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
) -> String {
    tracing::info!(remote = %remote_label(&addr), "validator token sent");
    state.config.validator_token.clone()
}

/// POST / - Payload ingestion
///
/// Hands the raw body to the pipeline. Accepted payloads answer with the
/// fixed acknowledgment string once the sink confirms the write; structural
/// rejections answer `400 "invalid data"` before anything is persisted.
pub async fn ingest(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Response {
    tracing::info!(
        remote = %remote_label(&addr),
        bytes = body.len(),
        "payload received"
    );

    match state.pipeline.ingest(&body).await {
        Ok(_receipt) => (StatusCode::OK, POST_ACK).into_response(),
        Err(error) => error_response(&error),
    }
}

/// GET /health - Health check
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_healthy = state.store.healthy().await;

    let status = if store_healthy {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    Json(HealthResponse {
        status,
        components: ComponentHealth {
            pipeline: true,
            store: store_healthy,
            telemetry: true,
        },
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /observations - Reporting read
///
/// Flattens every stored record's observation list into one row sequence,
/// in storage order. Read-only; enriched observations carry their `geoJSON`
/// feature, skipped ones do not.
pub async fn list_observations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Value>>, Response> {
    match state.store.all().await {
        Ok(records) => Ok(Json(flatten_observations(&records))),
        Err(error) => {
            tracing::error!(error = %error, "record listing failed");
            Err((StatusCode::SERVICE_UNAVAILABLE, PERSISTENCE_FAILED).into_response())
        }
    }
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics_text(State(state): State<AppState>) -> Response {
    match state.metrics.encode_text() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(error) => {
            tracing::error!(error = %error, "metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        }
    }
}

// Helper functions

fn remote_label(addr: &Option<ConnectInfo<SocketAddr>>) -> String {
    addr.as_ref()
        .map(|ConnectInfo(a)| a.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn error_response(error: &ReceiverError) -> Response {
    let (status, body) = match error {
        ReceiverError::MalformedPayload(_) => (StatusCode::BAD_REQUEST, INVALID_DATA),
        ReceiverError::SecretRejected => (StatusCode::FORBIDDEN, INVALID_SECRET),
        ReceiverError::VersionRejected(_) => (StatusCode::BAD_REQUEST, INVALID_VERSION),
        ReceiverError::Persistence(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, PERSISTENCE_FAILED)
        }
    };
    (status, body).into_response()
}

fn flatten_observations(records: &[PersistedRecord]) -> Vec<Value> {
    records
        .iter()
        .flat_map(|record| record.observations().iter().cloned())
        .collect()
}
