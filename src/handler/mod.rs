//! HTTP handler infrastructure for the CMX receiver
//!
//! The handler module is organized into:
//! - `routes`: route definitions and the shared handler state
//! - `middleware`: request logging
//!
//! The wire contract keeps the sender-facing bodies as fixed plain-text
//! strings (the sender matches on them verbatim); only the supplemental
//! operational endpoints answer JSON.

pub mod middleware;
pub mod routes;

pub use middleware::request_logging_middleware;
pub use routes::{create_router, handshake, health_check, ingest, AppState};

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall health status
    pub status: HealthStatus,
    /// Component-level health
    pub components: ComponentHealth,
    /// Seconds since process start
    pub uptime_seconds: u64,
    /// Timestamp of the health check (ISO 8601)
    pub timestamp: String,
    /// Receiver version
    pub version: String,
}

/// Health status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Component-level health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Ingestion pipeline (stateless, available whenever the process is)
    pub pipeline: bool,
    /// Persistence sink reachability
    pub store: bool,
    /// Metrics registry
    pub telemetry: bool,
}
