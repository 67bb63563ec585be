//! CMX Receiver - location telemetry ingestion endpoint
//!
//! Receives location-observation payloads from a wireless-access-point
//! telemetry feed, validates them against the handshake and payload
//! contract, attaches a point-geometry feature to each located observation,
//! and persists the redacted record exactly once per accepted delivery.
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `config` - CLI flags folded into one immutable runtime configuration
//! - `contracts` - envelope, feature, and record data model
//! - `pipeline` - validation, authentication, classification, enrichment,
//!   persistence, in that fixed order
//! - `store` - persistence sink trait with in-memory and HTTP backends
//! - `handler` - axum routes: handshake, ingestion, health, reporting, metrics
//! - `telemetry` - Prometheus metrics
//! - `error` - ingestion error taxonomy
//!
//! ## Contract notes
//!
//! Authentication is permissive by default: secret and version mismatches
//! are recorded and logged but do not block persistence unless the
//! corresponding enforcement flag is set. Geo features carry coordinates as
//! `[lat, lng]`, the source feed's ordering, which existing stored records
//! depend on.

pub mod config;
pub mod contracts;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod store;
pub mod telemetry;

// Re-export the types a hosting binary or test needs to assemble a receiver
pub use config::{Cli, ReceiverConfig};
pub use contracts::{
    DeviceType, FeatureProperties, GeoFeature, PersistedRecord, PointGeometry, RawPayload,
    REDACTED_SECRET,
};
pub use error::{ReceiverError, Result};
pub use handler::routes::{INVALID_DATA, INVALID_SECRET, INVALID_VERSION, POST_ACK};
pub use handler::{create_router, AppState};
pub use pipeline::{IngestReceipt, IngestionPipeline};
pub use store::{HttpStore, MemoryStore, PayloadStore, StoreError};
pub use telemetry::{IngestOutcome, ReceiverMetrics};

/// Receiver version (from Cargo.toml)
pub const RECEIVER_VERSION: &str = env!("CARGO_PKG_VERSION");
