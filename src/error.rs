//! Error types for the CMX receiver
//!
//! Mirrors the ingestion error taxonomy: structural malformation and
//! persistence failures are fatal and surface to the caller; secret/version
//! mismatches are fatal only when enforcement is switched on.

use thiserror::Error;

use crate::store::StoreError;

/// Main error type for ingestion operations
#[derive(Error, Debug)]
pub enum ReceiverError {
    /// Envelope is structurally unusable (missing `data`, `data.observations`,
    /// `secret`, or `version`, or the body is not a JSON object)
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Declared secret does not match the configured shared secret and
    /// `reject-on-secret-mismatch` is enabled
    #[error("payload secret does not match the configured shared secret")]
    SecretRejected,

    /// Declared schema version does not match the supported version and
    /// `reject-on-version-mismatch` is enabled
    #[error("unsupported payload version: {0}")]
    VersionRejected(String),

    /// The persistence sink refused or failed the write
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl ReceiverError {
    /// Create a malformed-payload error
    pub fn malformed(msg: impl Into<String>) -> Self {
        ReceiverError::MalformedPayload(msg.into())
    }

    /// Check if this error means the payload never reached the sink
    /// because of its structure (vs. policy or infrastructure)
    pub fn is_structural(&self) -> bool {
        matches!(self, ReceiverError::MalformedPayload(_))
    }
}

impl From<serde_json::Error> for ReceiverError {
    fn from(err: serde_json::Error) -> Self {
        ReceiverError::MalformedPayload(format!("JSON error: {}", err))
    }
}

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, ReceiverError>;
