//! Payload authenticator
//!
//! Runs the shared-secret and schema-version checks against one envelope.
//! Both checks exist for audit first: by default a mismatch is logged as a
//! warning and the payload continues to enrichment and persistence. Each
//! check can independently be flipped to enforcing via configuration.
//!
//! Secret values are never written to the log, only the comparison outcome.

use serde::Serialize;

use crate::config::ReceiverConfig;
use crate::contracts::RawPayload;
use crate::error::{ReceiverError, Result};

/// Outcome of the independent authentication checks, kept for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthReport {
    /// Declared secret matched the configured shared secret
    pub secret_ok: bool,
    /// Declared version matched the supported schema version
    pub version_ok: bool,
}

impl AuthReport {
    /// True when every check passed
    pub fn all_ok(&self) -> bool {
        self.secret_ok && self.version_ok
    }
}

/// Check one envelope's secret and version against the configuration.
///
/// An envelope carrying no `secret` or no `version` at all is malformed and
/// stops the pipeline; a *mismatched* value is a diagnostic unless the
/// corresponding `reject-on-*-mismatch` flag is set.
pub fn authenticate(payload: &RawPayload, config: &ReceiverConfig) -> Result<AuthReport> {
    let secret = payload
        .secret()
        .ok_or_else(|| ReceiverError::malformed("payload has no 'secret' field"))?;
    let version = payload
        .version()
        .ok_or_else(|| ReceiverError::malformed("payload has no 'version' field"))?;

    let secret_ok = secret == config.shared_secret;
    if secret_ok {
        tracing::debug!("payload secret verified");
    } else {
        tracing::warn!("payload secret does not match the configured shared secret");
        if config.reject_on_secret_mismatch {
            return Err(ReceiverError::SecretRejected);
        }
    }

    let version_ok = version == config.supported_version;
    if version_ok {
        tracing::debug!(version, "payload version verified");
    } else {
        tracing::warn!(
            declared = version,
            supported = %config.supported_version,
            "payload version does not match the supported version"
        );
        if config.reject_on_version_mismatch {
            return Err(ReceiverError::VersionRejected(version.to_string()));
        }
    }

    Ok(AuthReport { secret_ok, version_ok })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(secret: &str, version: &str) -> RawPayload {
        RawPayload::from_value(json!({
            "secret": secret,
            "version": version,
            "type": "DevicesSeen",
            "data": {"observations": []}
        }))
        .unwrap()
    }

    #[test]
    fn test_matching_checks_pass() {
        let config = ReceiverConfig::default();
        let report = authenticate(&payload(&config.shared_secret.clone(), "2.0"), &config).unwrap();
        assert!(report.all_ok());
    }

    #[test]
    fn test_mismatch_is_nonfatal_by_default() {
        let config = ReceiverConfig::default();
        let report = authenticate(&payload("wrong-secret", "1.0"), &config).unwrap();
        assert!(!report.secret_ok);
        assert!(!report.version_ok);
        assert!(!report.all_ok());
    }

    #[test]
    fn test_missing_secret_is_malformed() {
        let config = ReceiverConfig::default();
        let no_secret = RawPayload::from_value(json!({
            "version": "2.0",
            "data": {"observations": []}
        }))
        .unwrap();
        let err = authenticate(&no_secret, &config).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_missing_version_is_malformed() {
        let config = ReceiverConfig::default();
        let no_version = RawPayload::from_value(json!({
            "secret": "s",
            "data": {"observations": []}
        }))
        .unwrap();
        let err = authenticate(&no_version, &config).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_secret_enforcement_rejects() {
        let config = ReceiverConfig {
            reject_on_secret_mismatch: true,
            ..Default::default()
        };
        let err = authenticate(&payload("wrong-secret", "2.0"), &config).unwrap_err();
        assert!(matches!(err, ReceiverError::SecretRejected));
    }

    #[test]
    fn test_version_enforcement_rejects() {
        let config = ReceiverConfig {
            reject_on_version_mismatch: true,
            ..Default::default()
        };
        let secret = config.shared_secret.clone();
        let err = authenticate(&payload(&secret, "1.0"), &config).unwrap_err();
        assert!(matches!(err, ReceiverError::VersionRejected(v) if v == "1.0"));
    }

    #[test]
    fn test_enforcement_does_not_reject_matching_payloads() {
        let config = ReceiverConfig {
            reject_on_secret_mismatch: true,
            reject_on_version_mismatch: true,
            ..Default::default()
        };
        let secret = config.shared_secret.clone();
        let report = authenticate(&payload(&secret, "2.0"), &config).unwrap();
        assert!(report.all_ok());
    }
}
