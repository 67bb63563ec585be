//! Configuration for the CMX receiver
//!
//! All knobs arrive as command-line flags (with `CMX_*` environment
//! fallbacks) and are folded into one immutable [`ReceiverConfig`] at
//! startup. Handlers receive the config by shared reference; nothing mutates
//! it after construction.

use clap::Parser;

/// Built-in validator token when none is supplied
pub const DEFAULT_VALIDATOR: &str = "cmx-validator-token";

/// Built-in shared secret when none is supplied
pub const DEFAULT_SECRET: &str = "cmx-shared-secret";

/// Payload schema version this receiver was written against
pub const DEFAULT_SUPPORTED_VERSION: &str = "2.0";

/// Command-line interface for the receiver binary
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cmx-receiver",
    version,
    about = "CMX location telemetry receiver: validates, enriches, and persists observation payloads"
)]
pub struct Cli {
    /// Validator token returned on the handshake check
    #[arg(short = 'v', long = "validator", env = "CMX_VALIDATOR", default_value = DEFAULT_VALIDATOR)]
    pub validator: String,

    /// Shared secret inbound payloads must declare
    #[arg(short = 's', long = "secret", env = "CMX_SECRET", default_value = DEFAULT_SECRET)]
    pub secret: String,

    /// Expected payload schema version
    #[arg(
        long = "supported-version",
        env = "CMX_SUPPORTED_VERSION",
        default_value = DEFAULT_SUPPORTED_VERSION
    )]
    pub supported_version: String,

    /// Reject payloads whose secret mismatches instead of logging and accepting
    #[arg(long, env = "CMX_REJECT_ON_SECRET_MISMATCH")]
    pub reject_on_secret_mismatch: bool,

    /// Reject payloads whose version mismatches instead of logging and accepting
    #[arg(long, env = "CMX_REJECT_ON_VERSION_MISMATCH")]
    pub reject_on_version_mismatch: bool,

    /// Listen address
    #[arg(short = 'l', long = "listen", env = "CMX_LISTEN", default_value = "0.0.0.0")]
    pub listen: String,

    /// Listen port
    #[arg(short = 'p', long = "port", env = "CMX_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Base URL of the HTTP persistence sink; records stay in-process when unset
    #[arg(long = "sink-url", env = "CMX_SINK_URL")]
    pub sink_url: Option<String>,

    /// Sink request timeout in milliseconds
    #[arg(long = "sink-timeout-ms", env = "CMX_SINK_TIMEOUT_MS", default_value_t = 5000)]
    pub sink_timeout_ms: u64,
}

/// Process-wide configuration, set once at startup and immutable thereafter
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Token proving receiver identity on the handshake check
    pub validator_token: String,
    /// Secret each payload's `secret` field is compared against
    pub shared_secret: String,
    /// Schema version each payload's `version` field is compared against
    pub supported_version: String,
    /// Enforce the secret check instead of logging the mismatch
    pub reject_on_secret_mismatch: bool,
    /// Enforce the version check instead of logging the mismatch
    pub reject_on_version_mismatch: bool,
}

impl ReceiverConfig {
    /// Fold parsed flags into the immutable runtime configuration
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            validator_token: cli.validator.clone(),
            shared_secret: cli.secret.clone(),
            supported_version: cli.supported_version.clone(),
            reject_on_secret_mismatch: cli.reject_on_secret_mismatch,
            reject_on_version_mismatch: cli.reject_on_version_mismatch,
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            validator_token: DEFAULT_VALIDATOR.to_string(),
            shared_secret: DEFAULT_SECRET.to_string(),
            supported_version: DEFAULT_SUPPORTED_VERSION.to_string(),
            reject_on_secret_mismatch: false,
            reject_on_version_mismatch: false,
        }
    }
}
