//! Payload classifier
//!
//! Maps the envelope's declared `type` onto a [`DeviceType`]. Purely
//! informational: every class, including unrecognized values, proceeds
//! identically through enrichment and persistence.

use crate::contracts::DeviceType;

/// Classify the declared payload type.
///
/// Unrecognized or absent values map to [`DeviceType::Unknown`] rather than
/// failing; the result is a diagnostic, not a gate.
pub fn classify(payload_type: Option<&str>) -> DeviceType {
    match payload_type {
        Some("DevicesSeen") => DeviceType::WiFiDevicesSeen,
        Some("BluetoothDevicesSeen") => DeviceType::BluetoothDevicesSeen,
        Some(other) => {
            tracing::warn!(payload_type = other, "unknown observation device type");
            DeviceType::Unknown
        }
        None => {
            tracing::warn!("payload carries no 'type' field");
            DeviceType::Unknown
        }
    }
}
