//! Payload contracts for the CMX receiver
//!
//! Defines the data model shared by the ingestion pipeline, the persistence
//! sink, and the reporting consumer:
//!
//! - [`RawPayload`] - a structurally validated inbound envelope
//! - [`DeviceType`] - the classified observation source
//! - [`GeoFeature`] - the point-geometry wrapper attached to observations
//! - [`PersistedRecord`] - the redacted, enriched record handed to the sink
//!
//! The envelope is deliberately kept as a `serde_json::Value`: the sender
//! attaches vendor-specific metadata at every level, and the persisted record
//! must carry the full object verbatim. Typed views exist only for the fields
//! the pipeline actually inspects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReceiverError, Result};

/// Placeholder written over the `secret` field of every persisted record
pub const REDACTED_SECRET: &str = "hidden";

/// A structurally validated inbound envelope.
///
/// Construction guarantees the value is a JSON object carrying a `data`
/// object with an `observations` array. Everything else, including unknown
/// vendor metadata, is retained untouched for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload {
    value: Value,
}

impl RawPayload {
    /// Validate the envelope structure and wrap the value.
    ///
    /// Structural checks run before any field inspection: a body that is not
    /// a JSON object, lacks a `data` object, or lacks a `data.observations`
    /// array is rejected outright.
    pub fn from_value(value: Value) -> Result<Self> {
        let envelope = value
            .as_object()
            .ok_or_else(|| ReceiverError::malformed("payload body is not a JSON object"))?;

        let data = envelope
            .get("data")
            .ok_or_else(|| ReceiverError::malformed("payload has no 'data' key"))?;
        let data = data
            .as_object()
            .ok_or_else(|| ReceiverError::malformed("'data' is not an object"))?;

        let observations = data
            .get("observations")
            .ok_or_else(|| ReceiverError::malformed("'data' has no 'observations' key"))?;
        if !observations.is_array() {
            return Err(ReceiverError::malformed("'data.observations' is not an array"));
        }

        Ok(Self { value })
    }

    /// Parse and validate a raw request body.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Declared shared secret. `None` when absent or not a string.
    pub fn secret(&self) -> Option<&str> {
        self.value.get("secret").and_then(Value::as_str)
    }

    /// Declared schema version. `None` when absent or not a string.
    pub fn version(&self) -> Option<&str> {
        self.value.get("version").and_then(Value::as_str)
    }

    /// Declared payload type (`"DevicesSeen"` etc.). `None` when absent.
    pub fn payload_type(&self) -> Option<&str> {
        self.value.get("type").and_then(Value::as_str)
    }

    /// The observation sequence, in delivery order.
    pub fn observations(&self) -> &[Value] {
        self.value
            .get("data")
            .and_then(|d| d.get("observations"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of observations in the envelope.
    pub fn observation_count(&self) -> usize {
        self.observations().len()
    }

    /// Borrow the full envelope.
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Consume the wrapper, yielding the full envelope.
    pub fn into_value(self) -> Value {
        self.value
    }
}

/// Classified source of an observation batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    WiFiDevicesSeen,
    BluetoothDevicesSeen,
    Unknown,
}

impl DeviceType {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::WiFiDevicesSeen => "wifi_devices_seen",
            DeviceType::BluetoothDevicesSeen => "bluetooth_devices_seen",
            DeviceType::Unknown => "unknown",
        }
    }
}

/// Point-geometry wrapper attached to an enriched observation.
///
/// Serializes to the exact shape downstream geospatial tooling reads:
/// `{"type": "Feature", "geometry": {...}, "properties": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    #[serde(rename = "type")]
    pub feature_type: String,
    pub geometry: PointGeometry,
    pub properties: FeatureProperties,
}

/// Point geometry of a [`GeoFeature`].
///
/// `coordinates` hold `[lat, lng]` in that literal order - the ordering the
/// source feed produces and existing stored records depend on, even though
/// GeoJSON interchange specifies `[lng, lat]`. Preserved, not corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub geometry_type: String,
    pub coordinates: [f64; 2],
}

impl GeoFeature {
    /// The feature in wire shape, ready to attach to an observation
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "type": self.feature_type,
            "geometry": {
                "type": self.geometry.geometry_type,
                "coordinates": self.geometry.coordinates,
            },
            "properties": {
                "name": self.properties.name,
            },
        })
    }
}

/// Properties of a [`GeoFeature`]: the observed client identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub name: String,
}

/// The record handed to the persistence sink: the full payload object with
/// the secret redacted, a `geoJSON` feature attached per enriched
/// observation, and a `receivedAt` acceptance timestamp. Written exactly
/// once per accepted POST and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedRecord {
    value: Value,
}

impl PersistedRecord {
    /// Wrap an enriched envelope. Only the enricher builds these.
    pub(crate) fn new(value: Value) -> Self {
        Self { value }
    }

    /// Redacted secret field of the record.
    pub fn secret(&self) -> Option<&str> {
        self.value.get("secret").and_then(Value::as_str)
    }

    /// The record's observation sequence, in delivery order.
    pub fn observations(&self) -> &[Value] {
        self.value
            .get("data")
            .and_then(|d| d.get("observations"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Borrow the full record object.
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Consume the wrapper, yielding the full record object.
    pub fn into_value(self) -> Value {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_envelope() -> Value {
        json!({
            "secret": "s3cret",
            "version": "2.0",
            "type": "DevicesSeen",
            "data": {
                "apMac": "00:18:0a:aa:bb:cc",
                "observations": [
                    {"clientMac": "aa:bb:cc:dd:ee:01", "location": {"lat": 37.77, "lng": -122.41}}
                ]
            }
        })
    }

    #[test]
    fn test_valid_envelope_accepted() {
        let payload = RawPayload::from_value(valid_envelope()).unwrap();
        assert_eq!(payload.secret(), Some("s3cret"));
        assert_eq!(payload.version(), Some("2.0"));
        assert_eq!(payload.payload_type(), Some("DevicesSeen"));
        assert_eq!(payload.observation_count(), 1);
    }

    #[test]
    fn test_missing_data_rejected() {
        let err = RawPayload::from_value(json!({"notdata": {}})).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_missing_observations_rejected() {
        let err = RawPayload::from_value(json!({"data": {"apMac": "x"}})).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_non_array_observations_rejected() {
        let err = RawPayload::from_value(json!({"data": {"observations": "nope"}})).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_non_object_body_rejected() {
        assert!(RawPayload::from_value(json!([1, 2, 3])).is_err());
        assert!(RawPayload::from_value(json!("text")).is_err());
    }

    #[test]
    fn test_from_slice_rejects_non_json() {
        let err = RawPayload::from_slice(b"not json at all").unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_non_string_secret_reads_as_absent() {
        let payload = RawPayload::from_value(json!({
            "secret": 42,
            "data": {"observations": []}
        }))
        .unwrap();
        assert_eq!(payload.secret(), None);
    }

    #[test]
    fn test_device_type_labels() {
        assert_eq!(DeviceType::WiFiDevicesSeen.as_str(), "wifi_devices_seen");
        assert_eq!(DeviceType::BluetoothDevicesSeen.as_str(), "bluetooth_devices_seen");
        assert_eq!(DeviceType::Unknown.as_str(), "unknown");
    }

    #[test]
    fn test_geo_feature_wire_shape() {
        let feature = GeoFeature {
            feature_type: "Feature".to_string(),
            geometry: PointGeometry {
                geometry_type: "Point".to_string(),
                coordinates: [37.77, -122.41],
            },
            properties: FeatureProperties {
                name: "aa:bb:cc:dd:ee:01".to_string(),
            },
        };

        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["type"], "Feature");
        assert_eq!(json["geometry"]["type"], "Point");
        assert_eq!(json["geometry"]["coordinates"][0], 37.77);
        assert_eq!(json["geometry"]["coordinates"][1], -122.41);
        assert_eq!(json["properties"]["name"], "aa:bb:cc:dd:ee:01");
    }

    #[test]
    fn test_persisted_record_is_transparent() {
        let record = PersistedRecord::new(json!({"secret": REDACTED_SECRET, "data": {"observations": []}}));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["secret"], "hidden");
    }
}
