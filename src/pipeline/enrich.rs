//! Observation enricher
//!
//! Transforms a validated envelope into the record handed to the persistence
//! sink: the secret is replaced with the redaction placeholder, an acceptance
//! timestamp is stamped, and every observation carrying a resolvable location
//! gets its own attached `geoJSON` feature.
//!
//! Enrichment is strictly per-element. Each observation owns its feature;
//! an observation without numeric `location.lat`/`location.lng` or without a
//! `clientMac` is skipped and counted, never aborting the batch.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::contracts::{PersistedRecord, RawPayload, REDACTED_SECRET};

use super::geometry::point_feature;

/// Per-batch enrichment accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentSummary {
    /// Observations present in the envelope
    pub observations: usize,
    /// Observations that received a feature
    pub enriched: usize,
    /// Observations skipped for missing or non-numeric location fields
    pub skipped: usize,
}

/// Enrich an envelope into its persisted form.
///
/// Consumes the payload: the returned record is the same object with the
/// secret redacted, `receivedAt` stamped, and per-observation features
/// attached where the location resolved.
pub fn enrich(payload: RawPayload) -> (PersistedRecord, EnrichmentSummary) {
    let mut value = payload.into_value();
    let mut summary = EnrichmentSummary::default();

    if let Some(envelope) = value.as_object_mut() {
        envelope.insert(
            "secret".to_string(),
            Value::String(REDACTED_SECRET.to_string()),
        );
        envelope.insert(
            "receivedAt".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
    }

    if let Some(observations) = value
        .get_mut("data")
        .and_then(|data| data.get_mut("observations"))
        .and_then(Value::as_array_mut)
    {
        summary.observations = observations.len();

        for (index, observation) in observations.iter_mut().enumerate() {
            let Some((lat, lng, client_mac)) = located_client(observation) else {
                summary.skipped += 1;
                tracing::debug!(index, "observation has no resolvable location; skipping enrichment");
                continue;
            };

            let feature = point_feature(lat, lng, &client_mac);
            if let Some(fields) = observation.as_object_mut() {
                fields.insert("geoJSON".to_string(), feature.to_value());
                summary.enriched += 1;
            } else {
                summary.skipped += 1;
                tracing::debug!(index, "observation is not an object; skipping enrichment");
            }
        }
    }

    (PersistedRecord::new(value), summary)
}

/// Extract the fields enrichment needs from one observation.
///
/// Returns `None` unless `location.lat` and `location.lng` are numeric and
/// `clientMac` is a string.
fn located_client(observation: &Value) -> Option<(f64, f64, String)> {
    let location = observation.get("location")?;
    let lat = location.get("lat").and_then(Value::as_f64)?;
    let lng = location.get("lng").and_then(Value::as_f64)?;
    let client_mac = observation.get("clientMac").and_then(Value::as_str)?;
    Some((lat, lng, client_mac.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn payload_with(observations: Vec<Value>) -> RawPayload {
        RawPayload::from_value(json!({
            "secret": "topsecret",
            "version": "2.0",
            "type": "DevicesSeen",
            "data": {
                "apMac": "00:18:0a:aa:bb:cc",
                "observations": observations
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_every_observation_gets_its_own_feature() {
        let (record, summary) = enrich(payload_with(vec![
            json!({"clientMac": "mac-1", "location": {"lat": 1.0, "lng": 10.0}}),
            json!({"clientMac": "mac-2", "location": {"lat": 2.0, "lng": 20.0}}),
            json!({"clientMac": "mac-3", "location": {"lat": 3.0, "lng": 30.0}}),
        ]));

        assert_eq!(summary.observations, 3);
        assert_eq!(summary.enriched, 3);
        assert_eq!(summary.skipped, 0);

        let observations = record.observations();
        for (i, observation) in observations.iter().enumerate() {
            let n = (i + 1) as f64;
            assert_eq!(
                observation["geoJSON"]["geometry"]["coordinates"],
                json!([n, n * 10.0])
            );
            assert_eq!(
                observation["geoJSON"]["properties"]["name"],
                format!("mac-{}", i + 1)
            );
        }
    }

    #[test]
    fn test_unlocated_observation_skipped_located_one_enriched() {
        // Observation 1 has no location at all; observation 2 must still get
        // a correctly attached feature of its own.
        let (record, summary) = enrich(payload_with(vec![
            json!({"clientMac": "mac-1"}),
            json!({"clientMac": "mac-2", "location": {"lat": 48.85, "lng": 2.35}}),
        ]));

        assert_eq!(summary.enriched, 1);
        assert_eq!(summary.skipped, 1);

        let observations = record.observations();
        assert!(observations[0].get("geoJSON").is_none());
        assert_eq!(
            observations[1]["geoJSON"]["geometry"]["coordinates"],
            json!([48.85, 2.35])
        );
        assert_eq!(observations[1]["geoJSON"]["properties"]["name"], "mac-2");
    }

    #[test]
    fn test_non_numeric_location_skipped() {
        let (record, summary) = enrich(payload_with(vec![json!({
            "clientMac": "mac-1",
            "location": {"lat": "not-a-number", "lng": 2.35}
        })]));

        assert_eq!(summary.enriched, 0);
        assert_eq!(summary.skipped, 1);
        assert!(record.observations()[0].get("geoJSON").is_none());
    }

    #[test]
    fn test_missing_client_mac_skipped() {
        let (_, summary) = enrich(payload_with(vec![json!({
            "location": {"lat": 1.0, "lng": 2.0}
        })]));
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_secret_redacted_and_receipt_stamped() {
        let (record, _) = enrich(payload_with(vec![]));
        assert_eq!(record.secret(), Some(REDACTED_SECRET));
        assert!(record.as_value().get("receivedAt").is_some());
    }

    #[test]
    fn test_vendor_metadata_preserved() {
        let (record, _) = enrich(payload_with(vec![json!({
            "clientMac": "mac-1",
            "seenEpoch": 1713012345,
            "rssi": -67,
            "location": {"lat": 1.0, "lng": 2.0, "unc": 12.3}
        })]));

        let value = record.as_value();
        assert_eq!(value["version"], "2.0");
        assert_eq!(value["data"]["apMac"], "00:18:0a:aa:bb:cc");

        let observation = &record.observations()[0];
        assert_eq!(observation["seenEpoch"], 1713012345);
        assert_eq!(observation["rssi"], -67);
        assert_eq!(observation["location"]["unc"], 12.3);
    }

    #[test]
    fn test_empty_batch_is_fine() {
        let (record, summary) = enrich(payload_with(vec![]));
        assert_eq!(summary, EnrichmentSummary::default());
        assert!(record.observations().is_empty());
    }

    proptest! {
        #[test]
        fn prop_enrichment_preserves_count_and_literal_ordering(
            coords in proptest::collection::vec((-90.0f64..90.0, -180.0f64..180.0), 0..16)
        ) {
            let observations: Vec<Value> = coords
                .iter()
                .enumerate()
                .map(|(i, (lat, lng))| {
                    json!({"clientMac": format!("mac-{i}"), "location": {"lat": lat, "lng": lng}})
                })
                .collect();

            let (record, summary) = enrich(payload_with(observations));

            prop_assert_eq!(summary.observations, coords.len());
            prop_assert_eq!(summary.enriched, coords.len());
            prop_assert_eq!(record.observations().len(), coords.len());

            for (i, observation) in record.observations().iter().enumerate() {
                let feature = &observation["geoJSON"];
                // Latitude first: the feed's ordering, not GeoJSON's.
                prop_assert_eq!(feature["geometry"]["coordinates"][0].as_f64(), Some(coords[i].0));
                prop_assert_eq!(feature["geometry"]["coordinates"][1].as_f64(), Some(coords[i].1));
                let expected_name = format!("mac-{i}");
                prop_assert_eq!(
                    feature["properties"]["name"].as_str(),
                    Some(expected_name.as_str())
                );
            }
        }
    }
}
