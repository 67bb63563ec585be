//! Geometry builder
//!
//! Pure construction of the point feature attached to enriched observations.
//! Callers are responsible for having validated the inputs; this module
//! assumes numeric coordinates and a present client identifier.

use crate::contracts::{FeatureProperties, GeoFeature, PointGeometry};

/// Build the point feature for one observation.
///
/// Coordinates are emitted `[lat, lng]` - the source feed's ordering, which
/// existing stored records depend on. GeoJSON interchange specifies
/// `[lng, lat]`; the inversion is a known compatibility constraint and must
/// not be swapped.
pub fn point_feature(lat: f64, lng: f64, client_mac: &str) -> GeoFeature {
    GeoFeature {
        feature_type: "Feature".to_string(),
        geometry: PointGeometry {
            geometry_type: "Point".to_string(),
            coordinates: [lat, lng],
        },
        properties: FeatureProperties {
            name: client_mac.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_feature_shape() {
        let feature = point_feature(51.5074, -0.1278, "de:ad:be:ef:00:01");
        assert_eq!(feature.feature_type, "Feature");
        assert_eq!(feature.geometry.geometry_type, "Point");
        assert_eq!(feature.properties.name, "de:ad:be:ef:00:01");
    }

    #[test]
    fn test_latitude_first_ordering() {
        // lat=51.5, lng=-0.12: latitude must be coordinate 0.
        let feature = point_feature(51.5074, -0.1278, "mac");
        assert_eq!(feature.geometry.coordinates, [51.5074, -0.1278]);
    }

    #[test]
    fn test_distinct_inputs_distinct_features() {
        let a = point_feature(1.0, 2.0, "a");
        let b = point_feature(3.0, 4.0, "b");
        assert_ne!(a, b);
        assert_eq!(a, point_feature(1.0, 2.0, "a"));
    }
}
