//! Great-circle distance on a spherical Earth

/// Mean Earth radius used by the haversine formula, in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two points given in degrees.
///
/// Coordinates are not range-checked; out-of-range input yields a defined but
/// meaningless result.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_one_km_along_equator() {
        let d = haversine_distance(0.0, 0.0, 0.0, 0.008983);
        assert!((d - 1000.0).abs() < 2.0, "got {d}");
    }

    #[test]
    fn test_known_city_pair() {
        // São Paulo to Rio de Janeiro, roughly 360 km
        let d = haversine_distance(-23.5505, -46.6333, -22.9068, -43.1729);
        assert!((d / 1000.0 - 360.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn test_antipodal_points() {
        let d = haversine_distance(0.0, 0.0, 0.0, 180.0);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn test_distance_is_symmetric(
            lat1 in -90.0f64..90.0,
            lon1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0,
            lon2 in -180.0f64..180.0,
        ) {
            let ab = haversine_distance(lat1, lon1, lat2, lon2);
            let ba = haversine_distance(lat2, lon2, lat1, lon1);
            prop_assert!((ab - ba).abs() <= 1e-6 * ab.max(1.0));
        }

        #[test]
        fn test_distance_to_self_is_zero(
            lat in -90.0f64..90.0,
            lon in -180.0f64..180.0,
        ) {
            prop_assert_eq!(haversine_distance(lat, lon, lat, lon), 0.0);
        }

        #[test]
        fn test_distance_is_non_negative(
            lat1 in -90.0f64..90.0,
            lon1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0,
            lon2 in -180.0f64..180.0,
        ) {
            prop_assert!(haversine_distance(lat1, lon1, lat2, lon2) >= 0.0);
        }
    }
}
