//! Great-circle geometry over recorded positions.
//!
//! Bearings are in degrees (0 = north, 90 = east); distances in meters.

use crate::core::{normalize_deg, GeoPos};

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Two positions closer than this are treated as coincident; a bearing
/// between them would be numeric noise.
pub const COINCIDENT_TOLERANCE_M: f64 = 0.01;

/// Initial great-circle bearing from `a` to `b` (forward azimuth).
///
/// Returns `None` when the points are coincident within tolerance; callers
/// hold their previous heading in that case rather than erroring.
pub fn initial_bearing_deg(a: &GeoPos, b: &GeoPos) -> Option<f64> {
    if ground_distance_m(a, b) < COINCIDENT_TOLERANCE_M {
        return None;
    }

    let lat1 = a.lat_deg.to_radians();
    let lat2 = b.lat_deg.to_radians();
    let dlon = (b.lon_deg - a.lon_deg).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    Some(normalize_deg(y.atan2(x).to_degrees()))
}

/// Haversine ground distance between two positions, ignoring altitude.
pub fn ground_distance_m(a: &GeoPos, b: &GeoPos) -> f64 {
    let lat1 = a.lat_deg.to_radians();
    let lat2 = b.lat_deg.to_radians();
    let dlat = (b.lat_deg - a.lat_deg).to_radians();
    let dlon = (b.lon_deg - a.lon_deg).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(lat: f64, lon: f64) -> GeoPos {
        GeoPos::new(lat, lon, 0.0)
    }

    #[test]
    fn test_cardinal_bearings() {
        let origin = pos(36.0, -115.0);
        // North
        let b = initial_bearing_deg(&origin, &pos(37.0, -115.0)).unwrap();
        assert!((b - 0.0).abs() < 0.1, "expected ~0°, got {b}°");
        // East
        let b = initial_bearing_deg(&origin, &pos(36.0, -114.0)).unwrap();
        assert!((b - 89.7).abs() < 0.5, "expected ~90°, got {b}°");
        // South
        let b = initial_bearing_deg(&origin, &pos(35.0, -115.0)).unwrap();
        assert!((b - 180.0).abs() < 0.1, "expected ~180°, got {b}°");
        // West
        let b = initial_bearing_deg(&origin, &pos(36.0, -116.0)).unwrap();
        assert!((b - 270.3).abs() < 0.5, "expected ~270°, got {b}°");
    }

    #[test]
    fn test_coincident_points_yield_no_bearing() {
        let p = pos(36.205, -115.19);
        assert!(initial_bearing_deg(&p, &p).is_none());
    }

    #[test]
    fn test_ground_distance() {
        // one degree of latitude is ~111.2 km
        let d = ground_distance_m(&pos(36.0, -115.0), &pos(37.0, -115.0));
        assert!((d - 111_195.0).abs() < 200.0, "got {d} m");
        assert_eq!(ground_distance_m(&pos(36.0, -115.0), &pos(36.0, -115.0)), 0.0);
    }
}
