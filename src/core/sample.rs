use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A single timestamped value in a track.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Sample<T> {
    /// Timestamp in UTC
    pub time: DateTime<Utc>,

    /// Recorded value at that instant
    pub value: T,
}

impl<T> Sample<T> {
    pub fn new(time: DateTime<Utc>, value: T) -> Self {
        Self { time, value }
    }
}

/// Linear interpolation between two values of the same kind.
///
/// `f` is the fractional position in [0, 1]; implementations must return
/// `self` at `f = 0` and `other` at `f = 1`.
pub trait Lerp {
    fn lerp(&self, other: &Self, f: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(&self, other: &Self, f: f64) -> Self {
        self + (other - self) * f
    }
}

/// Validity check applied when a track is built: records carrying NaN or
/// infinite fields are dropped rather than stored.
pub trait TrackValue: Clone {
    fn is_valid(&self) -> bool;
}

impl TrackValue for f64 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

/// A geodetic position: degrees for lat/lon, feet MSL for altitude
/// (matching the recorded source data).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPos {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_ft: f64,
}

impl GeoPos {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_ft: f64) -> Self {
        Self { lat_deg, lon_deg, alt_ft }
    }

    /// Altitude in meters, for kinematics that work in SI units.
    pub fn alt_m(&self) -> f64 {
        self.alt_ft * 0.3048
    }
}

impl Lerp for GeoPos {
    fn lerp(&self, other: &Self, f: f64) -> Self {
        Self {
            lat_deg: self.lat_deg.lerp(&other.lat_deg, f),
            lon_deg: self.lon_deg.lerp(&other.lon_deg, f),
            alt_ft: self.alt_ft.lerp(&other.alt_ft, f),
        }
    }
}

impl TrackValue for GeoPos {
    fn is_valid(&self) -> bool {
        self.lat_deg.is_finite() && self.lon_deg.is_finite() && self.alt_ft.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_lerp() {
        assert_eq!(0.0f64.lerp(&10.0, 0.5), 5.0);
        assert_eq!(0.0f64.lerp(&10.0, 0.0), 0.0);
        assert_eq!(0.0f64.lerp(&10.0, 1.0), 10.0);
    }

    #[test]
    fn test_geopos_lerp() {
        let a = GeoPos::new(36.0, -115.0, 2000.0);
        let b = GeoPos::new(37.0, -116.0, 3000.0);
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.lat_deg, 36.5);
        assert_eq!(mid.lon_deg, -115.5);
        assert_eq!(mid.alt_ft, 2500.0);
    }

    #[test]
    fn test_validity() {
        assert!(GeoPos::new(36.0, -115.0, 2000.0).is_valid());
        assert!(!GeoPos::new(f64::NAN, -115.0, 2000.0).is_valid());
        assert!(!GeoPos::new(36.0, f64::INFINITY, 2000.0).is_valid());
        assert!(!f64::NAN.is_valid());
    }
}
