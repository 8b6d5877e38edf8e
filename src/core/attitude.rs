//! Attitude samples and circular heading interpolation.
//!
//! Heading is a circular quantity in [0, 360); interpolating it naively
//! produces a spurious 360° flip whenever a track crosses the north boundary
//! between samples. Interpolation here always takes the shorter arc.

use serde::{Deserialize, Serialize};

use crate::core::sample::{Lerp, TrackValue};

/// Recorded aircraft attitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    pub heading_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
}

impl Attitude {
    pub fn new(heading_deg: f64, pitch_deg: f64, roll_deg: f64) -> Self {
        Self { heading_deg, pitch_deg, roll_deg }
    }
}

impl Lerp for Attitude {
    fn lerp(&self, other: &Self, f: f64) -> Self {
        Self {
            heading_deg: interp_heading_deg(self.heading_deg, other.heading_deg, f),
            // pitch and roll are bounded, non-circular in this domain
            pitch_deg: self.pitch_deg.lerp(&other.pitch_deg, f),
            roll_deg: self.roll_deg.lerp(&other.roll_deg, f),
        }
    }
}

impl TrackValue for Attitude {
    fn is_valid(&self) -> bool {
        self.heading_deg.is_finite() && self.pitch_deg.is_finite() && self.roll_deg.is_finite()
    }
}

/// Normalize an angle into [0, 360).
pub fn normalize_deg(deg: f64) -> f64 {
    let d = deg % 360.0;
    if d < 0.0 { d + 360.0 } else { d }
}

/// Wrap an angular difference into (-180, 180].
pub fn wrap_signed_deg(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

/// Interpolate between two headings along the shorter arc.
pub fn interp_heading_deg(h0: f64, h1: f64, f: f64) -> f64 {
    let h0 = normalize_deg(h0);
    let h1 = normalize_deg(h1);
    let diff = wrap_signed_deg(h1 - h0);
    normalize_deg(h0 + diff * f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_deg(0.0), 0.0);
        assert_eq!(normalize_deg(360.0), 0.0);
        assert_eq!(normalize_deg(-10.0), 350.0);
        assert_eq!(normalize_deg(725.0), 5.0);
    }

    #[test]
    fn test_wrap_signed() {
        assert_eq!(wrap_signed_deg(190.0), -170.0);
        assert_eq!(wrap_signed_deg(-190.0), 170.0);
        assert_eq!(wrap_signed_deg(180.0), 180.0);
        assert_eq!(wrap_signed_deg(20.0), 20.0);
    }

    #[test]
    fn test_heading_wraparound_through_north() {
        // shortest path from 350 to 10 passes through 0, not 180
        assert_eq!(interp_heading_deg(350.0, 10.0, 0.5), 0.0);
        assert_eq!(interp_heading_deg(10.0, 350.0, 0.5), 0.0);
        assert_eq!(interp_heading_deg(350.0, 10.0, 0.25), 355.0);
        assert_eq!(interp_heading_deg(350.0, 10.0, 0.75), 5.0);
    }

    #[test]
    fn test_heading_no_wrap_needed() {
        assert_eq!(interp_heading_deg(90.0, 100.0, 0.5), 95.0);
    }

    #[test]
    fn test_attitude_lerp() {
        let a = Attitude::new(350.0, -2.0, 10.0);
        let b = Attitude::new(10.0, 2.0, 20.0);
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.heading_deg, 0.0);
        assert_eq!(mid.pitch_deg, 0.0);
        assert_eq!(mid.roll_deg, 15.0);
    }
}
