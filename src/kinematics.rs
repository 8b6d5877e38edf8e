//! Derived heading and bank angle for entities with no recorded attitude.
//!
//! Both quantities come straight from the position track: heading as the
//! forward azimuth over a short lookback, bank from the turn rate implied by
//! three consecutive positions. Neither predicts anything; they only read
//! recorded history.

use chrono::{DateTime, Duration, Utc};

use crate::core::{wrap_signed_deg, GeoPos, Track};
use crate::geo;

/// Standard gravity, m/s².
const G_MPS2: f64 = 9.80665;

/// Lookback used when deriving heading from the position track.
const HEADING_LOOKBACK_SECS: i64 = 2;

/// Turn rates below this are treated as straight flight.
const TURN_RATE_EPS_DEG_S: f64 = 0.01;

/// Ground speeds below this give no usable bearing geometry.
const MIN_SPEED_MPS: f64 = 1.0;

/// Half-spacing of the three-point bank stencil.
const BANK_STENCIL_SECS: i64 = 1;

/// Exponential smoothing factor applied to the bank estimate across ticks.
const BANK_SMOOTHING_ALPHA: f64 = 0.2;

/// Heading derived from a position track, holding the last good value when
/// the aircraft is stationary between the two sample points.
#[derive(Debug, Default)]
pub struct DerivedHeading {
    last_deg: Option<f64>,
}

impl DerivedHeading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Heading at `t`, from the position ~2 s earlier to the position at `t`.
    ///
    /// Coincident endpoints hold the previously derived heading; `None` only
    /// before any heading has ever been derived.
    pub fn heading_at(&mut self, track: &Track<GeoPos>, t: DateTime<Utc>) -> Option<f64> {
        let now = track.sample_at(t)?;
        let prev = track.sample_at(t - Duration::seconds(HEADING_LOOKBACK_SECS))?;

        if let Some(bearing) = geo::initial_bearing_deg(&prev, &now) {
            self.last_deg = Some(bearing);
        }
        self.last_deg
    }

    pub fn reset(&mut self) {
        self.last_deg = None;
    }
}

/// Bank angle from three chronological positions spaced `dt` seconds apart.
///
/// Returns 0 for straight flight or insufficient motion; never NaN/∞.
pub fn bank_from_positions(p0: &GeoPos, p1: &GeoPos, p2: &GeoPos, dt_secs: f64) -> f64 {
    if dt_secs <= 0.0 {
        return 0.0;
    }

    let (Some(h01), Some(h12)) = (
        geo::initial_bearing_deg(p0, p1),
        geo::initial_bearing_deg(p1, p2),
    ) else {
        return 0.0;
    };

    let omega_deg_s = wrap_signed_deg(h12 - h01) / (2.0 * dt_secs);
    let speed_mps = geo::ground_distance_m(p0, p2) / (2.0 * dt_secs);

    if omega_deg_s.abs() < TURN_RATE_EPS_DEG_S || speed_mps < MIN_SPEED_MPS {
        return 0.0;
    }

    // turn radius r = v/ω, so v²/(g·r) reduces to v·ω/g
    let omega_rad_s = omega_deg_s.to_radians();
    let bank = (speed_mps * omega_rad_s.abs() / G_MPS2).atan().to_degrees();
    bank * omega_deg_s.signum()
}

/// Tick-to-tick bank estimator with exponential smoothing to suppress
/// sample noise. State persists across ticks and is reset only when the
/// owning entity is unloaded.
#[derive(Debug, Default)]
pub struct BankEstimator {
    smoothed_deg: Option<f64>,
}

impl BankEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smoothed bank estimate at `t`, sampling the track one stencil step
    /// either side of the query time.
    pub fn bank_at(&mut self, track: &Track<GeoPos>, t: DateTime<Utc>) -> Option<f64> {
        let dt = Duration::seconds(BANK_STENCIL_SECS);
        let p0 = track.sample_at(t - dt)?;
        let p1 = track.sample_at(t)?;
        let p2 = track.sample_at(t + dt)?;

        let raw = bank_from_positions(&p0, &p1, &p2, BANK_STENCIL_SECS as f64);
        let smoothed = match self.smoothed_deg {
            Some(prev) => prev + BANK_SMOOTHING_ALPHA * (raw - prev),
            None => raw,
        };
        self.smoothed_deg = Some(smoothed);
        Some(smoothed)
    }

    pub fn reset(&mut self) {
        self.smoothed_deg = None;
    }
}
