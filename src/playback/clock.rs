use chrono::{DateTime, Duration, Utc};
use std::time::Duration as StdDuration;

use crate::playback::PlaybackState;

/// Fastest forward playback rate.
pub const MAX_SPEED: f64 = 30.0;

/// Fastest reverse playback rate.
pub const MIN_SPEED: f64 = -30.0;

/// Rates within this distance of 1.0 snap to exactly 1.0, so near-realtime
/// playback stays locked to realtime instead of slowly drifting.
pub const SNAP_RANGE: f64 = 0.3;

/// Simulation clock governor for the replay session.
///
/// Three rules are re-established every time the clock is touched, in
/// precedence order: bounds clamp, rate hard-limit, rate snap-to-1x.
/// Nothing here ever fails; out-of-range input is silently clamped.
pub struct PlaybackClock {
    current: DateTime<Utc>,
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
    multiplier: f64,
    state: PlaybackState,
}

impl PlaybackClock {
    /// Create a clock spanning `[start, stop]`, positioned at `start`,
    /// paused, at 1x.
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        let stop = stop.max(start);
        Self {
            current: start,
            start,
            stop,
            multiplier: 1.0,
            state: PlaybackState::Paused,
        }
    }

    pub fn current(&self) -> DateTime<Utc> {
        self.current
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn stop_time(&self) -> DateTime<Utc> {
        self.stop
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Paused;
    }

    pub fn toggle(&mut self) {
        self.state = match self.state {
            PlaybackState::Playing => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Playing,
        };
    }

    /// Set the playback rate; clamped to [-30, 30] and snapped to exactly
    /// 1.0 when within `SNAP_RANGE` of it. Non-finite input is ignored.
    pub fn set_multiplier(&mut self, multiplier: f64) {
        if !multiplier.is_finite() {
            return;
        }
        self.multiplier = multiplier;
        self.govern();
    }

    /// Jump the clock to `t`, clamped into `[start, stop]`.
    pub fn seek(&mut self, t: DateTime<Utc>) {
        self.current = t;
        self.govern();
    }

    /// Advance by a real-time frame delta scaled by the multiplier.
    /// Hitting either bound clamps but never pauses.
    pub fn advance(&mut self, real_dt: StdDuration) {
        if self.state.is_playing() {
            let sim_ms = real_dt.as_secs_f64() * self.multiplier * 1000.0;
            self.current += Duration::milliseconds(sim_ms.round() as i64);
        }
        self.govern();
    }

    /// Fraction of the session elapsed, in [0, 1].
    pub fn progress(&self) -> f64 {
        let total = (self.stop - self.start).num_milliseconds();
        if total <= 0 {
            return 0.0;
        }
        (self.current - self.start).num_milliseconds() as f64 / total as f64
    }

    fn govern(&mut self) {
        // 1. bounds clamp
        if self.current < self.start {
            self.current = self.start;
        } else if self.current > self.stop {
            self.current = self.stop;
        }
        // 2. rate hard-limit
        self.multiplier = self.multiplier.clamp(MIN_SPEED, MAX_SPEED);
        // 3. rate magnetism
        if (self.multiplier - 1.0).abs() < SNAP_RANGE {
            self.multiplier = 1.0;
        }
    }
}
