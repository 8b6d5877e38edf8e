//! Bounded trailing history of positions, consistent under scrubbing.
//!
//! The trail is what the rendering layer draws as the recent-path polyline
//! behind each aircraft. It must stay coherent when the user scrubs the
//! clock backwards, so any backward jump in observed query time clears it.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::core::{GeoPos, Track};

/// Default trailing window, seconds.
pub const DEFAULT_WINDOW_SECS: u64 = 30;

/// Configurable window bounds, seconds.
pub const MIN_WINDOW_SECS: u64 = 5;
pub const MAX_WINDOW_SECS: u64 = 300;

/// Per-entity sliding-window position history.
#[derive(Debug)]
pub struct TrailBuffer {
    entries: VecDeque<(DateTime<Utc>, GeoPos)>,
    window: Duration,
    last_seen: Option<DateTime<Utc>>,
}

impl Default for TrailBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TrailBuffer {
    pub fn new() -> Self {
        Self::with_window_secs(DEFAULT_WINDOW_SECS)
    }

    /// Create with a specific window; out-of-range values are clamped.
    pub fn with_window_secs(secs: u64) -> Self {
        let mut buffer = Self {
            entries: VecDeque::new(),
            window: Duration::seconds(DEFAULT_WINDOW_SECS as i64),
            last_seen: None,
        };
        buffer.set_window_secs(secs);
        buffer
    }

    /// Change the trailing window, clamped to [5, 300] seconds.
    pub fn set_window_secs(&mut self, secs: u64) {
        let secs = secs.clamp(MIN_WINDOW_SECS, MAX_WINDOW_SECS);
        self.window = Duration::seconds(secs as i64);
    }

    pub fn window_secs(&self) -> u64 {
        self.window.num_seconds() as u64
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advance the trail to `now`, sampling the entity's position track.
    ///
    /// Scrubbing backwards (observed `now` earlier than the previous one)
    /// clears the buffer before the new sample is appended. A repeated tick
    /// at an identical `now` appends nothing.
    pub fn update(&mut self, track: &Track<GeoPos>, now: DateTime<Utc>) {
        let Some(pos) = track.sample_at(now) else {
            return;
        };

        if let Some(last_seen) = self.last_seen {
            if now < last_seen {
                self.entries.clear();
            }
        }
        self.last_seen = Some(now);

        let is_newer = self
            .entries
            .back()
            .map(|(t, _)| now > *t)
            .unwrap_or(true);
        if is_newer {
            self.entries.push_back((now, pos));
        }

        let cutoff = now - self.window;
        while let Some((t, _)) = self.entries.front() {
            if *t < cutoff {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    /// Clear all history (scrub reset or history toggled off).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_seen = None;
    }

    /// The pruned position sequence, oldest first. Empty is a valid result.
    pub fn path(&self) -> Vec<GeoPos> {
        self.entries.iter().map(|(_, p)| *p).collect()
    }

    /// Timestamped entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &(DateTime<Utc>, GeoPos)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Sample;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_658_084_400 + secs, 0).unwrap()
    }

    fn straight_track() -> Track<GeoPos> {
        Track::build(vec![
            Sample::new(t(0), GeoPos::new(36.0, -115.0, 2000.0)),
            Sample::new(t(600), GeoPos::new(36.5, -115.0, 2000.0)),
        ])
    }

    #[test]
    fn test_append_and_prune() {
        let track = straight_track();
        let mut trail = TrailBuffer::with_window_secs(30);

        for s in 0..40 {
            trail.update(&track, t(s));
        }
        // entries older than 30 s behind the last tick are pruned
        assert_eq!(trail.len(), 31);
        assert_eq!(trail.entries().next().unwrap().0, t(9));
    }

    #[test]
    fn test_idempotent_retick() {
        let track = straight_track();
        let mut trail = TrailBuffer::new();

        trail.update(&track, t(10));
        trail.update(&track, t(10));
        trail.update(&track, t(10));
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn test_scrub_backward_clears() {
        let track = straight_track();
        let mut trail = TrailBuffer::new();

        trail.update(&track, t(10));
        trail.update(&track, t(11));
        trail.update(&track, t(12));
        assert_eq!(trail.len(), 3);

        // scrub back: buffer restarts from the new time
        trail.update(&track, t(5));
        assert_eq!(trail.len(), 1);
        assert_eq!(trail.entries().next().unwrap().0, t(5));
    }

    #[test]
    fn test_empty_track_is_noop() {
        let track: Track<GeoPos> = Track::build(Vec::new());
        let mut trail = TrailBuffer::new();
        trail.update(&track, t(10));
        assert!(trail.is_empty());
        assert!(trail.path().is_empty());
    }

    #[test]
    fn test_window_clamping() {
        let mut trail = TrailBuffer::with_window_secs(1);
        assert_eq!(trail.window_secs(), MIN_WINDOW_SECS);
        trail.set_window_secs(10_000);
        assert_eq!(trail.window_secs(), MAX_WINDOW_SECS);
        trail.set_window_secs(60);
        assert_eq!(trail.window_secs(), 60);
    }

    #[test]
    fn test_path_ordering() {
        let track = straight_track();
        let mut trail = TrailBuffer::new();
        for s in [1, 2, 3] {
            trail.update(&track, t(s));
        }
        let path = trail.path();
        assert_eq!(path.len(), 3);
        assert!(path[0].lat_deg < path[2].lat_deg);
    }
}
