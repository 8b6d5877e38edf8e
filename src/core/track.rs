use chrono::{DateTime, Utc};
use tracing::debug;

use crate::core::sample::{Lerp, Sample, TrackValue};

/// An immutable time series for one (entity, channel) pair.
///
/// Samples are sorted ascending by timestamp exactly once at build time and
/// never re-sorted per query; timestamps are strictly increasing after
/// construction (duplicates are dropped).
#[derive(Debug, Clone)]
pub struct Track<T> {
    samples: Vec<Sample<T>>,
    dropped: usize,
}

impl<T: TrackValue> Track<T> {
    /// Build a track from raw records.
    ///
    /// Records with non-finite numeric fields are dropped, as are records
    /// sharing a timestamp with an earlier one. Dropped records are counted
    /// but never fatal.
    pub fn build(records: Vec<Sample<T>>) -> Self {
        let raw = records.len();
        let mut samples = records;
        samples.retain(|s| s.value.is_valid());
        samples.sort_by(|a, b| a.time.cmp(&b.time));
        samples.dedup_by(|b, a| a.time == b.time);

        let dropped = raw - samples.len();
        if dropped > 0 {
            debug!("track build dropped {} of {} records", dropped, raw);
        }

        Self { samples, dropped }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Number of records rejected at build time.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.samples.first().map(|s| s.time)
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.samples.last().map(|s| s.time)
    }

    pub fn samples(&self) -> &[Sample<T>] {
        &self.samples
    }

    /// Step-hold query: the value of the latest sample at or before `t`.
    ///
    /// Returns `None` if the track is empty or `t` precedes the first sample.
    /// Used for discrete instrument channels (groundspeed, CAS, bank).
    pub fn hold_at(&self, t: DateTime<Utc>) -> Option<T> {
        let n = self.samples.partition_point(|s| s.time <= t);
        if n == 0 {
            return None;
        }
        Some(self.samples[n - 1].value.clone())
    }
}

impl<T: TrackValue + Lerp> Track<T> {
    /// Continuous query: linear interpolation between the bracketing pair,
    /// clamping to the first/last value outside the track's span.
    ///
    /// Returns `None` only for an empty track; never panics.
    pub fn sample_at(&self, t: DateTime<Utc>) -> Option<T> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;

        if t <= first.time {
            return Some(first.value.clone());
        }
        if t >= last.time {
            return Some(last.value.clone());
        }

        // First index whose timestamp exceeds t; t < last.time guarantees
        // hi is in range and lo = hi - 1 satisfies lo.time <= t < hi.time.
        let hi = self.samples.partition_point(|s| s.time <= t);
        let lo = &self.samples[hi - 1];
        let hi = &self.samples[hi];

        let span_ms = (hi.time - lo.time).num_milliseconds();
        let f = if span_ms > 0 {
            (t - lo.time).num_milliseconds() as f64 / span_ms as f64
        } else {
            0.0
        };

        Some(lo.value.lerp(&hi.value, f))
    }
}
