//! Per-aircraft state: recorded tracks, availability, trail, and the
//! derived-kinematics fallback used when no attitude channel was recorded.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::core::{Attitude, GeoPos, Track};
use crate::kinematics::{BankEstimator, DerivedHeading};
use crate::trail::TrailBuffer;

/// Discrete instrument channels, queried with step-hold semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    GroundSpeed,
    Cas,
    Bank,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::GroundSpeed => "Groundspeed",
            Channel::Cas => "CAS",
            Channel::Bank => "Bank",
        }
    }

    pub fn all() -> &'static [Channel] {
        &[Channel::GroundSpeed, Channel::Cas, Channel::Bank]
    }
}

/// One recorded aircraft.
pub struct Entity {
    id: String,
    position: Track<GeoPos>,
    attitude: Option<Track<Attitude>>,
    instruments: HashMap<Channel, Track<f64>>,
    /// Outside this interval the entity is absent (e.g. post-collision).
    availability: Option<(DateTime<Utc>, DateTime<Utc>)>,
    trail: TrailBuffer,
    derived_heading: DerivedHeading,
    bank_estimator: BankEstimator,
    /// Derived attitude cached at the last tick; queries between ticks read
    /// this instead of advancing the smoother.
    derived_attitude: Option<Attitude>,
}

impl Entity {
    pub fn new(id: impl Into<String>, position: Track<GeoPos>) -> Self {
        Self {
            id: id.into(),
            position,
            attitude: None,
            instruments: HashMap::new(),
            availability: None,
            trail: TrailBuffer::new(),
            derived_heading: DerivedHeading::new(),
            bank_estimator: BankEstimator::new(),
            derived_attitude: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_attitude(&mut self, track: Track<Attitude>) {
        self.attitude = Some(track);
    }

    pub fn set_instrument(&mut self, channel: Channel, track: Track<f64>) {
        self.instruments.insert(channel, track);
    }

    pub fn set_availability(&mut self, start: DateTime<Utc>, stop: DateTime<Utc>) {
        self.availability = Some((start, stop.max(start)));
    }

    pub fn position_track(&self) -> &Track<GeoPos> {
        &self.position
    }

    pub fn trail(&self) -> &TrailBuffer {
        &self.trail
    }

    pub fn trail_mut(&mut self) -> &mut TrailBuffer {
        &mut self.trail
    }

    /// Whether the entity exists in the scene at `t`.
    pub fn is_present(&self, t: DateTime<Utc>) -> bool {
        match self.availability {
            Some((start, stop)) => t >= start && t <= stop,
            None => true,
        }
    }

    /// Interpolated position at `t`; `None` when absent or without data.
    pub fn position_at(&self, t: DateTime<Utc>) -> Option<GeoPos> {
        if !self.is_present(t) {
            return None;
        }
        self.position.sample_at(t)
    }

    /// Attitude at `t`: recorded track when one exists, otherwise the
    /// derived heading/bank cached at the last tick.
    pub fn orientation_at(&self, t: DateTime<Utc>) -> Option<Attitude> {
        if !self.is_present(t) {
            return None;
        }
        match &self.attitude {
            Some(track) => track.sample_at(t),
            None => self.derived_attitude,
        }
    }

    /// Step-hold instrument value at `t`.
    pub fn instrument_at(&self, channel: Channel, t: DateTime<Utc>) -> Option<f64> {
        if !self.is_present(t) {
            return None;
        }
        self.instruments.get(&channel)?.hold_at(t)
    }

    /// Per-tick mutation: trail history and, for entities without a recorded
    /// attitude channel, the derived-kinematics state.
    pub fn tick(&mut self, now: DateTime<Utc>, history_enabled: bool) {
        if !self.is_present(now) {
            return;
        }

        if history_enabled {
            self.trail.update(&self.position, now);
        }

        if self.attitude.is_none() {
            let heading = self.derived_heading.heading_at(&self.position, now);
            let bank = self.bank_estimator.bank_at(&self.position, now);
            self.derived_attitude = heading.map(|h| {
                Attitude::new(h, 0.0, bank.unwrap_or(0.0))
            });
        }
    }

    /// Drop all transient state; called when the entity is unloaded.
    pub fn reset(&mut self) {
        self.trail.clear();
        self.derived_heading.reset();
        self.bank_estimator.reset();
        self.derived_attitude = None;
    }
}

/// Display configuration for one entity (trail color, model yaw offset).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayConfig {
    pub color: [f32; 4],
    pub model_yaw_offset_deg: f64,
}

/// Fixed trail-color palette cycled through for unconfigured entities.
const PALETTE: [[f32; 4]; 6] = [
    [1.0, 0.85, 0.1, 1.0], // amber
    [0.2, 0.8, 1.0, 1.0],  // cyan
    [1.0, 0.3, 0.3, 1.0],  // red
    [0.4, 1.0, 0.4, 1.0],  // green
    [0.8, 0.5, 1.0, 1.0],  // violet
    [1.0, 0.6, 0.2, 1.0],  // orange
];

/// Typed per-entity display table with a deterministic fallback: an unknown
/// entity gets the next unused palette color, in insertion order.
#[derive(Debug, Default)]
pub struct DisplayTable {
    assigned: Vec<(String, DisplayConfig)>,
}

impl DisplayTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicitly configure an entity, replacing any earlier assignment.
    pub fn set(&mut self, id: impl Into<String>, config: DisplayConfig) {
        let id = id.into();
        if let Some(slot) = self.assigned.iter_mut().find(|(k, _)| *k == id) {
            slot.1 = config;
        } else {
            self.assigned.push((id, config));
        }
    }

    /// Config for `id`, assigning the next unused palette color on first use.
    pub fn config_for(&mut self, id: &str) -> DisplayConfig {
        if let Some((_, config)) = self.assigned.iter().find(|(k, _)| k == id) {
            return *config;
        }
        let config = DisplayConfig {
            color: PALETTE[self.assigned.len() % PALETTE.len()],
            model_yaw_offset_deg: 0.0,
        };
        self.assigned.push((id.to_string(), config));
        config
    }
}
