//! The replay session object.
//!
//! One `ReplayEngine` is constructed per simulation run and owns every piece
//! of mutable replay state: entities, the playback clock, the audio session,
//! history settings, and the tick subscriber list. There is no ambient global
//! state; the rendering layer holds a handle and calls the query methods with
//! the same time value the tick used.

use chrono::{DateTime, Utc};
use std::time::{Duration as StdDuration, Instant};
use tracing::{debug, info};

use crate::audio::AudioSync;
use crate::core::{Attitude, GeoPos};
use crate::entity::{Channel, DisplayConfig, DisplayTable, Entity};
use crate::playback::PlaybackClock;
use crate::trail;

/// Tick subscriber: invoked synchronously, in subscription order, once per
/// frame signal with the tick's simulation time.
pub type TickSubscriber = Box<dyn FnMut(DateTime<Utc>)>;

pub struct ReplayEngine {
    entities: Vec<Entity>,
    clock: PlaybackClock,
    audio: Option<AudioSync>,
    display: DisplayTable,
    history_enabled: bool,
    history_window_secs: u64,
    subscribers: Vec<TickSubscriber>,
    /// Wall-clock instant of the previous tick; the audio sink advances in
    /// real time, so its drift model needs the real frame delta.
    last_tick: Option<Instant>,
}

impl ReplayEngine {
    /// Create a session spanning `[start, stop]`.
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        Self {
            entities: Vec::new(),
            clock: PlaybackClock::new(start, stop),
            audio: None,
            display: DisplayTable::new(),
            history_enabled: true,
            history_window_secs: trail::DEFAULT_WINDOW_SECS,
            subscribers: Vec::new(),
            last_tick: None,
        }
    }

    pub fn add_entity(&mut self, mut entity: Entity) {
        info!("loaded entity {} ({} position samples)", entity.id(), entity.position_track().len());
        entity.trail_mut().set_window_secs(self.history_window_secs);
        // deterministic color assignment happens at load, in insertion order
        self.display.config_for(entity.id());
        self.entities.push(entity);
    }

    /// Unload an entity, dropping its transient state (trail, smoother).
    pub fn remove_entity(&mut self, id: &str) {
        if let Some(idx) = self.entities.iter().position(|e| e.id() == id) {
            self.entities[idx].reset();
            self.entities.remove(idx);
            debug!("unloaded entity {}", id);
        }
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn entity_ids(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.id()).collect()
    }

    pub fn display_for(&mut self, id: &str) -> DisplayConfig {
        self.display.config_for(id)
    }

    pub fn set_display(&mut self, id: &str, config: DisplayConfig) {
        self.display.set(id, config);
    }

    // queries are pure reads, callable any number of times per tick

    pub fn query_position(&self, id: &str, t: DateTime<Utc>) -> Option<GeoPos> {
        self.entity(id)?.position_at(t)
    }

    pub fn query_orientation(&self, id: &str, t: DateTime<Utc>) -> Option<Attitude> {
        self.entity(id)?.orientation_at(t)
    }

    pub fn query_instrument(&self, id: &str, channel: Channel, t: DateTime<Utc>) -> Option<f64> {
        self.entity(id)?.instrument_at(channel, t)
    }

    /// The entity's pruned trail positions, oldest first. Empty when the
    /// entity is unknown or history is off.
    pub fn trail(&self, id: &str) -> Vec<GeoPos> {
        self.entity(id).map(|e| e.trail().path()).unwrap_or_default()
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn play(&mut self) {
        self.clock.play();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn seek(&mut self, t: DateTime<Utc>) {
        self.clock.seek(t);
        if let Some(audio) = &mut self.audio {
            audio.interrupt();
        }
    }

    pub fn set_playback_multiplier(&mut self, multiplier: f64) {
        self.clock.set_multiplier(multiplier);
        if let Some(audio) = &mut self.audio {
            audio.interrupt();
        }
    }

    /// Toggle trail history. Disabling clears every buffer immediately.
    pub fn set_history_enabled(&mut self, enabled: bool) {
        self.history_enabled = enabled;
        if !enabled {
            for entity in &mut self.entities {
                entity.trail_mut().clear();
            }
        }
    }

    pub fn history_enabled(&self) -> bool {
        self.history_enabled
    }

    /// Trailing window in seconds, clamped to [5, 300], applied to every
    /// entity's buffer.
    pub fn set_history_window_secs(&mut self, secs: u64) {
        self.history_window_secs = secs.clamp(trail::MIN_WINDOW_SECS, trail::MAX_WINDOW_SECS);
        for entity in &mut self.entities {
            entity.trail_mut().set_window_secs(self.history_window_secs);
        }
    }

    /// Attach the audio session once its buffer has been decoded. A failed
    /// decode simply never attaches and the session stays inert.
    pub fn attach_audio(&mut self, audio: AudioSync) {
        self.audio = Some(audio);
    }

    pub fn arm_audio(&mut self) {
        if let Some(audio) = &mut self.audio {
            audio.arm();
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        if let Some(audio) = &mut self.audio {
            audio.set_volume(volume);
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        if let Some(audio) = &mut self.audio {
            audio.set_muted(muted);
        }
    }

    /// Register a tick observer. Subscribers run synchronously in
    /// subscription order; `&mut self` makes a subscriber-triggered
    /// re-entrant tick unrepresentable.
    pub fn subscribe(&mut self, subscriber: TickSubscriber) {
        self.subscribers.push(subscriber);
    }

    /// Drive all internal state to simulation time `now` (clamped into the
    /// session bounds). Every trail update and the audio sync observe this
    /// one `now`, so history and the current marker can never tear.
    pub fn tick_at(&mut self, now: DateTime<Utc>) {
        let real_dt = self
            .last_tick
            .map(|prev| prev.elapsed())
            .unwrap_or(StdDuration::ZERO);
        self.last_tick = Some(Instant::now());

        // a backward jump in tick time is a scrub; audio must not keep
        // playing the old offset
        if now < self.clock.current() {
            if let Some(audio) = &mut self.audio {
                audio.interrupt();
            }
        }
        self.clock.seek(now);
        let now = self.clock.current();

        for entity in &mut self.entities {
            entity.tick(now, self.history_enabled);
        }
        if let Some(audio) = &mut self.audio {
            audio.sync(&self.clock, real_dt);
        }
        for subscriber in &mut self.subscribers {
            subscriber(now);
        }
    }

    /// Advance the governed clock by a real frame delta, then tick.
    pub fn advance(&mut self, real_dt: StdDuration) {
        self.clock.advance(real_dt);
        self.tick_at(self.clock.current());
    }
}
