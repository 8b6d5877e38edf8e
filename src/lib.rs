//! flightscrub: Flight Telemetry Replay & Interpolation Engine
//!
//! Reconstructs the time-evolving state of recorded aircraft tracks
//! (position, attitude, instrument channels) for synchronized scrub and
//! playback against a shared simulation clock, with an audio track locked to
//! the same clock. The rendering layer is external: it drives `tick`/`advance`
//! once per frame and calls the query methods with the same time value.

pub mod core;
pub mod geo;
pub mod kinematics;
pub mod trail;
pub mod playback;
pub mod audio;
pub mod entity;
pub mod engine;
pub mod input;
pub mod settings;

pub use crate::core::{Attitude, GeoPos, Sample, Track};
pub use crate::engine::ReplayEngine;
pub use crate::entity::{Channel, Entity};
pub use crate::playback::PlaybackClock;
pub use crate::settings::ReplaySettings;
