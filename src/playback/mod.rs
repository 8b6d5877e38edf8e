pub mod clock;

pub use clock::{PlaybackClock, MAX_SPEED, MIN_SPEED, SNAP_RANGE};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}
