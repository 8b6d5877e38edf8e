//! Persistent replay settings.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::trail;

/// User-facing settings persisted between sessions. Load failures of any
/// kind fall back to defaults; replay must start regardless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaySettings {
    pub history_enabled: bool,
    pub history_window_secs: u64,
    pub playback_multiplier: f64,
    pub volume: f32,
    pub muted: bool,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            history_enabled: true,
            history_window_secs: trail::DEFAULT_WINDOW_SECS,
            playback_multiplier: 1.0,
            volume: 1.0,
            muted: false,
        }
    }
}

impl ReplaySettings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("flightscrub").join("settings.json"))
    }

    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                if let Ok(contents) = fs::read_to_string(&path) {
                    if let Ok(settings) = serde_json::from_str(&contents) {
                        return settings;
                    }
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(json) = serde_json::to_string_pretty(self) {
                let _ = fs::write(&path, json);
            }
        }
    }
}
