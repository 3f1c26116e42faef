//! Core types for playback management

use crate::adapter::PlayerOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use webamp_core::{PlaylistId, Track};

/// Playback phase
///
/// ```text
/// idle -(play)-> loading -(ready)-> playing <-(pause/resume)-> paused
/// loading|playing|paused -(stop)-> idle
/// playing -(end)-> ended -> playing (repeat) | loading (next) | idle (exhausted)
/// any -(adapter error)-> error -> idle
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    /// Nothing playing; initial and resting state
    #[default]
    Idle,

    /// Adapter constructed, waiting for ready
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Track reached its end
    Ended,

    /// Adapter reported an error (transient, settles to idle)
    Error,
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0-100, default: 100)
    pub volume: u8,

    /// Start muted (default: false)
    pub muted: bool,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Initial repeat flag (default: false)
    pub repeat: bool,

    /// Host surface adapters are mounted on
    pub host_surface: String,

    /// Options passed to every adapter construction
    pub player_options: PlayerOptions,

    /// Position sampling period while playing (default: 100 ms)
    pub position_poll_interval_ms: u64,

    /// Usage tick period and increment (default: 10 s)
    pub usage_tick_interval_secs: u64,

    /// How often to check whether the backend has loaded (default: 100 ms)
    pub backend_poll_interval_ms: u64,

    /// Give up waiting for the backend after this long (default: 10 s)
    pub backend_load_timeout_ms: u64,
}

impl PlaybackConfig {
    pub fn position_poll_interval(&self) -> Duration {
        Duration::from_millis(self.position_poll_interval_ms.max(1))
    }

    pub fn usage_tick_interval(&self) -> Duration {
        Duration::from_secs(self.usage_tick_interval_secs.max(1))
    }

    pub fn backend_poll_interval(&self) -> Duration {
        Duration::from_millis(self.backend_poll_interval_ms.max(1))
    }

    pub fn backend_load_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_load_timeout_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 100,
            muted: false,
            shuffle: false,
            repeat: false,
            host_surface: "hidden-audio-player".to_string(),
            player_options: PlayerOptions::default(),
            position_poll_interval_ms: 100,
            usage_tick_interval_secs: 10,
            backend_poll_interval_ms: 100,
            backend_load_timeout_ms: 10_000,
        }
    }
}

/// Observable playback state
///
/// Published by the controller after every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub phase: PlaybackPhase,
    pub current_track: Option<Track>,
    pub position_secs: f64,
    /// Zero until the adapter reports ready
    pub duration_secs: f64,
    pub volume: u8,
    pub muted: bool,
    pub shuffle: bool,
    pub repeat: bool,
    pub queue_len: usize,
    pub queue_identity: Option<PlaylistId>,
}

impl PlaybackSnapshot {
    /// Volume actually heard: zero while muted
    pub fn effective_volume(&self) -> u8 {
        if self.muted {
            0
        } else {
            self.volume
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }
}
