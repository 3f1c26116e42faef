//! Playback Events
//!
//! Discrete notifications for UI synchronization. Continuous values
//! (position, duration) are not events; read them from the published
//! snapshot instead.

use crate::types::PlaybackPhase;
use serde::{Deserialize, Serialize};
use webamp_core::{PlaylistId, TrackId};

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Phase changed
    StateChanged {
        /// The new phase
        phase: PlaybackPhase,
    },

    /// A new track became current (emitted when its adapter is constructed)
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished {
        /// ID of the finished track
        track_id: TrackId,
    },

    /// Volume or mute changed
    VolumeChanged {
        /// Stored volume level (0-100)
        level: u8,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Shuffle or repeat toggled
    ModesChanged { shuffle: bool, repeat: bool },

    /// Queue was replaced
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Error occurred during playback
    Error {
        /// Error message
        message: String,
    },
}

/// Usage notification destined for a `UsageRecorder`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageReport {
    /// An explicit play started a session for this queue
    PlayStarted(PlaylistId),

    /// Fixed listening increment for this queue
    Listened { queue: PlaylistId, seconds: u64 },
}
