//! Error types for playback management

use crate::adapter::AdapterError;
use thiserror::Error;
use webamp_core::ResolutionError;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Track reference could not be resolved to a playable id
    #[error("Cannot resolve track: {0}")]
    Resolution(#[from] ResolutionError),

    /// Media backend was unavailable or refused to build a player
    #[error("Adapter construction failed: {0}")]
    AdapterConstruction(#[from] AdapterError),

    /// Adapter reported an error event
    #[error("Playback error: {0}")]
    Adapter(String),

    /// A newer play or stop replaced this request before it became ready
    #[error("Playback request was superseded")]
    Interrupted,

    /// The controller task is gone
    #[error("Playback controller is closed")]
    ControllerClosed,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
