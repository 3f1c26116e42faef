//! Media backend capability interface
//!
//! The controller drives an external, asynchronous media embed (e.g. an
//! embeddable video player) through these traits only. A backend builds one
//! adapter per track; the adapter reports `Ready` or `Error` exactly once
//! after construction and then a stream of state changes, all through the
//! [`AdapterEventSink`] it was given.
//!
//! Events are tagged with the generation of the construction that produced
//! them, so anything still in flight from a destroyed adapter is recognised
//! and dropped by the controller.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use webamp_core::PlayableId;

/// Options recognised by every backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerOptions {
    /// Start playing as soon as the media is ready
    pub autoplay: bool,

    /// Initial position in seconds
    pub start_position_secs: f64,

    /// Show the provider's own controls
    pub show_controls: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            autoplay: true,
            start_position_secs: 0.0,
            show_controls: false,
        }
    }
}

/// Everything a backend needs to build one adapter
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterRequest {
    /// Surface (element id, window, ...) the player is mounted on
    pub host_surface: String,

    /// Provider-specific id of the media to load
    pub playable_id: PlayableId,

    pub options: PlayerOptions,
}

/// Adapter construction failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdapterError {
    /// Backend script/library is not available yet
    #[error("Media backend is not loaded")]
    NotLoaded,

    /// Backend never became available
    #[error("Media backend did not load within {0:?}")]
    LoadTimeout(Duration),

    /// Backend refused to build a player
    #[error("{0}")]
    Construction(String),
}

/// Player states an adapter reports after `Ready`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Playing,
    Paused,
    Ended,
}

/// Events emitted by an adapter
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    /// Media loaded; duration is now known
    Ready,

    /// Playback failed
    Error(String),

    /// Player changed state
    StateChange(AdapterState),
}

/// Adapter event tagged with the construction that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterSignal {
    pub generation: u64,
    pub event: AdapterEvent,
}

/// Channel end handed to a backend for one adapter's events
#[derive(Debug, Clone)]
pub struct AdapterEventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<AdapterSignal>,
}

impl AdapterEventSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<AdapterSignal>) -> Self {
        Self { generation, tx }
    }

    /// Generation of the adapter this sink belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver an event; returns `false` once the controller is gone
    pub fn emit(&self, event: AdapterEvent) -> bool {
        self.tx
            .send(AdapterSignal {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// A live media player instance
///
/// Query and transport methods are only called after the adapter reported
/// `Ready`. `destroy` may be called at any time and more than once.
pub trait MediaAdapter: Send {
    /// Media duration in seconds
    fn duration_secs(&self) -> f64;

    /// Current position in seconds
    fn position_secs(&self) -> f64;

    fn play(&mut self);

    fn pause(&mut self);

    fn stop(&mut self);

    fn seek_to(&mut self, seconds: f64);

    /// Set volume (0-100)
    fn set_volume(&mut self, level: u8);

    fn mute(&mut self);

    fn unmute(&mut self);

    /// Release the player and its host surface
    fn destroy(&mut self);
}

/// Factory for adapters
pub trait MediaBackend: Send + Sync {
    /// Whether the backend can build adapters right now
    fn is_loaded(&self) -> bool {
        true
    }

    /// Build an adapter for `request`
    ///
    /// The adapter must report `Ready` or `Error` through `events` after this
    /// returns, never synchronously instead of returning.
    fn create(
        &self,
        request: AdapterRequest,
        events: AdapterEventSink,
    ) -> Result<Box<dyn MediaAdapter>, AdapterError>;
}
