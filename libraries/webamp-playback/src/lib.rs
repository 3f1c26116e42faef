//! WebAmp - Playback Management
//!
//! Queue and transport control for tracks played through an embedded,
//! asynchronous media backend (e.g. a hosted video player).
//!
//! This crate provides:
//! - Playback queue with wrap-around and shuffle navigation
//! - Volume control (0-100, mute/unmute independent of level)
//! - Adapter lifecycle: at most one live player, stale events dropped
//! - Position polling and periodic usage reporting while playing
//! - Keyboard shortcut dispatch
//!
//! # Architecture
//!
//! `webamp-playback` never talks to a concrete player. Platforms implement
//! [`MediaBackend`] and [`MediaAdapter`]; the [`PlaybackController`] drives
//! them from a single tokio task and publishes a [`PlaybackSnapshot`] after
//! every change.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use webamp_core::{NoopUsageRecorder, Provider, Track};
//! use webamp_playback::testing::MockBackend;
//! use webamp_playback::{PlaybackConfig, PlaybackController, PlaybackPhase};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> webamp_playback::Result<()> {
//! let backend = MockBackend::auto_ready();
//! let (controller, _task) = PlaybackController::spawn(
//!     Arc::new(backend),
//!     Arc::new(NoopUsageRecorder),
//!     PlaybackConfig::default(),
//! );
//!
//! let track = Track::new(
//!     "Song",
//!     "Artist",
//!     "https://youtu.be/dQw4w9WgXcQ",
//!     Provider::Youtube,
//! );
//! controller.play(track, None, None).await?;
//! assert_eq!(controller.snapshot().phase, PlaybackPhase::Playing);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod queue;
pub mod shortcuts;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod types;
pub mod volume;

// Re-export main types
pub use adapter::{
    AdapterError, AdapterEvent, AdapterEventSink, AdapterRequest, AdapterSignal, AdapterState,
    MediaAdapter, MediaBackend, PlayerOptions,
};
pub use controller::PlaybackController;
pub use engine::{PlaybackEngine, SignalOutcome};
pub use error::{PlaybackError, Result};
pub use events::{PlaybackEvent, UsageReport};
pub use queue::PlaybackQueue;
pub use shortcuts::{resolve_shortcut, FocusTarget, KeyPress};
pub use types::{PlaybackConfig, PlaybackPhase, PlaybackSnapshot};
pub use volume::Volume;
