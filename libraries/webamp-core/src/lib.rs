//! WebAmp Core
//!
//! Platform-agnostic domain types and traits shared by the WebAmp crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Playlist`, `Provider` and their ids
//! - **Resolution**: mapping a track's external reference to a `PlayableId`
//! - **Traits**: `UsageRecorder`, the sink for listening statistics
//!
//! # Example
//!
//! ```rust
//! use webamp_core::{resolve_playable_id, Provider, Track};
//!
//! let track = Track::new(
//!     "Never Gonna Give You Up",
//!     "Rick Astley",
//!     "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
//!     Provider::Youtube,
//! );
//!
//! let playable = resolve_playable_id(&track).unwrap();
//! assert_eq!(playable.id, "dQw4w9WgXcQ");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod resolve;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::ResolutionError;
pub use resolve::{
    extract_youtube_video_id, format_duration_label, resolve_playable_id, resolve_reference,
    youtube_embed_url, youtube_thumbnail_url, PlayableId,
};
pub use traits::{NoopUsageRecorder, UsageRecorder};
pub use types::{KeyBindings, Playlist, PlaylistId, Provider, ShortcutAction, Track, TrackId};
