//! WebAmp Storage
//!
//! Local persistence for playlists, listening statistics and settings,
//! kept as JSON documents in a single data directory.
//!
//! # Architecture
//!
//! - **Documents**: one JSON file per key, read leniently, written atomically
//! - **Vertical Slicing**: each feature owns its document and operations
//! - **Usage Recording**: [`LocalStorageContext`] implements
//!   `webamp_core::UsageRecorder`, so it can be handed straight to the
//!   playback controller
//!
//! # Example
//!
//! ```rust,no_run
//! use webamp_storage::LocalStorageContext;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = LocalStorageContext::open("/tmp/webamp").await?;
//!
//! let playlist = storage.create_playlist("Focus", None).await?;
//! let all = storage.get_playlists().await?;
//! assert!(all.iter().any(|p| p.id == playlist.id));
//! # Ok(())
//! # }
//! ```

mod context;
mod error;

pub mod document;

// Vertical slices
pub mod playlists;
pub mod settings;
pub mod usage;

pub use context::LocalStorageContext;
pub use document::DocumentStore;
pub use error::{Result, StorageError};
pub use playlists::PlaylistUpdate;
pub use settings::{AppSettings, Theme, ViewMode};
pub use usage::UsageStats;
