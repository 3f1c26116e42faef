//! Subcommand implementations
//!
//! Library commands write their human-readable output to the given writer
//! so they can be exercised against an in-memory buffer.

pub mod library;
pub mod player;

pub use library::SongInput;
pub use player::{run_player, PlayOptions};
