/// Domain types shared across WebAmp crates
mod ids;
mod playlist;
mod shortcuts;
mod track;

pub use ids::{PlaylistId, TrackId};
pub use playlist::Playlist;
pub use shortcuts::{KeyBindings, ShortcutAction};
pub use track::{Provider, Track};
