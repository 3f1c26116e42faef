/// Playlist domain type
use crate::types::{PlaylistId, Track};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered collection of tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    /// Unique playlist identifier
    pub id: PlaylistId,

    /// Display name
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Tracks in play order
    #[serde(default)]
    pub songs: Vec<Track>,

    /// Creation timestamp
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,

    /// Generated from a recommendation "vibe" rather than curated by hand
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_vibe: bool,

    /// Vibe playlists disappear after this instant
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Playlist {
    /// Create a new empty playlist
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: PlaylistId::generate(),
            name: name.into(),
            description,
            songs: Vec::new(),
            created_at: now,
            updated_at: now,
            is_vibe: false,
            expires_at: None,
        }
    }

    /// Whether the playlist has passed its expiry at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }

    /// Bump the modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
