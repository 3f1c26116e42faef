/// Track domain type
use crate::types::TrackId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hosting provider of a track
///
/// Only `Youtube` has a resolution strategy; the other providers are
/// accepted in stored documents but cannot be played yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// YouTube videos
    #[default]
    Youtube,
    /// SoundCloud tracks
    Soundcloud,
    /// Vimeo videos
    Vimeo,
    /// Dailymotion videos
    Dailymotion,
}

impl Provider {
    /// Stable lowercase name, as stored in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Soundcloud => "soundcloud",
            Self::Vimeo => "vimeo",
            Self::Dailymotion => "dailymotion",
        }
    }

    /// Whether playable ids can be resolved for this provider
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Youtube)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single playable library item
///
/// Treated as an immutable value by the playback engine. Field names
/// serialize in camelCase so stored playlists stay readable by other tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist or channel name
    pub artist: String,

    /// External reference used to build the playable id (embed or watch URL)
    pub url: String,

    /// Link for sharing, when different from `url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,

    /// Hosting provider
    #[serde(default)]
    pub provider: Provider,

    /// Display thumbnail URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Human readable duration label (e.g. "3:45")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    /// When the track was added to the library
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,

    /// Why the track was suggested, for recommended tracks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_reason: Option<String>,
}

impl Track {
    /// Create a new track with a generated id
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        url: impl Into<String>,
        provider: Provider,
    ) -> Self {
        Self::with_id(TrackId::generate(), title, artist, url, provider)
    }

    /// Create a track with a specific id (for loading and tests)
    pub fn with_id(
        id: TrackId,
        title: impl Into<String>,
        artist: impl Into<String>,
        url: impl Into<String>,
        provider: Provider,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            url: url.into(),
            original_url: None,
            provider,
            thumbnail: None,
            duration: None,
            added_at: Utc::now(),
            recommendation_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Provider::Soundcloud).unwrap(),
            "\"soundcloud\""
        );
        assert!(Provider::Youtube.is_supported());
        assert!(!Provider::Vimeo.is_supported());
    }

    #[test]
    fn track_reads_stored_document() {
        let json = r#"{
            "id": "s1",
            "title": "Song",
            "artist": "Band",
            "url": "https://www.youtube.com/embed/abc123",
            "provider": "youtube",
            "thumbnail": "https://img.youtube.com/vi/abc123/maxresdefault.jpg",
            "duration": "3:05",
            "addedAt": 1700000000000
        }"#;

        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.id.as_str(), "s1");
        assert_eq!(track.duration.as_deref(), Some("3:05"));
        assert_eq!(track.added_at.timestamp_millis(), 1_700_000_000_000);
        assert!(track.original_url.is_none());
    }
}
