//! Provider reference resolution
//!
//! Turns a track's external reference into the provider-specific id an
//! embedded player is constructed with, plus the small URL helpers used
//! when adding tracks to the library.

use crate::error::ResolutionError;
use crate::types::{Provider, Track};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Provider-specific playable id (e.g. a YouTube video id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayableId {
    /// Provider whose player understands `id`
    pub provider: Provider,
    /// Provider-specific id
    pub id: String,
}

impl fmt::Display for PlayableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.id)
    }
}

/// Resolve a track to the id its provider's player understands
pub fn resolve_playable_id(track: &Track) -> Result<PlayableId, ResolutionError> {
    resolve_reference(&track.url, track.provider)
}

/// Resolve a raw reference string for the given provider
pub fn resolve_reference(reference: &str, provider: Provider) -> Result<PlayableId, ResolutionError> {
    match provider {
        Provider::Youtube => {
            let url = Url::parse(reference)
                .map_err(|_| ResolutionError::InvalidUrl(reference.to_string()))?;
            youtube_video_id(&url)
                .map(|id| PlayableId { provider, id })
                .ok_or_else(|| ResolutionError::UnrecognizedFormat {
                    provider,
                    url: reference.to_string(),
                })
        }
        other => {
            tracing::warn!("{} playback is not implemented yet", other);
            Err(ResolutionError::UnsupportedProvider(other))
        }
    }
}

/// Extract a YouTube video id from any of the common URL shapes
///
/// Accepts `youtube.com/watch?v=ID`, `youtu.be/ID`, `youtube.com/embed/ID`
/// and `youtube.com/shorts/ID`, on any `youtube.com` subdomain.
pub fn extract_youtube_video_id(reference: &str) -> Option<String> {
    Url::parse(reference).ok().and_then(|url| youtube_video_id(&url))
}

fn youtube_video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let path = url.path();

    let id = if host.contains("youtube.com") {
        if path == "/watch" {
            url.query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
        } else if path.starts_with("/embed/") || path.starts_with("/shorts/") {
            path.split('/').nth(2).map(str::to_string)
        } else {
            None
        }
    } else if host == "youtu.be" {
        Some(path.trim_start_matches('/').to_string())
    } else {
        None
    };

    id.filter(|id| !id.is_empty())
}

/// Embed URL for a YouTube video id
pub fn youtube_embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{video_id}")
}

/// Thumbnail URL for a YouTube video id
pub fn youtube_thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/maxresdefault.jpg")
}

/// Format a duration in seconds as `M:SS`
pub fn format_duration_label(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
