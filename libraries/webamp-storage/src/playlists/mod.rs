//! Playlist collection
//!
//! All playlists live in one document, a JSON array in insertion order.
//! Vibe playlists carry an expiry and are purged the next time the
//! collection is listed.

use crate::document::{DocumentStore, PLAYLISTS_KEY};
use crate::error::{Result, StorageError};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use webamp_core::{Playlist, PlaylistId, Provider, Track, TrackId};

const UNTITLED: &str = "Untitled";
const UNKNOWN_ARTIST: &str = "Unknown";

/// Fields of a playlist that can be edited in place
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// All playlists that have not expired
///
/// Expired vibe playlists are dropped and the pruned collection is written
/// back.
pub async fn get_all(store: &DocumentStore) -> Result<Vec<Playlist>> {
    let now = Utc::now();

    let pruned = store
        .update(PLAYLISTS_KEY, |playlists: &mut Vec<Playlist>| {
            let before = playlists.len();
            playlists.retain(|p| !p.is_expired(now));
            (playlists.len() != before).then(|| before - playlists.len())
        })
        .await?;
    if let Some(count) = pruned {
        tracing::info!("Removed {} expired vibe playlist(s)", count);
    }

    store.load(PLAYLISTS_KEY).await
}

/// Playlist by id
pub async fn get_by_id(store: &DocumentStore, id: &PlaylistId) -> Result<Option<Playlist>> {
    let playlists: Vec<Playlist> = store.load(PLAYLISTS_KEY).await?;
    Ok(playlists.into_iter().find(|p| &p.id == id))
}

/// Create an empty playlist
pub async fn create(
    store: &DocumentStore,
    name: &str,
    description: Option<String>,
) -> Result<Playlist> {
    insert(store, Playlist::new(name, description)).await
}

/// Create a vibe playlist that expires after `ttl`
pub async fn create_vibe(
    store: &DocumentStore,
    name: &str,
    description: Option<String>,
    songs: Vec<Track>,
    ttl: Duration,
) -> Result<Playlist> {
    let mut playlist = Playlist::new(name, description);
    playlist.songs = songs.into_iter().map(fresh_copy).collect();
    playlist.is_vibe = true;
    playlist.expires_at = Some(playlist.created_at + ttl);

    insert(store, playlist).await
}

/// Rename or re-describe a playlist
pub async fn update(
    store: &DocumentStore,
    id: &PlaylistId,
    changes: PlaylistUpdate,
) -> Result<Playlist> {
    modify(store, id, |playlist| {
        if let Some(name) = changes.name {
            playlist.name = name;
        }
        if let Some(description) = changes.description {
            playlist.description = Some(description);
        }
    })
    .await
}

/// Delete a playlist; returns whether it existed
pub async fn delete(store: &DocumentStore, id: &PlaylistId) -> Result<bool> {
    let removed = store
        .update(PLAYLISTS_KEY, |playlists: &mut Vec<Playlist>| {
            let before = playlists.len();
            playlists.retain(|p| &p.id != id);
            (playlists.len() != before).then_some(())
        })
        .await?;
    Ok(removed.is_some())
}

/// Append a song; it gets a fresh id and added-at timestamp
pub async fn add_song(store: &DocumentStore, id: &PlaylistId, song: Track) -> Result<Playlist> {
    let song = fresh_copy(song);
    modify(store, id, |playlist| playlist.songs.push(song)).await
}

/// Remove a song by id (no-op if absent)
pub async fn remove_song(
    store: &DocumentStore,
    id: &PlaylistId,
    song_id: &TrackId,
) -> Result<Playlist> {
    modify(store, id, |playlist| playlist.songs.retain(|s| &s.id != song_id)).await
}

/// Replace the song order wholesale
pub async fn reorder_songs(
    store: &DocumentStore,
    id: &PlaylistId,
    songs: Vec<Track>,
) -> Result<Playlist> {
    modify(store, id, |playlist| playlist.songs = songs).await
}

/// Turn a vibe playlist into a permanent one
pub async fn convert_vibe_to_normal(store: &DocumentStore, id: &PlaylistId) -> Result<Playlist> {
    let Some(existing) = get_by_id(store, id).await? else {
        return Err(StorageError::not_found("Playlist", id.as_str()));
    };
    if !existing.is_vibe {
        return Ok(existing);
    }

    modify(store, id, |playlist| {
        playlist.is_vibe = false;
        playlist.expires_at = None;
    })
    .await
}

/// Import one exported playlist document
///
/// The document must be an object with a non-empty `name` and a `songs`
/// array. The playlist and every song get fresh ids; missing song fields
/// fall back to defaults.
pub async fn import(store: &DocumentStore, data: &Value) -> Result<Playlist> {
    let playlist = parse_import(data)?;
    tracing::info!(
        "Importing playlist \"{}\" with {} song(s)",
        playlist.name,
        playlist.songs.len()
    );
    insert(store, playlist).await
}

/// Import an array of playlist documents, skipping invalid entries
///
/// Returns how many playlists were imported.
pub async fn import_many(store: &DocumentStore, data: &Value) -> Result<usize> {
    let Some(items) = data.as_array() else {
        return Err(StorageError::invalid_import("expected an array of playlists"));
    };

    let imported: Vec<Playlist> = items
        .iter()
        .filter_map(|item| match parse_import(item) {
            Ok(playlist) => Some(playlist),
            Err(e) => {
                tracing::warn!("Skipping playlist during import: {}", e);
                None
            }
        })
        .collect();

    let count = imported.len();
    if count > 0 {
        store
            .update(PLAYLISTS_KEY, |playlists: &mut Vec<Playlist>| {
                playlists.extend(imported);
                Some(())
            })
            .await?;
    }
    Ok(count)
}

/// Pretty-printed JSON of one playlist, suitable for [`import`]
pub async fn export(store: &DocumentStore, id: &PlaylistId) -> Result<String> {
    let playlist = get_by_id(store, id)
        .await?
        .ok_or_else(|| StorageError::not_found("Playlist", id.as_str()))?;
    Ok(serde_json::to_string_pretty(&playlist)?)
}

/// Pretty-printed JSON array of every live playlist, suitable for [`import_many`]
pub async fn export_all(store: &DocumentStore) -> Result<String> {
    let playlists = get_all(store).await?;
    Ok(serde_json::to_string_pretty(&playlists)?)
}

// ===== Internal =====

async fn insert(store: &DocumentStore, playlist: Playlist) -> Result<Playlist> {
    let created = playlist.clone();
    store
        .update(PLAYLISTS_KEY, |playlists: &mut Vec<Playlist>| {
            playlists.push(playlist);
            Some(())
        })
        .await?;

    tracing::debug!("Created playlist {} ({})", created.name, created.id);
    Ok(created)
}

async fn modify(
    store: &DocumentStore,
    id: &PlaylistId,
    change: impl FnOnce(&mut Playlist),
) -> Result<Playlist> {
    store
        .update(PLAYLISTS_KEY, |playlists: &mut Vec<Playlist>| {
            let playlist = playlists.iter_mut().find(|p| &p.id == id)?;
            change(playlist);
            playlist.touch();
            Some(playlist.clone())
        })
        .await?
        .ok_or_else(|| StorageError::not_found("Playlist", id.as_str()))
}

fn fresh_copy(mut song: Track) -> Track {
    song.id = TrackId::generate();
    song.added_at = Utc::now();
    song
}

fn parse_import(data: &Value) -> Result<Playlist> {
    let Some(object) = data.as_object() else {
        return Err(StorageError::invalid_import("expected a playlist object"));
    };

    let name = non_empty(object.get("name"))
        .ok_or_else(|| StorageError::invalid_import("playlist has no name"))?;
    let songs = object
        .get("songs")
        .and_then(Value::as_array)
        .ok_or_else(|| StorageError::invalid_import("playlist has no songs array"))?;

    let mut playlist = Playlist::new(name, non_empty(object.get("description")));
    playlist.songs = songs.iter().map(parse_song).collect();
    Ok(playlist)
}

fn parse_song(song: &Value) -> Track {
    let field = |key: &str| non_empty(song.get(key));

    let provider = song
        .get("provider")
        .and_then(|v| serde_json::from_value::<Provider>(v.clone()).ok())
        .unwrap_or_default();

    let mut track = Track::new(
        field("title").unwrap_or_else(|| UNTITLED.to_string()),
        field("artist").unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        field("url").unwrap_or_default(),
        provider,
    );
    track.original_url = field("originalUrl");
    track.thumbnail = field("thumbnail");
    track.duration = field("duration");
    track
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
