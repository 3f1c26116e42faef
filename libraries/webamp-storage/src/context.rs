use crate::document::DocumentStore;
use crate::error::Result;
use crate::playlists::{self, PlaylistUpdate};
use crate::settings::{self, AppSettings, ViewMode};
use crate::usage::{self, UsageStats};
use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;
use std::path::PathBuf;
use webamp_core::{KeyBindings, Playlist, PlaylistId, Track, TrackId, UsageRecorder};

/// Local storage context backed by JSON documents in one directory
#[derive(Debug, Clone)]
pub struct LocalStorageContext {
    store: DocumentStore,
}

impl LocalStorageContext {
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            store: DocumentStore::open(data_dir).await?,
        })
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    // Playlists
    pub async fn get_playlists(&self) -> Result<Vec<Playlist>> {
        playlists::get_all(&self.store).await
    }

    pub async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>> {
        playlists::get_by_id(&self.store, id).await
    }

    pub async fn create_playlist(&self, name: &str, description: Option<String>) -> Result<Playlist> {
        playlists::create(&self.store, name, description).await
    }

    pub async fn create_vibe_playlist(
        &self,
        name: &str,
        description: Option<String>,
        songs: Vec<Track>,
        ttl: Duration,
    ) -> Result<Playlist> {
        playlists::create_vibe(&self.store, name, description, songs, ttl).await
    }

    pub async fn update_playlist(&self, id: &PlaylistId, changes: PlaylistUpdate) -> Result<Playlist> {
        playlists::update(&self.store, id, changes).await
    }

    pub async fn delete_playlist(&self, id: &PlaylistId) -> Result<bool> {
        playlists::delete(&self.store, id).await
    }

    pub async fn add_song(&self, id: &PlaylistId, song: Track) -> Result<Playlist> {
        playlists::add_song(&self.store, id, song).await
    }

    pub async fn remove_song(&self, id: &PlaylistId, song_id: &TrackId) -> Result<Playlist> {
        playlists::remove_song(&self.store, id, song_id).await
    }

    pub async fn reorder_songs(&self, id: &PlaylistId, songs: Vec<Track>) -> Result<Playlist> {
        playlists::reorder_songs(&self.store, id, songs).await
    }

    pub async fn convert_vibe_to_normal(&self, id: &PlaylistId) -> Result<Playlist> {
        playlists::convert_vibe_to_normal(&self.store, id).await
    }

    pub async fn import_playlist(&self, data: &Value) -> Result<Playlist> {
        playlists::import(&self.store, data).await
    }

    pub async fn import_playlists(&self, data: &Value) -> Result<usize> {
        playlists::import_many(&self.store, data).await
    }

    pub async fn export_playlist(&self, id: &PlaylistId) -> Result<String> {
        playlists::export(&self.store, id).await
    }

    pub async fn export_playlists(&self) -> Result<String> {
        playlists::export_all(&self.store).await
    }

    // Usage
    pub async fn usage_stats(&self, id: &PlaylistId) -> Result<UsageStats> {
        usage::get_stats(&self.store, id).await
    }

    /// Highest-scoring live playlists
    pub async fn top_playlists(&self, limit: usize) -> Result<Vec<Playlist>> {
        let all = playlists::get_all(&self.store).await?;
        usage::get_top_playlists(&self.store, &all, limit).await
    }

    // Settings
    pub async fn settings(&self) -> Result<AppSettings> {
        settings::get(&self.store).await
    }

    pub async fn update_settings(&self, updates: AppSettings) -> Result<AppSettings> {
        settings::update(&self.store, updates).await
    }

    pub async fn token(&self) -> Result<Option<String>> {
        settings::get_token(&self.store).await
    }

    pub async fn set_token(&self, token: &str) -> Result<()> {
        settings::set_token(&self.store, token).await
    }

    pub async fn remove_token(&self) -> Result<()> {
        settings::remove_token(&self.store).await
    }

    pub async fn view_mode(&self) -> Result<ViewMode> {
        settings::get_view_mode(&self.store).await
    }

    pub async fn set_view_mode(&self, mode: ViewMode) -> Result<()> {
        settings::set_view_mode(&self.store, mode).await
    }

    pub async fn shortcuts(&self) -> Result<KeyBindings> {
        settings::get_shortcuts(&self.store).await
    }

    pub async fn set_shortcuts(&self, bindings: KeyBindings) -> Result<()> {
        settings::set_shortcuts(&self.store, bindings).await
    }

    pub async fn clear_settings(&self) -> Result<()> {
        settings::clear(&self.store).await
    }
}

#[async_trait]
impl UsageRecorder for LocalStorageContext {
    async fn record_play_started(&self, queue: &PlaylistId) {
        if let Err(e) = usage::record_play(&self.store, queue).await {
            tracing::warn!("Failed to record play for {}: {}", queue, e);
        }
    }

    async fn record_listened_seconds(&self, queue: &PlaylistId, seconds: u64) {
        if let Err(e) = usage::record_listen_time(&self.store, queue, seconds).await {
            tracing::warn!("Failed to record listen time for {}: {}", queue, e);
        }
    }
}
