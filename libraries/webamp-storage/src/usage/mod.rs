//! Listening statistics per playlist
//!
//! Score = play count * 10 + listened minutes. Top playlists are ranked by
//! score, ties keeping the caller's order.

use crate::document::{DocumentStore, USAGE_KEY};
use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use webamp_core::{Playlist, PlaylistId};

/// Usage counters for one playlist
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub play_count: u64,

    /// Seconds listened
    pub listen_time: u64,

    /// Milliseconds since the Unix epoch, 0 if never played
    pub last_played: i64,
}

impl UsageStats {
    pub fn score(&self) -> f64 {
        self.play_count as f64 * 10.0 + self.listen_time as f64 / 60.0
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsageData {
    #[serde(default)]
    playlists: HashMap<String, UsageStats>,
}

/// Count one play of `id`
pub async fn record_play(store: &DocumentStore, id: &PlaylistId) -> Result<()> {
    record(store, id, |stats| stats.play_count += 1).await
}

/// Add `seconds` of listening time to `id`
pub async fn record_listen_time(store: &DocumentStore, id: &PlaylistId, seconds: u64) -> Result<()> {
    record(store, id, |stats| stats.listen_time += seconds).await
}

/// Counters for `id` (zeroes if never played)
pub async fn get_stats(store: &DocumentStore, id: &PlaylistId) -> Result<UsageStats> {
    let data: UsageData = store.load(USAGE_KEY).await?;
    Ok(data.playlists.get(id.as_str()).copied().unwrap_or_default())
}

/// The `limit` highest-scoring playlists out of `playlists`
pub async fn get_top_playlists(
    store: &DocumentStore,
    playlists: &[Playlist],
    limit: usize,
) -> Result<Vec<Playlist>> {
    let data: UsageData = store.load(USAGE_KEY).await?;

    let mut scored: Vec<(f64, &Playlist)> = playlists
        .iter()
        .map(|playlist| {
            let score = data
                .playlists
                .get(playlist.id.as_str())
                .map_or(0.0, UsageStats::score);
            (score, playlist)
        })
        .collect();

    // Stable sort keeps input order among equal scores
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    Ok(scored
        .into_iter()
        .take(limit)
        .map(|(_, playlist)| playlist.clone())
        .collect())
}

async fn record(
    store: &DocumentStore,
    id: &PlaylistId,
    bump: impl FnOnce(&mut UsageStats),
) -> Result<()> {
    store
        .update(USAGE_KEY, |data: &mut UsageData| {
            let stats = data.playlists.entry(id.as_str().to_string()).or_default();
            bump(stats);
            stats.last_played = Utc::now().timestamp_millis();
            Some(())
        })
        .await?;
    Ok(())
}
