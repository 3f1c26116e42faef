/// Playlist, usage and resolution commands
use anyhow::{bail, Context};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use webamp_core::{
    extract_youtube_video_id, format_duration_label, resolve_reference, youtube_embed_url,
    youtube_thumbnail_url, Playlist, PlaylistId, Provider, Track, TrackId,
};
use webamp_storage::LocalStorageContext;

/// A song as typed on the command line
#[derive(Debug, Clone)]
pub struct SongInput {
    pub url: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub provider: Provider,
    /// Length in seconds, shown as `M:SS`
    pub length_secs: Option<f64>,
}

impl SongInput {
    /// Build the library track, filling in provider-derived fields
    pub fn into_track(self) -> anyhow::Result<Track> {
        let mut track = Track::new(
            self.title.unwrap_or_else(|| "Untitled".to_string()),
            self.artist.unwrap_or_else(|| "Unknown".to_string()),
            self.url.clone(),
            self.provider,
        );

        if self.provider == Provider::Youtube {
            let Some(video_id) = extract_youtube_video_id(&self.url) else {
                bail!("Not a YouTube URL: {}", self.url);
            };
            track.url = youtube_embed_url(&video_id);
            track.original_url = Some(self.url);
            track.thumbnail = Some(youtube_thumbnail_url(&video_id));
        }
        track.duration = self.length_secs.map(format_duration_label);

        Ok(track)
    }
}

pub async fn list_playlists(ctx: &LocalStorageContext, out: &mut impl Write) -> anyhow::Result<()> {
    let playlists = ctx.get_playlists().await?;
    if playlists.is_empty() {
        writeln!(out, "No playlists")?;
        return Ok(());
    }

    writeln!(out, "Playlists:")?;
    for playlist in &playlists {
        writeln!(out, "  {}", summary(playlist))?;
    }
    Ok(())
}

pub async fn create_playlist(
    ctx: &LocalStorageContext,
    name: &str,
    description: Option<String>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let playlist = ctx.create_playlist(name, description).await?;
    writeln!(out, "Created playlist {} ({})", playlist.name, playlist.id)?;
    Ok(())
}

pub async fn show_playlist(
    ctx: &LocalStorageContext,
    id: &PlaylistId,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let playlist = find(ctx, id).await?;
    let stats = ctx.usage_stats(id).await?;

    writeln!(out, "{}", summary(&playlist))?;
    if let Some(description) = &playlist.description {
        writeln!(out, "  {description}")?;
    }
    writeln!(
        out,
        "  played {} time(s), {} listened",
        stats.play_count,
        format_duration_label(stats.listen_time as f64)
    )?;

    for (index, song) in playlist.songs.iter().enumerate() {
        writeln!(
            out,
            "  {:>3}. {} - {} [{}] {}",
            index + 1,
            song.artist,
            song.title,
            song.duration.as_deref().unwrap_or("-:--"),
            song.id
        )?;
    }
    Ok(())
}

pub async fn add_song(
    ctx: &LocalStorageContext,
    id: &PlaylistId,
    song: SongInput,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let track = song.into_track()?;
    let playlist = ctx.add_song(id, track).await?;
    if let Some(added) = playlist.songs.last() {
        writeln!(out, "Added {} to {} ({})", added.title, playlist.name, added.id)?;
    }
    Ok(())
}

pub async fn remove_song(
    ctx: &LocalStorageContext,
    id: &PlaylistId,
    song_id: &TrackId,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let playlist = ctx.remove_song(id, song_id).await?;
    writeln!(out, "{} now has {} song(s)", playlist.name, playlist.songs.len())?;
    Ok(())
}

pub async fn delete_playlist(
    ctx: &LocalStorageContext,
    id: &PlaylistId,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    if ctx.delete_playlist(id).await? {
        writeln!(out, "Deleted playlist {id}")?;
    } else {
        writeln!(out, "No playlist {id}")?;
    }
    Ok(())
}

/// Make a vibe playlist permanent
pub async fn keep_playlist(
    ctx: &LocalStorageContext,
    id: &PlaylistId,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let playlist = ctx.convert_vibe_to_normal(id).await?;
    writeln!(out, "{} is now a permanent playlist", playlist.name)?;
    Ok(())
}

/// Import one exported playlist or an array of them
pub async fn import_playlists(
    ctx: &LocalStorageContext,
    path: &Path,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let data: Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    if data.is_array() {
        let count = ctx.import_playlists(&data).await?;
        writeln!(out, "Imported {count} playlist(s)")?;
    } else {
        let playlist = ctx.import_playlist(&data).await?;
        writeln!(
            out,
            "Imported {} with {} song(s) ({})",
            playlist.name,
            playlist.songs.len(),
            playlist.id
        )?;
    }
    Ok(())
}

/// Export one playlist, or every playlist when `id` is `None`
pub async fn export_playlists(
    ctx: &LocalStorageContext,
    id: Option<&PlaylistId>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let json = match id {
        Some(id) => ctx.export_playlist(id).await?,
        None => ctx.export_playlists().await?,
    };
    writeln!(out, "{json}")?;
    Ok(())
}

pub async fn top_playlists(
    ctx: &LocalStorageContext,
    limit: usize,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let top = ctx.top_playlists(limit).await?;
    if top.is_empty() {
        writeln!(out, "No playlists")?;
        return Ok(());
    }

    for (rank, playlist) in top.iter().enumerate() {
        let stats = ctx.usage_stats(&playlist.id).await?;
        writeln!(
            out,
            "{:>2}. {} (score {:.1}, {} play(s), {} listened)",
            rank + 1,
            playlist.name,
            stats.score(),
            stats.play_count,
            format_duration_label(stats.listen_time as f64)
        )?;
    }
    Ok(())
}

/// Print the playable id a reference resolves to
pub fn resolve(reference: &str, provider: Provider, out: &mut impl Write) -> anyhow::Result<()> {
    let playable = resolve_reference(reference, provider)?;
    writeln!(out, "{playable}")?;
    if playable.provider == Provider::Youtube {
        writeln!(out, "  embed:     {}", youtube_embed_url(&playable.id))?;
        writeln!(out, "  thumbnail: {}", youtube_thumbnail_url(&playable.id))?;
    }
    Ok(())
}

async fn find(ctx: &LocalStorageContext, id: &PlaylistId) -> anyhow::Result<Playlist> {
    ctx.get_playlist(id)
        .await?
        .with_context(|| format!("No playlist {id}"))
}

fn summary(playlist: &Playlist) -> String {
    let mut line = format!(
        "{} - {} ({} song(s))",
        playlist.id,
        playlist.name,
        playlist.songs.len()
    );
    if let Some(expires_at) = playlist.expires_at.filter(|_| playlist.is_vibe) {
        line.push_str(&format!(", vibe until {}", expires_at.format("%Y-%m-%d %H:%M")));
    }
    line
}
