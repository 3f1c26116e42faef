//! Terminal player
//!
//! Plays a stored playlist through the simulated backend. Each line typed
//! on stdin is treated as a key press and dispatched through the stored
//! shortcut bindings; an empty line stands for the space bar.

use crate::config::CliConfig;
use crate::simulated::SimulatedBackend;
use anyhow::{bail, Context};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use webamp_core::{format_duration_label, PlaylistId, TrackId};
use webamp_playback::{KeyPress, PlaybackController, PlaybackEvent, PlaybackPhase};
use webamp_storage::LocalStorageContext;

/// Flags of the `play` subcommand
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayOptions {
    pub shuffle: bool,
    pub repeat: bool,
}

/// Play `id` until playback stops or the user quits
pub async fn run_player(
    ctx: LocalStorageContext,
    config: &CliConfig,
    id: &PlaylistId,
    options: PlayOptions,
) -> anyhow::Result<()> {
    let playlist = ctx
        .get_playlist(id)
        .await?
        .with_context(|| format!("No playlist {id}"))?;
    let Some(first) = playlist.songs.first().cloned() else {
        bail!("Playlist {} has no songs", playlist.name);
    };
    let bindings = ctx.shortcuts().await?;

    let mut playback = config.playback.clone();
    playback.shuffle |= options.shuffle;
    playback.repeat |= options.repeat;

    let backend = SimulatedBackend::new(config.simulation.clone());
    let (controller, task) =
        PlaybackController::spawn(Arc::new(backend), Arc::new(ctx), playback);

    let titles: HashMap<TrackId, String> = playlist
        .songs
        .iter()
        .map(|song| (song.id.clone(), format!("{} - {}", song.artist, song.title)))
        .collect();
    let printer = tokio::spawn(print_events(controller.events(), titles));

    println!(
        "Playing {} ({} song(s)). Keys: '{}' (empty line) play/pause, '{}' next, '{}' previous, '{}' shuffle, '{}' repeat, 'q' quit",
        playlist.name,
        playlist.songs.len(),
        bindings.play_pause,
        bindings.next,
        bindings.previous,
        bindings.shuffle,
        bindings.repeat
    );

    let outcome = async {
        controller
            .play(first, Some(playlist.songs.clone()), Some(playlist.id.clone()))
            .await?;
        drive(&controller, &bindings).await
    }
    .await;

    controller.shutdown().await.ok();
    task.await.ok();
    printer.abort();

    outcome
}

async fn drive(
    controller: &PlaybackController,
    bindings: &webamp_core::KeyBindings,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut state = controller.subscribe();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let key = match line.trim_end_matches(['\r', '\n']) {
                    "" => " ".to_string(),
                    "q" | "quit" => break,
                    other => other.to_string(),
                };

                match controller.handle_key_press(bindings, &KeyPress::new(key.clone())).await {
                    Ok(true) => {}
                    Ok(false) => println!("Unbound key {key:?}"),
                    Err(e) => tracing::warn!("Shortcut failed: {}", e),
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                if snapshot.phase == PlaybackPhase::Idle {
                    println!("Playback stopped");
                    break;
                }
                if snapshot.is_playing() && snapshot.duration_secs > 0.0 {
                    tracing::trace!(
                        "{} / {}",
                        format_duration_label(snapshot.position_secs),
                        format_duration_label(snapshot.duration_secs)
                    );
                }
            }
        }
    }

    Ok(())
}

async fn print_events(
    mut events: tokio::sync::broadcast::Receiver<PlaybackEvent>,
    titles: HashMap<TrackId, String>,
) {
    let title = |id: &TrackId| titles.get(id).cloned().unwrap_or_else(|| id.to_string());

    loop {
        match events.recv().await {
            Ok(PlaybackEvent::TrackChanged { track_id, .. }) => {
                println!("> {}", title(&track_id));
            }
            Ok(PlaybackEvent::StateChanged { phase }) => match phase {
                PlaybackPhase::Paused => println!("  paused"),
                PlaybackPhase::Error => println!("  playback error"),
                _ => {}
            },
            Ok(PlaybackEvent::ModesChanged { shuffle, repeat }) => {
                println!("  shuffle {}, repeat {}", on_off(shuffle), on_off(repeat));
            }
            Ok(PlaybackEvent::VolumeChanged { level, is_muted }) => {
                println!("  volume {level}{}", if is_muted { " (muted)" } else { "" });
            }
            Ok(PlaybackEvent::Error { message }) => println!("  error: {message}"),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!("Event printer skipped {} event(s)", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
