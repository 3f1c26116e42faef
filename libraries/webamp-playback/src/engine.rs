//! Playback engine
//!
//! Synchronous, single-owner state machine behind the controller. It owns
//! the queue, the transport state and at most one live adapter, and turns
//! commands and adapter signals into phase transitions. Discrete events and
//! usage reports accumulate internally until the owner drains them.
//!
//! Every adapter construction gets a fresh generation number. Signals
//! carrying any other generation belong to an adapter that has already been
//! torn down and are dropped.

use crate::adapter::{
    AdapterEvent, AdapterEventSink, AdapterRequest, AdapterSignal, AdapterState, MediaAdapter,
    MediaBackend,
};
use crate::error::Result;
use crate::events::{PlaybackEvent, UsageReport};
use crate::queue::PlaybackQueue;
use crate::types::{PlaybackConfig, PlaybackPhase, PlaybackSnapshot};
use crate::volume::Volume;
use std::sync::Arc;
use tokio::sync::mpsc;
use webamp_core::{resolve_playable_id, PlayableId, PlaylistId, Track};

/// What a signal did to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    /// Stale, duplicate or irrelevant signal
    Ignored,

    /// State changed without finishing or starting anything
    Updated,

    /// Adapter of this generation became ready and started playing
    Ready { generation: u64 },

    /// Adapter of this generation failed and was torn down
    Failed { generation: u64, message: String },

    /// Track ended and the next track is loading under a new generation
    Advanced { generation: u64 },

    /// Track ended and restarted on the same adapter
    Repeated,

    /// Track ended with nothing left to play
    Stopped,
}

struct LiveAdapter {
    generation: u64,
    handle: Box<dyn MediaAdapter>,
    ready: bool,
}

/// Playback state machine
pub struct PlaybackEngine {
    backend: Arc<dyn MediaBackend>,
    signals: mpsc::UnboundedSender<AdapterSignal>,
    config: PlaybackConfig,

    phase: PlaybackPhase,
    current_track: Option<Track>,
    queue: PlaybackQueue,

    // Queue identity usage is reported against
    session: Option<PlaylistId>,

    position_secs: f64,
    duration_secs: f64,
    volume: Volume,
    shuffle: bool,
    repeat: bool,

    adapter: Option<LiveAdapter>,
    generation: u64,

    // Incremented on every entry into `Playing`
    playing_epoch: u64,

    pending_events: Vec<PlaybackEvent>,
    pending_usage: Vec<UsageReport>,
}

impl PlaybackEngine {
    /// Create an idle engine
    ///
    /// Adapters built by `backend` report through `signals`; the owner is
    /// expected to feed what arrives there back into [`Self::handle_signal`].
    pub fn new(
        backend: Arc<dyn MediaBackend>,
        signals: mpsc::UnboundedSender<AdapterSignal>,
        config: PlaybackConfig,
    ) -> Self {
        let mut volume = Volume::new(config.volume);
        if config.muted {
            volume.mute();
        }

        Self {
            backend,
            signals,
            phase: PlaybackPhase::Idle,
            current_track: None,
            queue: PlaybackQueue::new(),
            session: None,
            position_secs: 0.0,
            duration_secs: 0.0,
            volume,
            shuffle: config.shuffle,
            repeat: config.repeat,
            adapter: None,
            generation: 0,
            playing_epoch: 0,
            pending_events: Vec::new(),
            pending_usage: Vec::new(),
            config,
        }
    }

    // ===== Transport =====

    /// Start playing `track`
    ///
    /// Resolution happens before anything else; an unresolvable track leaves
    /// the engine untouched. A supplied queue replaces the current one and a
    /// supplied identity starts a new usage session (recorded immediately).
    ///
    /// Returns the generation of the adapter now loading.
    pub fn play(
        &mut self,
        track: Track,
        queue: Option<Vec<Track>>,
        identity: Option<PlaylistId>,
    ) -> Result<u64> {
        let playable = resolve_playable_id(&track)?;

        if let Some(tracks) = queue {
            self.queue.set_queue(tracks, Some(track.id.clone()));
            self.emit(PlaybackEvent::QueueChanged {
                length: self.queue.len(),
            });
        }

        self.session = identity;
        if let Some(id) = &self.session {
            self.pending_usage.push(UsageReport::PlayStarted(id.clone()));
        }

        self.start(track, playable)
    }

    /// Play the track after the current one
    ///
    /// `Ok(None)` when nothing is current or the queue has nothing to offer.
    pub fn play_next(&mut self) -> Result<Option<u64>> {
        let Some(current) = self.current_track.as_ref().map(|t| t.id.clone()) else {
            return Ok(None);
        };

        match self.queue.next(&current, self.shuffle) {
            Some(track) => self.continue_with(track).map(Some),
            None => {
                tracing::debug!("No next track after {}", current);
                Ok(None)
            }
        }
    }

    /// Play the track before the current one
    pub fn play_previous(&mut self) -> Result<Option<u64>> {
        let Some(current) = self.current_track.as_ref().map(|t| t.id.clone()) else {
            return Ok(None);
        };

        match self.queue.previous(&current, self.shuffle) {
            Some(track) => self.continue_with(track).map(Some),
            None => {
                tracing::debug!("No previous track before {}", current);
                Ok(None)
            }
        }
    }

    /// Pause a playing track
    pub fn pause(&mut self) {
        if self.phase != PlaybackPhase::Playing {
            return;
        }
        if let Some(adapter) = self.ready_adapter_mut() {
            adapter.pause();
            self.set_phase(PlaybackPhase::Paused);
        }
    }

    /// Resume a paused track, or restart a stopped one
    pub fn resume(&mut self) {
        if !matches!(self.phase, PlaybackPhase::Paused | PlaybackPhase::Idle)
            || self.current_track.is_none()
        {
            return;
        }
        if let Some(adapter) = self.ready_adapter_mut() {
            adapter.play();
            self.set_phase(PlaybackPhase::Playing);
        }
    }

    /// Stop playback and rewind
    ///
    /// A ready adapter is kept so the track can be resumed. An adapter that
    /// is still loading is destroyed; its generation is returned so a caller
    /// waiting on it can be told.
    pub fn stop(&mut self) -> Option<u64> {
        match self.phase {
            PlaybackPhase::Loading => {
                let cancelled = self.adapter.as_ref().map(|a| a.generation);
                self.teardown_adapter();
                self.position_secs = 0.0;
                self.duration_secs = 0.0;
                self.set_phase(PlaybackPhase::Idle);
                cancelled
            }
            PlaybackPhase::Playing | PlaybackPhase::Paused | PlaybackPhase::Ended => {
                if let Some(adapter) = self.ready_adapter_mut() {
                    adapter.stop();
                }
                self.position_secs = 0.0;
                self.set_phase(PlaybackPhase::Idle);
                None
            }
            PlaybackPhase::Idle | PlaybackPhase::Error => None,
        }
    }

    /// Seek within the current track, clamped to `[0, duration]`
    ///
    /// While the duration is still unknown (0) only negative targets are
    /// clamped.
    pub fn seek_to(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            tracing::warn!("Ignoring seek to non-finite position");
            return;
        }

        self.refresh_duration();
        let target = if self.duration_secs > 0.0 {
            seconds.clamp(0.0, self.duration_secs)
        } else {
            seconds.max(0.0)
        };
        if let Some(adapter) = self.ready_adapter_mut() {
            adapter.seek_to(target);
            self.position_secs = target;
        }
    }

    // ===== Settings =====

    /// Set volume level (clamped to 100)
    ///
    /// A level above zero while muted also un-mutes. Zero never mutes.
    pub fn set_volume(&mut self, level: u8) {
        let level = level.min(100);
        let unmuted = self.volume.set_level(level);

        if let Some(adapter) = self.ready_adapter_mut() {
            adapter.set_volume(level);
            if unmuted {
                adapter.unmute();
            }
        }
        self.emit_volume_changed();
    }

    /// Toggle mute, returning the new mute state
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.volume.toggle_mute();
        let level = self.volume.level();

        if let Some(adapter) = self.ready_adapter_mut() {
            if muted {
                adapter.mute();
            } else {
                adapter.unmute();
                adapter.set_volume(level);
            }
        }
        self.emit_volume_changed();
        muted
    }

    /// Toggle shuffle, returning the new flag
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.emit_modes_changed();
        self.shuffle
    }

    /// Toggle repeat, returning the new flag
    pub fn toggle_repeat(&mut self) -> bool {
        self.repeat = !self.repeat;
        self.emit_modes_changed();
        self.repeat
    }

    // ===== Adapter signals =====

    /// Apply one adapter signal
    pub fn handle_signal(&mut self, signal: AdapterSignal) -> SignalOutcome {
        let Some(live) = self
            .adapter
            .as_ref()
            .filter(|a| a.generation == signal.generation)
        else {
            tracing::debug!(
                "Dropping {:?} from stale adapter generation {}",
                signal.event,
                signal.generation
            );
            return SignalOutcome::Ignored;
        };
        let ready = live.ready;

        match signal.event {
            AdapterEvent::Ready if !ready => self.on_ready(),
            AdapterEvent::Error(message) => self.on_error(message),
            AdapterEvent::StateChange(state) if ready => self.on_state_change(state),
            _ => SignalOutcome::Ignored,
        }
    }

    fn on_ready(&mut self) -> SignalOutcome {
        let muted = self.volume.is_muted();
        let level = self.volume.level();

        let Some(live) = self.adapter.as_mut() else {
            return SignalOutcome::Ignored;
        };
        live.ready = true;
        let generation = live.generation;
        let duration = live.handle.duration_secs();

        live.handle.play();
        if muted {
            live.handle.mute();
        } else {
            live.handle.set_volume(level);
        }

        self.duration_secs = known_duration(duration);
        self.position_secs = 0.0;
        self.set_phase(PlaybackPhase::Playing);

        SignalOutcome::Ready { generation }
    }

    fn on_error(&mut self, message: String) -> SignalOutcome {
        let generation = self.adapter.as_ref().map_or(0, |a| a.generation);
        tracing::error!("Adapter {} reported an error: {}", generation, message);

        self.teardown_adapter();
        self.position_secs = 0.0;
        self.duration_secs = 0.0;
        self.set_phase(PlaybackPhase::Error);
        self.emit(PlaybackEvent::Error {
            message: message.clone(),
        });
        self.set_phase(PlaybackPhase::Idle);

        SignalOutcome::Failed {
            generation,
            message,
        }
    }

    fn on_state_change(&mut self, state: AdapterState) -> SignalOutcome {
        match (state, self.phase) {
            (AdapterState::Playing, PlaybackPhase::Paused) => {
                self.set_phase(PlaybackPhase::Playing);
                SignalOutcome::Updated
            }
            (AdapterState::Paused, PlaybackPhase::Playing) => {
                self.set_phase(PlaybackPhase::Paused);
                SignalOutcome::Updated
            }
            (AdapterState::Ended, PlaybackPhase::Playing | PlaybackPhase::Paused) => {
                self.on_ended()
            }
            _ => SignalOutcome::Ignored,
        }
    }

    fn on_ended(&mut self) -> SignalOutcome {
        if let Some(track_id) = self.current_track.as_ref().map(|t| t.id.clone()) {
            self.emit(PlaybackEvent::TrackFinished { track_id });
        }
        self.position_secs = 0.0;
        self.set_phase(PlaybackPhase::Ended);

        if self.repeat {
            if let Some(adapter) = self.ready_adapter_mut() {
                adapter.seek_to(0.0);
                adapter.play();
                self.set_phase(PlaybackPhase::Playing);
                return SignalOutcome::Repeated;
            }
        }

        match self.play_next() {
            Ok(Some(generation)) => SignalOutcome::Advanced { generation },
            Ok(None) => {
                tracing::debug!("Queue exhausted");
                self.set_phase(PlaybackPhase::Idle);
                SignalOutcome::Stopped
            }
            Err(e) => {
                tracing::warn!("Auto-advance failed: {}", e);
                self.emit(PlaybackEvent::Error {
                    message: e.to_string(),
                });
                self.set_phase(PlaybackPhase::Idle);
                SignalOutcome::Updated
            }
        }
    }

    // ===== Timers =====

    /// Re-read the adapter position while playing
    ///
    /// Returns `true` when the published position changed.
    pub fn sample_position(&mut self) -> bool {
        if self.phase != PlaybackPhase::Playing {
            return false;
        }
        let duration_changed = self.refresh_duration();
        let duration = self.duration_secs;
        let Some(adapter) = self.ready_adapter_mut() else {
            return duration_changed;
        };

        let sampled = adapter.position_secs();
        if !sampled.is_finite() {
            return duration_changed;
        }
        let position = if duration > 0.0 {
            sampled.clamp(0.0, duration)
        } else {
            sampled.max(0.0)
        };

        if (position - self.position_secs).abs() > f64::EPSILON {
            self.position_secs = position;
            true
        } else {
            duration_changed
        }
    }

    /// Record one usage tick for the current session
    ///
    /// Reports the fixed tick length, not the actual elapsed time.
    pub fn record_listen_tick(&mut self) -> bool {
        if self.phase != PlaybackPhase::Playing {
            return false;
        }
        let Some(queue) = self.session.clone() else {
            return false;
        };

        self.pending_usage.push(UsageReport::Listened {
            queue,
            seconds: self.config.usage_tick_interval().as_secs(),
        });
        true
    }

    /// Destroy the adapter and go idle
    pub fn shutdown(&mut self) {
        self.teardown_adapter();
        self.position_secs = 0.0;
        self.set_phase(PlaybackPhase::Idle);
    }

    // ===== Observation =====

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub fn session(&self) -> Option<&PlaylistId> {
        self.session.as_ref()
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Number of times the engine has entered `Playing`
    pub fn playing_epoch(&self) -> u64 {
        self.playing_epoch
    }

    /// Generation of an adapter that has not reported ready yet
    pub fn pending_generation(&self) -> Option<u64> {
        self.adapter
            .as_ref()
            .filter(|a| !a.ready)
            .map(|a| a.generation)
    }

    /// Whether an adapter instance is alive
    pub fn has_adapter(&self) -> bool {
        self.adapter.is_some()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            phase: self.phase,
            current_track: self.current_track.clone(),
            position_secs: self.position_secs,
            duration_secs: self.duration_secs,
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
            shuffle: self.shuffle,
            repeat: self.repeat,
            queue_len: self.queue.len(),
            queue_identity: self.session.clone(),
        }
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Take all usage reports produced since the last drain
    pub fn drain_usage(&mut self) -> Vec<UsageReport> {
        std::mem::take(&mut self.pending_usage)
    }

    // ===== Internal =====

    /// Play a track picked from the queue, keeping queue and session
    fn continue_with(&mut self, track: Track) -> Result<u64> {
        let playable = resolve_playable_id(&track)?;
        self.start(track, playable)
    }

    fn start(&mut self, track: Track, playable: PlayableId) -> Result<u64> {
        let previous_track_id = self.current_track.as_ref().map(|t| t.id.clone());

        self.teardown_adapter();
        self.position_secs = 0.0;
        self.duration_secs = 0.0;
        self.queue.set_current(Some(track.id.clone()));

        self.generation += 1;
        let generation = self.generation;

        let request = AdapterRequest {
            host_surface: self.config.host_surface.clone(),
            playable_id: playable,
            options: self.config.player_options.clone(),
        };
        let sink = AdapterEventSink::new(generation, self.signals.clone());

        tracing::info!("Loading \"{}\" by {} ({})", track.title, track.artist, request.playable_id);
        let track_id = track.id.clone();
        self.current_track = Some(track);
        self.set_phase(PlaybackPhase::Loading);

        match self.backend.create(request, sink) {
            Ok(handle) => {
                self.adapter = Some(LiveAdapter {
                    generation,
                    handle,
                    ready: false,
                });
                self.emit(PlaybackEvent::TrackChanged {
                    track_id,
                    previous_track_id,
                });
                Ok(generation)
            }
            Err(e) => {
                tracing::error!("Failed to construct adapter: {}", e);
                self.set_phase(PlaybackPhase::Idle);
                Err(e.into())
            }
        }
    }

    /// Embeds may report 0 at ready; pick up the real duration once known
    fn refresh_duration(&mut self) -> bool {
        if self.duration_secs > 0.0 {
            return false;
        }
        let Some(adapter) = self.ready_adapter_mut() else {
            return false;
        };

        let duration = known_duration(adapter.duration_secs());
        if duration > 0.0 {
            tracing::debug!("Duration became known: {:.1}s", duration);
            self.duration_secs = duration;
            true
        } else {
            false
        }
    }

    fn teardown_adapter(&mut self) {
        if let Some(mut live) = self.adapter.take() {
            tracing::debug!("Destroying adapter generation {}", live.generation);
            live.handle.destroy();
        }
    }

    fn ready_adapter_mut(&mut self) -> Option<&mut dyn MediaAdapter> {
        match self.adapter.as_mut() {
            Some(live) if live.ready => Some(live.handle.as_mut()),
            _ => None,
        }
    }

    fn set_phase(&mut self, phase: PlaybackPhase) {
        if self.phase == phase {
            return;
        }
        tracing::debug!("Playback phase {:?} -> {:?}", self.phase, phase);

        if phase == PlaybackPhase::Playing {
            self.playing_epoch += 1;
        }
        self.phase = phase;
        self.emit(PlaybackEvent::StateChanged { phase });
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }

    fn emit_volume_changed(&mut self) {
        self.emit(PlaybackEvent::VolumeChanged {
            level: self.volume.level(),
            is_muted: self.volume.is_muted(),
        });
    }

    fn emit_modes_changed(&mut self) {
        self.emit(PlaybackEvent::ModesChanged {
            shuffle: self.shuffle,
            repeat: self.repeat,
        });
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.teardown_adapter();
    }
}

/// Duration reported by an adapter, with anything unusable read as unknown (0)
fn known_duration(reported: f64) -> f64 {
    if reported.is_finite() {
        reported.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use crate::testing::{AdapterCall, MockBackend};
    use webamp_core::{Provider, ResolutionError, TrackId};

    fn track(id: &str) -> Track {
        Track::with_id(
            TrackId::new(id),
            format!("Song {}", id),
            "Artist",
            format!("https://www.youtube.com/watch?v=vid{}", id),
            Provider::Youtube,
        )
    }

    fn engine(backend: &MockBackend) -> (PlaybackEngine, mpsc::UnboundedReceiver<AdapterSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = PlaybackEngine::new(Arc::new(backend.clone()), tx, PlaybackConfig::default());
        (engine, rx)
    }

    fn ready(engine: &mut PlaybackEngine, generation: u64) {
        let outcome = engine.handle_signal(AdapterSignal {
            generation,
            event: AdapterEvent::Ready,
        });
        assert_eq!(outcome, SignalOutcome::Ready { generation });
    }

    #[test]
    fn test_play_loads_then_ready_plays() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        let generation = engine.play(track("a"), None, None).unwrap();
        assert_eq!(engine.phase(), PlaybackPhase::Loading);
        assert_eq!(engine.pending_generation(), Some(generation));

        ready(&mut engine, generation);
        assert_eq!(engine.phase(), PlaybackPhase::Playing);
        assert_eq!(engine.snapshot().duration_secs, 180.0);
        assert_eq!(
            backend.calls(0),
            vec![AdapterCall::Play, AdapterCall::SetVolume(100)]
        );
    }

    #[test]
    fn test_unresolvable_track_touches_nothing() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        let bad = Track::with_id(TrackId::new("x"), "X", "Y", "https://example.com/nothing", Provider::Youtube);
        let result = engine.play(bad, None, Some(PlaylistId::new("p")));

        assert!(matches!(
            result,
            Err(PlaybackError::Resolution(ResolutionError::UnrecognizedFormat { .. }))
        ));
        assert_eq!(engine.phase(), PlaybackPhase::Idle);
        assert_eq!(backend.instance_count(), 0);
        assert!(engine.drain_usage().is_empty());
    }

    #[test]
    fn test_unsupported_provider_fails_resolution() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        let sc = Track::with_id(TrackId::new("s"), "S", "A", "https://soundcloud.com/a/b", Provider::Soundcloud);
        assert!(matches!(
            engine.play(sc, None, None),
            Err(PlaybackError::Resolution(ResolutionError::UnsupportedProvider(
                Provider::Soundcloud
            )))
        ));
    }

    #[test]
    fn test_second_play_destroys_first_adapter() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        let first = engine.play(track("a"), None, None).unwrap();
        ready(&mut engine, first);
        backend.set_position(0, 42.0);
        engine.sample_position();

        let second = engine.play(track("b"), None, None).unwrap();
        assert!(backend.is_destroyed(0));
        assert_eq!(backend.live_count(), 1);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.position_secs, 0.0);
        assert_eq!(snapshot.duration_secs, 0.0);

        // Late events from the first adapter are dropped
        let outcome = engine.handle_signal(AdapterSignal {
            generation: first,
            event: AdapterEvent::StateChange(AdapterState::Ended),
        });
        assert_eq!(outcome, SignalOutcome::Ignored);
        assert_eq!(engine.pending_generation(), Some(second));
    }

    #[test]
    fn test_error_before_ready_goes_idle_without_advancing() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);
        let queue = vec![track("a"), track("b")];

        let generation = engine.play(track("a"), Some(queue), None).unwrap();
        let outcome = engine.handle_signal(AdapterSignal {
            generation,
            event: AdapterEvent::Error("150".to_string()),
        });

        assert_eq!(
            outcome,
            SignalOutcome::Failed {
                generation,
                message: "150".to_string()
            }
        );
        assert_eq!(engine.phase(), PlaybackPhase::Idle);
        assert!(backend.is_destroyed(0));
        assert_eq!(backend.instance_count(), 1);

        let events = engine.drain_events();
        assert!(events.contains(&PlaybackEvent::StateChanged {
            phase: PlaybackPhase::Error
        }));
        assert!(events.contains(&PlaybackEvent::Error {
            message: "150".to_string()
        }));
    }

    #[test]
    fn test_end_with_repeat_restarts_same_adapter() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);
        engine.toggle_repeat();

        let generation = engine.play(track("a"), Some(vec![track("a"), track("b")]), None).unwrap();
        ready(&mut engine, generation);

        let outcome = engine.handle_signal(AdapterSignal {
            generation,
            event: AdapterEvent::StateChange(AdapterState::Ended),
        });

        assert_eq!(outcome, SignalOutcome::Repeated);
        assert_eq!(engine.phase(), PlaybackPhase::Playing);
        assert_eq!(backend.instance_count(), 1);
        assert!(backend
            .calls(0)
            .ends_with(&[AdapterCall::SeekTo(0.0), AdapterCall::Play]));
    }

    #[test]
    fn test_end_without_repeat_advances_once() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        let generation = engine
            .play(track("a"), Some(vec![track("a"), track("b"), track("c")]), None)
            .unwrap();
        ready(&mut engine, generation);

        let ended = AdapterSignal {
            generation,
            event: AdapterEvent::StateChange(AdapterState::Ended),
        };
        let outcome = engine.handle_signal(ended.clone());
        assert!(matches!(outcome, SignalOutcome::Advanced { .. }));
        assert_eq!(engine.current_track().unwrap().id.as_str(), "b");

        // A duplicate end from the old adapter does not advance again
        assert_eq!(engine.handle_signal(ended), SignalOutcome::Ignored);
        assert_eq!(backend.instance_count(), 2);
        assert_eq!(engine.phase(), PlaybackPhase::Loading);
    }

    #[test]
    fn test_end_of_exhausted_queue_goes_idle() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        // Queue without the current track: nothing to advance to
        let generation = engine.play(track("a"), Some(vec![track("b")]), None).unwrap();
        ready(&mut engine, generation);

        let outcome = engine.handle_signal(AdapterSignal {
            generation,
            event: AdapterEvent::StateChange(AdapterState::Ended),
        });
        assert_eq!(outcome, SignalOutcome::Stopped);
        assert_eq!(engine.phase(), PlaybackPhase::Idle);
    }

    #[test]
    fn test_navigation_from_middle() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);
        let queue = vec![track("a"), track("b"), track("c")];

        engine.play(track("b"), Some(queue), None).unwrap();
        engine.play_next().unwrap();
        assert_eq!(engine.current_track().unwrap().id.as_str(), "c");

        engine.play_previous().unwrap();
        engine.play_previous().unwrap();
        assert_eq!(engine.current_track().unwrap().id.as_str(), "a");
    }

    #[test]
    fn test_next_without_current_is_noop() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        assert_eq!(engine.play_next().unwrap(), None);
        assert_eq!(engine.play_previous().unwrap(), None);
        assert_eq!(backend.instance_count(), 0);
    }

    #[test]
    fn test_session_recorded_only_on_explicit_play() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);
        let id = PlaylistId::new("mix");

        engine
            .play(track("a"), Some(vec![track("a"), track("b")]), Some(id.clone()))
            .unwrap();
        engine.play_next().unwrap();

        assert_eq!(engine.drain_usage(), vec![UsageReport::PlayStarted(id.clone())]);
        assert_eq!(engine.session(), Some(&id));

        engine.play(track("a"), None, None).unwrap();
        assert_eq!(engine.session(), None);
    }

    #[test]
    fn test_transport_requires_ready_adapter() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        engine.play(track("a"), None, None).unwrap();
        engine.pause();
        engine.seek_to(10.0);
        engine.set_volume(30);

        assert_eq!(engine.phase(), PlaybackPhase::Loading);
        assert!(backend.calls(0).is_empty());
        assert_eq!(engine.snapshot().volume, 30);
    }

    #[test]
    fn test_pause_resume_and_redundant_calls() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        let generation = engine.play(track("a"), None, None).unwrap();
        ready(&mut engine, generation);

        engine.pause();
        engine.pause();
        assert_eq!(engine.phase(), PlaybackPhase::Paused);
        engine.resume();
        engine.resume();
        assert_eq!(engine.phase(), PlaybackPhase::Playing);

        let calls = backend.calls(0);
        assert_eq!(calls.iter().filter(|c| **c == AdapterCall::Pause).count(), 1);
        assert_eq!(calls.iter().filter(|c| **c == AdapterCall::Play).count(), 2);
    }

    #[test]
    fn test_stop_keeps_adapter_and_rewinds() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        let generation = engine.play(track("a"), None, None).unwrap();
        ready(&mut engine, generation);
        backend.set_position(0, 30.0);
        engine.sample_position();

        assert_eq!(engine.stop(), None);
        assert_eq!(engine.phase(), PlaybackPhase::Idle);
        assert_eq!(engine.snapshot().position_secs, 0.0);
        assert!(engine.has_adapter());
        assert!(backend.calls(0).contains(&AdapterCall::Stop));

        engine.resume();
        assert_eq!(engine.phase(), PlaybackPhase::Playing);
    }

    #[test]
    fn test_stop_while_loading_cancels() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        let generation = engine.play(track("a"), None, None).unwrap();
        assert_eq!(engine.stop(), Some(generation));
        assert!(!engine.has_adapter());
        assert!(backend.is_destroyed(0));

        let outcome = engine.handle_signal(AdapterSignal {
            generation,
            event: AdapterEvent::Ready,
        });
        assert_eq!(outcome, SignalOutcome::Ignored);
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let backend = MockBackend::new().with_duration(100.0);
        let (mut engine, _rx) = engine(&backend);

        let generation = engine.play(track("a"), None, None).unwrap();
        ready(&mut engine, generation);

        engine.seek_to(250.0);
        assert_eq!(engine.snapshot().position_secs, 100.0);
        engine.seek_to(-5.0);
        assert_eq!(engine.snapshot().position_secs, 0.0);
        assert_eq!(
            backend.calls(0)[2..],
            [AdapterCall::SeekTo(100.0), AdapterCall::SeekTo(0.0)]
        );
    }

    #[test]
    fn test_unknown_duration_does_not_block_seek() {
        let backend = MockBackend::new().with_duration(0.0);
        let (mut engine, _rx) = engine(&backend);

        let generation = engine.play(track("a"), None, None).unwrap();
        ready(&mut engine, generation);

        engine.seek_to(30.0);
        assert_eq!(engine.snapshot().position_secs, 30.0);
        assert!(backend.calls(0).contains(&AdapterCall::SeekTo(30.0)));

        // The embed reports its real length later
        backend.set_duration(0, 200.0);
        assert!(engine.sample_position());
        assert_eq!(engine.snapshot().duration_secs, 200.0);

        engine.seek_to(500.0);
        assert_eq!(engine.snapshot().position_secs, 200.0);
    }

    #[test]
    fn test_sampled_position_never_exceeds_duration() {
        let backend = MockBackend::new().with_duration(60.0);
        let (mut engine, _rx) = engine(&backend);

        let generation = engine.play(track("a"), None, None).unwrap();
        ready(&mut engine, generation);

        backend.set_position(0, 61.5);
        assert!(engine.sample_position());
        assert_eq!(engine.snapshot().position_secs, 60.0);
        assert!(!engine.sample_position());
    }

    #[test]
    fn test_mute_toggle_restores_volume() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        let generation = engine.play(track("a"), None, None).unwrap();
        ready(&mut engine, generation);

        engine.set_volume(80);
        assert!(engine.toggle_mute());
        assert_eq!(engine.snapshot().effective_volume(), 0);
        assert!(!engine.toggle_mute());
        assert_eq!(engine.snapshot().effective_volume(), 80);

        assert!(backend.calls(0).ends_with(&[
            AdapterCall::Mute,
            AdapterCall::Unmute,
            AdapterCall::SetVolume(80)
        ]));
    }

    #[test]
    fn test_volume_zero_does_not_mute_and_positive_unmutes() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        engine.set_volume(0);
        assert!(!engine.snapshot().muted);

        engine.toggle_mute();
        engine.set_volume(25);
        let snapshot = engine.snapshot();
        assert!(!snapshot.muted);
        assert_eq!(snapshot.effective_volume(), 25);
    }

    #[test]
    fn test_mute_survives_track_change() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);
        engine.toggle_mute();

        let generation = engine.play(track("a"), None, None).unwrap();
        ready(&mut engine, generation);
        assert_eq!(backend.calls(0), vec![AdapterCall::Play, AdapterCall::Mute]);
    }

    #[test]
    fn test_listen_tick_reports_fixed_increment() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);
        let id = PlaylistId::new("p");

        let generation = engine.play(track("a"), None, Some(id.clone())).unwrap();
        assert!(!engine.record_listen_tick());
        ready(&mut engine, generation);
        assert!(engine.record_listen_tick());

        assert_eq!(
            engine.drain_usage(),
            vec![
                UsageReport::PlayStarted(id.clone()),
                UsageReport::Listened {
                    queue: id,
                    seconds: 10
                }
            ]
        );
    }

    #[test]
    fn test_construction_failure_goes_idle() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);
        backend.fail_next_create("no surface");

        let result = engine.play(track("a"), None, None);
        assert!(matches!(result, Err(PlaybackError::AdapterConstruction(_))));
        assert_eq!(engine.phase(), PlaybackPhase::Idle);
        assert!(!engine.has_adapter());
    }

    #[test]
    fn test_drop_destroys_adapter() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);

        engine.play(track("a"), None, None).unwrap();
        drop(engine);
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn test_playing_epoch_counts_entries() {
        let backend = MockBackend::new();
        let (mut engine, _rx) = engine(&backend);
        engine.toggle_repeat();

        let generation = engine.play(track("a"), None, None).unwrap();
        ready(&mut engine, generation);
        assert_eq!(engine.playing_epoch(), 1);

        engine.handle_signal(AdapterSignal {
            generation,
            event: AdapterEvent::StateChange(AdapterState::Ended),
        });
        assert_eq!(engine.playing_epoch(), 2);
    }
}
