//! Playback controller
//!
//! A cloneable handle in front of a single actor task. The actor owns the
//! [`PlaybackEngine`], the adapter signal receiver and both timers, so every
//! state change happens on one task in arrival order. Callers talk to it
//! over a command channel and get their answer on a oneshot once the
//! resulting state has been published.
//!
//! `play`, `play_next` and `play_previous` resolve only when the new adapter
//! reports ready. A newer play or a stop in the meantime fails the older
//! caller with [`PlaybackError::Interrupted`]. While the backend is not
//! loaded the actor parks the latest of these commands and polls for it, so
//! the newest request still wins regardless of when the backend shows up.

use crate::adapter::{AdapterError, AdapterSignal, MediaBackend};
use crate::engine::{PlaybackEngine, SignalOutcome};
use crate::error::{PlaybackError, Result};
use crate::events::{PlaybackEvent, UsageReport};
use crate::types::{PlaybackConfig, PlaybackSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use webamp_core::{resolve_playable_id, PlaylistId, Track, UsageRecorder};

const EVENT_CHANNEL_CAPACITY: usize = 64;

enum Command {
    Play {
        track: Track,
        queue: Option<Vec<Track>>,
        identity: Option<PlaylistId>,
        reply: oneshot::Sender<Result<()>>,
    },
    PlayNext {
        reply: oneshot::Sender<Result<bool>>,
    },
    PlayPrevious {
        reply: oneshot::Sender<Result<bool>>,
    },
    Pause {
        reply: oneshot::Sender<()>,
    },
    Resume {
        reply: oneshot::Sender<()>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    SeekTo {
        seconds: f64,
        reply: oneshot::Sender<()>,
    },
    SetVolume {
        level: u8,
        reply: oneshot::Sender<()>,
    },
    ToggleMute {
        reply: oneshot::Sender<bool>,
    },
    ToggleShuffle {
        reply: oneshot::Sender<bool>,
    },
    ToggleRepeat {
        reply: oneshot::Sender<bool>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

impl Command {
    /// Whether running this command constructs an adapter
    fn needs_backend(&self) -> bool {
        matches!(
            self,
            Self::Play { .. } | Self::PlayNext { .. } | Self::PlayPrevious { .. }
        )
    }

    /// Answer a transport command with `error` without running it
    fn reject(self, error: PlaybackError) {
        match self {
            Self::Play { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            Self::PlayNext { reply } | Self::PlayPrevious { reply } => {
                let _ = reply.send(Err(error));
            }
            _ => {}
        }
    }
}

/// Transport command waiting for the backend to load
struct Parked {
    command: Command,
    deadline: Instant,
}

/// Caller waiting for an adapter to become ready
enum Waiter {
    Play(oneshot::Sender<Result<()>>),
    Skip(oneshot::Sender<Result<bool>>),
}

impl Waiter {
    fn succeed(self) {
        match self {
            Self::Play(reply) => {
                let _ = reply.send(Ok(()));
            }
            Self::Skip(reply) => {
                let _ = reply.send(Ok(true));
            }
        }
    }

    fn fail(self, error: PlaybackError) {
        match self {
            Self::Play(reply) => {
                let _ = reply.send(Err(error));
            }
            Self::Skip(reply) => {
                let _ = reply.send(Err(error));
            }
        }
    }
}

/// Handle to a running playback controller
#[derive(Clone)]
pub struct PlaybackController {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<PlaybackSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackController {
    /// Start the controller task
    ///
    /// Must be called from within a tokio runtime. The task ends when
    /// [`Self::shutdown`] is called or every handle has been dropped; either
    /// way the live adapter is destroyed.
    pub fn spawn(
        backend: Arc<dyn MediaBackend>,
        recorder: Arc<dyn UsageRecorder>,
        config: PlaybackConfig,
    ) -> (Self, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (usage_tx, usage_rx) = mpsc::unbounded_channel();

        let engine = PlaybackEngine::new(Arc::clone(&backend), signal_tx, config);
        let (state_tx, state_rx) = watch::channel(engine.snapshot());

        tokio::spawn(forward_usage(recorder, usage_rx));

        let actor = ControllerActor {
            engine,
            backend,
            commands: command_rx,
            signals: signal_rx,
            state_tx,
            events_tx: events_tx.clone(),
            usage_tx,
            waiter: None,
            parked: None,
            backend_poll: None,
            position_timer: None,
            usage_timer: None,
            timer_epoch: 0,
        };
        let task = tokio::spawn(actor.run());

        let handle = Self {
            commands: command_tx,
            state: state_rx,
            events: events_tx,
        };
        (handle, task)
    }

    // ===== Transport =====

    /// Play `track`, optionally replacing the queue and starting a usage session
    ///
    /// Resolves once the track's adapter is ready and playing.
    pub async fn play(
        &self,
        track: Track,
        queue: Option<Vec<Track>>,
        identity: Option<PlaylistId>,
    ) -> Result<()> {
        resolve_playable_id(&track)?;

        self.request(|reply| Command::Play {
            track,
            queue,
            identity,
            reply,
        })
        .await?
    }

    /// Skip to the next track in the queue
    ///
    /// Returns `false` if there was nothing to skip to.
    pub async fn play_next(&self) -> Result<bool> {
        self.request(|reply| Command::PlayNext { reply }).await?
    }

    /// Go back to the previous track in the queue
    pub async fn play_previous(&self) -> Result<bool> {
        self.request(|reply| Command::PlayPrevious { reply }).await?
    }

    pub async fn pause(&self) -> Result<()> {
        self.request(|reply| Command::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.request(|reply| Command::Resume { reply }).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn seek_to(&self, seconds: f64) -> Result<()> {
        self.request(|reply| Command::SeekTo { seconds, reply })
            .await
    }

    // ===== Settings =====

    pub async fn set_volume(&self, level: u8) -> Result<()> {
        self.request(|reply| Command::SetVolume { level, reply })
            .await
    }

    /// Returns the new mute state
    pub async fn toggle_mute(&self) -> Result<bool> {
        self.request(|reply| Command::ToggleMute { reply }).await
    }

    /// Returns the new shuffle flag
    pub async fn toggle_shuffle(&self) -> Result<bool> {
        self.request(|reply| Command::ToggleShuffle { reply }).await
    }

    /// Returns the new repeat flag
    pub async fn toggle_repeat(&self) -> Result<bool> {
        self.request(|reply| Command::ToggleRepeat { reply }).await
    }

    /// Destroy the adapter and stop the controller task
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    // ===== Observation =====

    /// Latest published state
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.state.borrow().clone()
    }

    /// Watch receiver that sees every published state
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.state.clone()
    }

    /// Stream of discrete playback events
    pub fn events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    // ===== Internal =====

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .map_err(|_| PlaybackError::ControllerClosed)?;
        response.await.map_err(|_| PlaybackError::ControllerClosed)
    }
}

struct ControllerActor {
    engine: PlaybackEngine,
    backend: Arc<dyn MediaBackend>,
    commands: mpsc::UnboundedReceiver<Command>,
    signals: mpsc::UnboundedReceiver<AdapterSignal>,
    state_tx: watch::Sender<PlaybackSnapshot>,
    events_tx: broadcast::Sender<PlaybackEvent>,
    usage_tx: mpsc::UnboundedSender<UsageReport>,
    waiter: Option<(u64, Waiter)>,
    parked: Option<Parked>,
    backend_poll: Option<Interval>,
    position_timer: Option<Interval>,
    usage_timer: Option<Interval>,
    // Playing epoch the current timers were built for
    timer_epoch: u64,
}

impl ControllerActor {
    async fn run(mut self) {
        tracing::debug!("Playback controller started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    None => {
                        self.shutdown();
                        break;
                    }
                },
                Some(signal) = self.signals.recv() => self.handle_signal(signal),
                _ = next_tick(&mut self.backend_poll) => self.poll_backend(),
                _ = next_tick(&mut self.position_timer) => {
                    if self.engine.sample_position() {
                        self.flush();
                    }
                }
                _ = next_tick(&mut self.usage_timer) => {
                    self.engine.record_listen_tick();
                    self.flush();
                }
            }
        }

        tracing::debug!("Playback controller stopped");
    }

    /// Run one command; returns `false` once the actor should stop
    fn handle_command(&mut self, command: Command) -> bool {
        let Some(command) = self.gate(command) else {
            return true;
        };

        match command {
            Command::Play {
                track,
                queue,
                identity,
                reply,
            } => match self.engine.play(track, queue, identity) {
                Ok(generation) => {
                    self.await_ready(generation, Waiter::Play(reply));
                    self.flush();
                }
                Err(e) => {
                    self.flush();
                    let _ = reply.send(Err(e));
                }
            },
            Command::PlayNext { reply } => {
                let result = self.engine.play_next();
                self.skip(result, reply);
            }
            Command::PlayPrevious { reply } => {
                let result = self.engine.play_previous();
                self.skip(result, reply);
            }
            Command::Pause { reply } => {
                self.engine.pause();
                self.flush();
                let _ = reply.send(());
            }
            Command::Resume { reply } => {
                self.engine.resume();
                self.flush();
                let _ = reply.send(());
            }
            Command::Stop { reply } => {
                if let Some(parked) = self.parked.take() {
                    parked.command.reject(PlaybackError::Interrupted);
                }
                self.engine.stop();
                self.flush();
                let _ = reply.send(());
            }
            Command::SeekTo { seconds, reply } => {
                self.engine.seek_to(seconds);
                self.flush();
                let _ = reply.send(());
            }
            Command::SetVolume { level, reply } => {
                self.engine.set_volume(level);
                self.flush();
                let _ = reply.send(());
            }
            Command::ToggleMute { reply } => {
                let muted = self.engine.toggle_mute();
                self.flush();
                let _ = reply.send(muted);
            }
            Command::ToggleShuffle { reply } => {
                let shuffle = self.engine.toggle_shuffle();
                self.flush();
                let _ = reply.send(shuffle);
            }
            Command::ToggleRepeat { reply } => {
                let repeat = self.engine.toggle_repeat();
                self.flush();
                let _ = reply.send(repeat);
            }
            Command::Shutdown { reply } => {
                self.shutdown();
                let _ = reply.send(());
                return false;
            }
        }

        true
    }

    /// Hold back transport commands until the backend is loaded
    ///
    /// Any newer transport command supersedes a parked one, even when the
    /// backend has loaded in between.
    fn gate(&mut self, command: Command) -> Option<Command> {
        if !command.needs_backend() {
            return Some(command);
        }

        if let Some(parked) = self.parked.take() {
            parked.command.reject(PlaybackError::Interrupted);
        }
        if self.backend.is_loaded() {
            self.backend_poll = None;
            return Some(command);
        }

        let config = self.engine.config();
        let timeout = config.backend_load_timeout();
        tracing::debug!("Waiting up to {:?} for media backend to load", timeout);

        if self.backend_poll.is_none() {
            self.backend_poll = Some(fresh_interval(config.backend_poll_interval()));
        }
        self.parked = Some(Parked {
            command,
            deadline: Instant::now() + timeout,
        });
        None
    }

    fn poll_backend(&mut self) {
        let Some(parked) = self.parked.take() else {
            self.backend_poll = None;
            return;
        };

        if self.backend.is_loaded() {
            self.backend_poll = None;
            self.handle_command(parked.command);
        } else if Instant::now() >= parked.deadline {
            self.backend_poll = None;
            let timeout = self.engine.config().backend_load_timeout();
            tracing::warn!("Media backend did not load within {:?}", timeout);
            parked.command.reject(AdapterError::LoadTimeout(timeout).into());
        } else {
            self.parked = Some(parked);
        }
    }

    fn skip(&mut self, result: Result<Option<u64>>, reply: oneshot::Sender<Result<bool>>) {
        match result {
            Ok(Some(generation)) => {
                self.await_ready(generation, Waiter::Skip(reply));
                self.flush();
            }
            Ok(None) => {
                self.flush();
                let _ = reply.send(Ok(false));
            }
            Err(e) => {
                self.flush();
                let _ = reply.send(Err(e));
            }
        }
    }

    fn handle_signal(&mut self, signal: AdapterSignal) {
        match self.engine.handle_signal(signal) {
            SignalOutcome::Ignored => {}
            SignalOutcome::Ready { generation } => {
                let waiter = self.take_waiter(generation);
                self.flush();
                if let Some(waiter) = waiter {
                    waiter.succeed();
                }
            }
            SignalOutcome::Failed {
                generation,
                message,
            } => {
                let waiter = self.take_waiter(generation);
                self.flush();
                if let Some(waiter) = waiter {
                    waiter.fail(PlaybackError::Adapter(message));
                }
            }
            SignalOutcome::Updated
            | SignalOutcome::Advanced { .. }
            | SignalOutcome::Repeated
            | SignalOutcome::Stopped => self.flush(),
        }
    }

    fn await_ready(&mut self, generation: u64, waiter: Waiter) {
        if let Some((_, previous)) = self.waiter.replace((generation, waiter)) {
            previous.fail(PlaybackError::Interrupted);
        }
    }

    fn take_waiter(&mut self, generation: u64) -> Option<Waiter> {
        match self.waiter.take() {
            Some((pending, waiter)) if pending == generation => Some(waiter),
            other => {
                self.waiter = other;
                None
            }
        }
    }

    /// Publish state, fan out events and usage, and settle timers
    fn flush(&mut self) {
        let snapshot = self.engine.snapshot();
        self.state_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });

        for event in self.engine.drain_events() {
            // No receivers is fine
            let _ = self.events_tx.send(event);
        }
        for report in self.engine.drain_usage() {
            let _ = self.usage_tx.send(report);
        }

        // A waiter whose adapter is no longer loading was superseded
        if let Some((generation, _)) = &self.waiter {
            if self.engine.pending_generation() != Some(*generation) {
                if let Some((_, waiter)) = self.waiter.take() {
                    waiter.fail(PlaybackError::Interrupted);
                }
            }
        }

        self.sync_timers();
    }

    /// Timers run only while playing and start fresh on every entry
    fn sync_timers(&mut self) {
        if !self.engine.is_playing() {
            self.position_timer = None;
            self.usage_timer = None;
            return;
        }

        let epoch = self.engine.playing_epoch();
        if epoch == self.timer_epoch {
            return;
        }
        self.timer_epoch = epoch;

        let config = self.engine.config();
        let position_period = config.position_poll_interval();
        let usage_period = config.usage_tick_interval();

        self.position_timer = Some(fresh_interval(position_period));
        self.usage_timer = self
            .engine
            .session()
            .is_some()
            .then(|| fresh_interval(usage_period));
    }

    fn shutdown(&mut self) {
        self.backend_poll = None;
        if let Some(parked) = self.parked.take() {
            parked.command.reject(PlaybackError::ControllerClosed);
        }
        self.engine.shutdown();
        self.flush();
    }
}

fn fresh_interval(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(timer: &mut Option<Interval>) -> Instant {
    match timer {
        Some(interval) => interval.tick().await,
        None => std::future::pending().await,
    }
}

async fn forward_usage(
    recorder: Arc<dyn UsageRecorder>,
    mut reports: mpsc::UnboundedReceiver<UsageReport>,
) {
    while let Some(report) = reports.recv().await {
        match report {
            UsageReport::PlayStarted(queue) => recorder.record_play_started(&queue).await,
            UsageReport::Listened { queue, seconds } => {
                recorder.record_listened_seconds(&queue, seconds).await;
            }
        }
    }
}
