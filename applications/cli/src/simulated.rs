//! Simulated media backend
//!
//! Stands in for an embedded player when running headless. Each adapter
//! owns a clock task that reports `Ready` after a short load delay, then
//! advances the position while playing and reports `Ended` when it reaches
//! the configured track length.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use webamp_playback::{
    AdapterError, AdapterEvent, AdapterEventSink, AdapterRequest, AdapterState, MediaAdapter,
    MediaBackend,
};

const CLOCK_TICK: Duration = Duration::from_millis(100);

/// Timing of simulated tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Length every simulated track reports (default: 30 s)
    pub track_length_secs: f64,

    /// Playback speed multiplier (default: 1.0)
    pub speed: f64,

    /// Delay before an adapter reports ready (default: 200 ms)
    pub load_delay_ms: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            track_length_secs: 30.0,
            speed: 1.0,
            load_delay_ms: 200,
        }
    }
}

/// Backend whose players are driven by a tokio clock
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    settings: SimulationSettings,
}

impl SimulatedBackend {
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }
}

impl MediaBackend for SimulatedBackend {
    fn create(
        &self,
        request: AdapterRequest,
        events: AdapterEventSink,
    ) -> Result<Box<dyn MediaAdapter>, AdapterError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AdapterError::Construction(e.to_string()))?;

        tracing::debug!(
            "Simulating {} on {} (generation {})",
            request.playable_id,
            request.host_surface,
            events.generation()
        );

        let clock = Arc::new(Mutex::new(Clock {
            position_secs: request.options.start_position_secs.max(0.0),
            playing: false,
        }));
        let task = runtime.spawn(run_clock(
            Arc::clone(&clock),
            events.clone(),
            self.settings.clone(),
        ));

        Ok(Box::new(SimulatedAdapter {
            clock,
            events,
            task,
            duration_secs: self.settings.track_length_secs,
            volume: 100,
            muted: false,
        }))
    }
}

#[derive(Debug)]
struct Clock {
    position_secs: f64,
    playing: bool,
}

/// Player instance built by [`SimulatedBackend`]
pub struct SimulatedAdapter {
    clock: Arc<Mutex<Clock>>,
    events: AdapterEventSink,
    task: JoinHandle<()>,
    duration_secs: f64,
    volume: u8,
    muted: bool,
}

impl SimulatedAdapter {
    fn clock(&self) -> MutexGuard<'_, Clock> {
        lock(&self.clock)
    }

    /// Volume the simulated output would play at
    pub fn audible_volume(&self) -> u8 {
        if self.muted {
            0
        } else {
            self.volume
        }
    }
}

impl MediaAdapter for SimulatedAdapter {
    fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    fn position_secs(&self) -> f64 {
        self.clock().position_secs
    }

    fn play(&mut self) {
        let started = {
            let mut clock = self.clock();
            !std::mem::replace(&mut clock.playing, true)
        };
        if started {
            tracing::debug!("Simulated playback at volume {}", self.audible_volume());
            self.events
                .emit(AdapterEvent::StateChange(AdapterState::Playing));
        }
    }

    fn pause(&mut self) {
        let paused = std::mem::replace(&mut self.clock().playing, false);
        if paused {
            self.events
                .emit(AdapterEvent::StateChange(AdapterState::Paused));
        }
    }

    fn stop(&mut self) {
        let mut clock = self.clock();
        clock.playing = false;
        clock.position_secs = 0.0;
    }

    fn seek_to(&mut self, seconds: f64) {
        let duration = self.duration_secs;
        self.clock().position_secs = seconds.clamp(0.0, duration);
    }

    fn set_volume(&mut self, level: u8) {
        self.volume = level.min(100);
    }

    fn mute(&mut self) {
        self.muted = true;
    }

    fn unmute(&mut self) {
        self.muted = false;
    }

    fn destroy(&mut self) {
        self.task.abort();
        self.clock().playing = false;
    }
}

impl Drop for SimulatedAdapter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_clock(clock: Arc<Mutex<Clock>>, events: AdapterEventSink, settings: SimulationSettings) {
    tokio::time::sleep(Duration::from_millis(settings.load_delay_ms)).await;
    if !events.emit(AdapterEvent::Ready) {
        return;
    }

    let step = CLOCK_TICK.as_secs_f64() * settings.speed;
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + CLOCK_TICK, CLOCK_TICK);

    loop {
        ticker.tick().await;

        let ended = {
            let mut clock = lock(&clock);
            if !clock.playing {
                continue;
            }
            clock.position_secs += step;
            if clock.position_secs >= settings.track_length_secs {
                clock.position_secs = settings.track_length_secs;
                clock.playing = false;
                true
            } else {
                false
            }
        };

        if ended && !events.emit(AdapterEvent::StateChange(AdapterState::Ended)) {
            return;
        }
    }
}

fn lock(clock: &Mutex<Clock>) -> MutexGuard<'_, Clock> {
    clock.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use webamp_core::{PlayableId, Provider};
    use webamp_playback::{AdapterSignal, PlayerOptions};

    fn request() -> AdapterRequest {
        AdapterRequest {
            host_surface: "test".to_string(),
            playable_id: PlayableId {
                provider: Provider::Youtube,
                id: "abc".to_string(),
            },
            options: PlayerOptions::default(),
        }
    }

    fn backend(track_length_secs: f64) -> SimulatedBackend {
        SimulatedBackend::new(SimulationSettings {
            track_length_secs,
            speed: 1.0,
            load_delay_ms: 50,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_ready_then_ends() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut adapter = backend(1.0)
            .create(request(), AdapterEventSink::new(3, tx))
            .unwrap();

        let ready = rx.recv().await.unwrap();
        assert_eq!(
            ready,
            AdapterSignal {
                generation: 3,
                event: AdapterEvent::Ready
            }
        );

        adapter.play();
        assert_eq!(
            rx.recv().await.unwrap().event,
            AdapterEvent::StateChange(AdapterState::Playing)
        );

        let ended = rx.recv().await.unwrap();
        assert_eq!(ended.event, AdapterEvent::StateChange(AdapterState::Ended));
        assert_eq!(adapter.position_secs(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_clock_does_not_advance() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut adapter = backend(10.0)
            .create(request(), AdapterEventSink::new(1, tx))
            .unwrap();
        rx.recv().await.unwrap();

        adapter.play();
        tokio::time::sleep(Duration::from_millis(1_050)).await;
        adapter.pause();
        let paused_at = adapter.position_secs();
        assert!(paused_at > 0.5);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(adapter.position_secs(), paused_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_silences_adapter() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut adapter = backend(10.0)
            .create(request(), AdapterEventSink::new(1, tx))
            .unwrap();

        adapter.destroy();
        adapter.destroy();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_create_outside_runtime_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = backend(1.0).create(request(), AdapterEventSink::new(1, tx));
        assert!(matches!(result, Err(AdapterError::Construction(_))));
    }
}
