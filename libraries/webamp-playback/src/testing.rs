//! Test doubles
//!
//! `MockBackend` builds adapters that record every call and only emit
//! events when told to, so tests drive the adapter lifecycle explicitly.
//! `RecordingUsageRecorder` keeps every usage report in memory.

use crate::adapter::{
    AdapterError, AdapterEvent, AdapterEventSink, AdapterRequest, MediaAdapter, MediaBackend,
};
use crate::events::UsageReport;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use webamp_core::{PlaylistId, UsageRecorder};

/// A call made on a mock adapter
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCall {
    Play,
    Pause,
    Stop,
    SeekTo(f64),
    SetVolume(u8),
    Mute,
    Unmute,
    Destroy,
}

struct MockInstance {
    request: AdapterRequest,
    sink: AdapterEventSink,
    calls: Vec<AdapterCall>,
    destroyed: bool,
    position_secs: f64,
    duration_secs: f64,
}

struct MockState {
    loaded: bool,
    auto_ready: bool,
    duration_secs: f64,
    fail_next: Option<String>,
    instances: Vec<MockInstance>,
}

/// Scriptable media backend
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Loaded backend whose adapters wait for an explicit `Ready`
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                loaded: true,
                auto_ready: false,
                duration_secs: 180.0,
                fail_next: None,
                instances: Vec::new(),
            })),
        }
    }

    /// Loaded backend whose adapters report `Ready` right after construction
    pub fn auto_ready() -> Self {
        let backend = Self::new();
        backend.lock().auto_ready = true;
        backend
    }

    /// Duration reported by adapters built from now on
    pub fn with_duration(self, secs: f64) -> Self {
        self.lock().duration_secs = secs;
        self
    }

    pub fn set_loaded(&self, loaded: bool) {
        self.lock().loaded = loaded;
    }

    pub fn set_auto_ready(&self, auto_ready: bool) {
        self.lock().auto_ready = auto_ready;
    }

    /// Make the next `create` fail with `message`
    pub fn fail_next_create(&self, message: impl Into<String>) {
        self.lock().fail_next = Some(message.into());
    }

    /// Number of adapters ever constructed
    pub fn instance_count(&self) -> usize {
        self.lock().instances.len()
    }

    /// Number of constructed adapters not yet destroyed
    pub fn live_count(&self) -> usize {
        self.lock().instances.iter().filter(|i| !i.destroyed).count()
    }

    pub fn is_destroyed(&self, index: usize) -> bool {
        self.lock().instances.get(index).is_some_and(|i| i.destroyed)
    }

    /// Calls recorded on adapter `index`, in order
    pub fn calls(&self, index: usize) -> Vec<AdapterCall> {
        self.lock()
            .instances
            .get(index)
            .map(|i| i.calls.clone())
            .unwrap_or_default()
    }

    /// Request adapter `index` was built from
    pub fn request(&self, index: usize) -> Option<AdapterRequest> {
        self.lock().instances.get(index).map(|i| i.request.clone())
    }

    /// Position adapter `index` reports
    pub fn set_position(&self, index: usize, secs: f64) {
        if let Some(instance) = self.lock().instances.get_mut(index) {
            instance.position_secs = secs;
        }
    }

    /// Duration adapter `index` reports
    pub fn set_duration(&self, index: usize, secs: f64) {
        if let Some(instance) = self.lock().instances.get_mut(index) {
            instance.duration_secs = secs;
        }
    }

    /// Emit an event from adapter `index`
    pub fn emit(&self, index: usize, event: AdapterEvent) -> bool {
        let sink = self.lock().instances.get(index).map(|i| i.sink.clone());
        sink.is_some_and(|sink| sink.emit(event))
    }

    /// Emit an event from the most recently constructed adapter
    pub fn emit_latest(&self, event: AdapterEvent) -> bool {
        let count = self.instance_count();
        count > 0 && self.emit(count - 1, event)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaBackend for MockBackend {
    fn is_loaded(&self) -> bool {
        self.lock().loaded
    }

    fn create(
        &self,
        request: AdapterRequest,
        events: AdapterEventSink,
    ) -> Result<Box<dyn MediaAdapter>, AdapterError> {
        let mut state = self.lock();

        if let Some(message) = state.fail_next.take() {
            return Err(AdapterError::Construction(message));
        }

        if state.auto_ready {
            events.emit(AdapterEvent::Ready);
        }

        let duration_secs = state.duration_secs;
        state.instances.push(MockInstance {
            request,
            sink: events,
            calls: Vec::new(),
            destroyed: false,
            position_secs: 0.0,
            duration_secs,
        });

        Ok(Box::new(MockAdapter {
            state: Arc::clone(&self.state),
            index: state.instances.len() - 1,
        }))
    }
}

struct MockAdapter {
    state: Arc<Mutex<MockState>>,
    index: usize,
}

impl MockAdapter {
    fn with_instance<T>(&self, f: impl FnOnce(&mut MockInstance) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state.instances[self.index])
    }

    fn record(&mut self, call: AdapterCall) {
        self.with_instance(|instance| instance.calls.push(call));
    }
}

impl MediaAdapter for MockAdapter {
    fn duration_secs(&self) -> f64 {
        self.with_instance(|instance| instance.duration_secs)
    }

    fn position_secs(&self) -> f64 {
        self.with_instance(|instance| instance.position_secs)
    }

    fn play(&mut self) {
        self.record(AdapterCall::Play);
    }

    fn pause(&mut self) {
        self.record(AdapterCall::Pause);
    }

    fn stop(&mut self) {
        self.record(AdapterCall::Stop);
    }

    fn seek_to(&mut self, seconds: f64) {
        self.with_instance(|instance| {
            instance.position_secs = seconds;
            instance.calls.push(AdapterCall::SeekTo(seconds));
        });
    }

    fn set_volume(&mut self, level: u8) {
        self.record(AdapterCall::SetVolume(level));
    }

    fn mute(&mut self) {
        self.record(AdapterCall::Mute);
    }

    fn unmute(&mut self) {
        self.record(AdapterCall::Unmute);
    }

    fn destroy(&mut self) {
        self.with_instance(|instance| {
            instance.destroyed = true;
            instance.calls.push(AdapterCall::Destroy);
        });
    }
}

/// Usage recorder that keeps every report
#[derive(Debug, Clone, Default)]
pub struct RecordingUsageRecorder {
    reports: Arc<Mutex<Vec<UsageReport>>>,
}

impl RecordingUsageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<UsageReport> {
        self.lock().clone()
    }

    pub fn play_count(&self, queue: &PlaylistId) -> usize {
        self.lock()
            .iter()
            .filter(|report| matches!(report, UsageReport::PlayStarted(id) if id == queue))
            .count()
    }

    pub fn listened_seconds(&self, queue: &PlaylistId) -> u64 {
        self.lock()
            .iter()
            .map(|report| match report {
                UsageReport::Listened { queue: id, seconds } if id == queue => *seconds,
                _ => 0,
            })
            .sum()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UsageReport>> {
        self.reports.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UsageRecorder for RecordingUsageRecorder {
    async fn record_play_started(&self, queue: &PlaylistId) {
        self.lock().push(UsageReport::PlayStarted(queue.clone()));
    }

    async fn record_listened_seconds(&self, queue: &PlaylistId, seconds: u64) {
        self.lock().push(UsageReport::Listened {
            queue: queue.clone(),
            seconds,
        });
    }
}
