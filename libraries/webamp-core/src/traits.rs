/// Core traits for WebAmp
use crate::types::PlaylistId;
use async_trait::async_trait;

/// Sink for listening statistics
///
/// The playback controller reports play starts and elapsed listening time
/// against the queue identity of the current session. Calls are
/// fire-and-forget: implementations log their own failures.
#[async_trait]
pub trait UsageRecorder: Send + Sync {
    /// A play session started for the given queue
    async fn record_play_started(&self, queue: &PlaylistId);

    /// `seconds` of listening time elapsed for the given queue
    async fn record_listened_seconds(&self, queue: &PlaylistId, seconds: u64);
}

/// Recorder that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUsageRecorder;

#[async_trait]
impl UsageRecorder for NoopUsageRecorder {
    async fn record_play_started(&self, _queue: &PlaylistId) {}

    async fn record_listened_seconds(&self, _queue: &PlaylistId, _seconds: u64) {}
}
