use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace, warn};

use super::traits::{PlaybackState, VideoPlayer};
use crate::events::player::PLAYBACK_STATE_CHANGE;
use crate::events::{EventHandler, ListenOptions, PlayerEvent};
use crate::models::{Media, MediaId};
use crate::services::{DEFAULT_REQUEST_TAG, ProgressReport, ProgressReporter};

/// Configuration for progress tracking behavior
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Time between periodic reports (default: 30 seconds)
    pub interval: Duration,
    /// Value of the `req` field sent with each report
    pub request_tag: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            request_tag: DEFAULT_REQUEST_TAG.to_string(),
        }
    }
}

/// State shared between the tracker, its ticker task and its listeners.
struct TrackerShared {
    media: Arc<Media>,
    player: Weak<dyn VideoPlayer>,
    reporter: Arc<dyn ProgressReporter>,
    request_tag: String,
    attempts: AtomicU64,
    started_at: Instant,
    cancel: CancellationToken,
    reports: TaskTracker,
    runtime: Handle,
}

impl TrackerShared {
    fn build_report(&self, call_count: u64) -> ProgressReport {
        let playhead = self
            .player
            .upgrade()
            .map(|player| player.current_time())
            .filter(|t| t.is_finite())
            .unwrap_or(0.0)
            .max(0.0)
            .floor() as u64;

        ProgressReport {
            call_count,
            elapsed: self.started_at.elapsed().as_secs(),
            encode_id: self.media.stream.encode_id.to_string(),
            request_tag: self.request_tag.clone(),
            media_type: self.media.stream.media_type.clone(),
            playhead,
            media_id: self.media.id.to_string(),
        }
    }

    /// Issue one report in its own task so a slow call never holds up the
    /// next tick. Failures are logged and left for the next tick.
    fn spawn_report(self: &Arc<Self>, reason: &'static str) {
        if self.cancel.is_cancelled() {
            return;
        }

        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let report = self.build_report(attempt);
        trace!(
            "Progress report #{} for {} ({})",
            attempt, self.media.id, reason
        );

        let shared = Arc::clone(self);
        self.reports.spawn_on(
            async move {
                // Spawned before dispose but polled after it
                if shared.cancel.is_cancelled() {
                    trace!(
                        "Dropping report #{} for {} issued before dispose",
                        attempt, shared.media.id
                    );
                    return;
                }
                tokio::select! {
                    biased;
                    _ = shared.cancel.cancelled() => {
                        trace!("Dropping in-flight report #{} for {}", attempt, shared.media.id);
                    }
                    result = shared.reporter.report(&report) => match result {
                        Ok(()) => debug!(
                            "Recorded progress for {} at {}s (attempt {})",
                            report.media_id, report.playhead, attempt
                        ),
                        Err(e) => warn!(
                            "Failed to record progress for {} (attempt {}): {:#}",
                            report.media_id, attempt, e
                        ),
                    }
                }
            },
            &self.runtime,
        );
    }
}

/// Periodically reports the playhead of one [`Media`] to the progress
/// endpoint.
///
/// Delivery is at-least-once: duplicates are fine for the remote side, so
/// nothing is deduplicated here. The attempt counter keeps growing on
/// failures so gaps are visible remotely.
pub struct ProgressTracker {
    shared: Arc<TrackerShared>,
    ticker: Option<JoinHandle<()>>,
    listeners: EventHandler,
    disposed: bool,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("media_id", &self.shared.media.id)
            .field("attempts", &self.attempts())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl ProgressTracker {
    /// Start tracking `media` on `player`. Must be called inside a tokio
    /// runtime.
    pub fn start(
        media: Arc<Media>,
        player: &Arc<dyn VideoPlayer>,
        reporter: Arc<dyn ProgressReporter>,
        settings: &TrackerSettings,
    ) -> Self {
        let shared = Arc::new(TrackerShared {
            media,
            player: Arc::downgrade(player),
            reporter,
            request_tag: settings.request_tag.clone(),
            attempts: AtomicU64::new(0),
            started_at: Instant::now(),
            cancel: CancellationToken::new(),
            reports: TaskTracker::new(),
            runtime: Handle::current(),
        });

        let mut listeners = EventHandler::new();
        let on_state = Arc::clone(&shared);
        listeners.listen(
            player,
            PLAYBACK_STATE_CHANGE,
            move |event: &PlayerEvent| {
                if let PlayerEvent::PlaybackStateChange(state) = event {
                    if matches!(state, PlaybackState::Paused | PlaybackState::Ended) {
                        on_state.spawn_report("state change");
                    }
                }
            },
            ListenOptions::default(),
        );

        let period = settings.interval.max(Duration::from_millis(1));
        let ticking = Arc::clone(&shared);
        let ticker = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticking.cancel.cancelled() => break,
                    _ = ticker.tick() => ticking.spawn_report("interval"),
                }
            }
        });

        debug!(
            "Started progress tracking for {} every {:?}",
            shared.media.id, period
        );

        Self {
            shared,
            ticker: Some(ticker),
            listeners,
            disposed: false,
        }
    }

    /// Stop the timer, drop in-flight reports and detach listeners.
    ///
    /// Idempotent. No report is issued after the first call returns.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.shared.cancel.cancel();
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        self.listeners.remove_all();
        self.shared.reports.close();
        debug!(
            "Stopped progress tracking for {} after {} attempt(s)",
            self.shared.media.id,
            self.attempts()
        );
    }

    /// Number of report attempts so far, successful or not
    pub fn attempts(&self) -> u64 {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    pub fn media_id(&self) -> &MediaId {
        &self.shared.media.id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.dispose();
    }
}
