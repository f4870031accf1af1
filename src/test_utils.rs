#![cfg(test)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::events::{EventEmitter, EventSource, ListenOptions, Listener, ListenerId, PlayerEvent};
use crate::models::{EncodeId, Media, MediaId, MediaMetadata, PlayerConfig, StreamInfo};
use crate::player::{PlaybackState, VideoPlayer};
use crate::services::{
    ErrorReporter, FragmentFetcher, LayoutMode, MediaResolver, PageAccessor, ProgressReport,
    ProgressReporter, QualityPreference, ResolveOptions,
};
use crate::utils::OverlayError;

/// Build a media item whose ids derive from `id`
pub fn sample_media(id: &str, next_video_url: Option<&str>) -> Media {
    Media {
        id: MediaId::new(id),
        stream: StreamInfo {
            file_url: format!("https://cdn.example.com/{}.m3u8", id),
            duration: 1420.0,
            encode_id: EncodeId::new(format!("E-{}", id)),
            media_type: "anime".to_string(),
        },
        metadata: MediaMetadata {
            series_title: "Test Show".to_string(),
            episode_number: "1".to_string(),
            episode_title: format!("Episode {}", id),
            episode_image_url: Some(format!("https://img.example.com/{}.jpg", id)),
        },
        subtitles: Vec::new(),
        start_time: None,
        auto_play: false,
        next_video_url: next_video_url.map(str::to_string),
    }
}

/// Wait for a condition to become true, polling every few milliseconds
pub async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    Load(PlayerConfig),
    Cue(PlayerConfig),
    Play { resume: bool },
}

/// Player widget double that records every call made on it
pub struct MockPlayer {
    events: EventEmitter<PlayerEvent>,
    fullscreen: AtomicBool,
    current_time: Mutex<f64>,
    preferred: Mutex<PlaybackState>,
    calls: Mutex<Vec<PlayerCall>>,
}

impl MockPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: EventEmitter::new(),
            fullscreen: AtomicBool::new(false),
            current_time: Mutex::new(0.0),
            preferred: Mutex::new(PlaybackState::Unstarted),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_fullscreen(&self, fullscreen: bool) {
        self.fullscreen.store(fullscreen, Ordering::SeqCst);
    }

    pub fn set_current_time(&self, seconds: f64) {
        *self.current_time.lock().unwrap() = seconds;
    }

    pub fn set_preferred_state(&self, state: PlaybackState) {
        *self.preferred.lock().unwrap() = state;
    }

    pub fn emit(&self, event: &PlayerEvent) -> usize {
        self.events.emit(event)
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Configs handed to load or cue, placeholders included
    pub fn configs(&self) -> Vec<PlayerConfig> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlayerCall::Load(config) | PlayerCall::Cue(config) => Some(config),
                PlayerCall::Play { .. } => None,
            })
            .collect()
    }

    /// Configs that carried real media
    pub fn media_configs(&self) -> Vec<PlayerConfig> {
        self.configs()
            .into_iter()
            .filter(|config| !config.is_placeholder())
            .collect()
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }
}

impl EventSource<PlayerEvent> for MockPlayer {
    fn add_listener(
        &self,
        event_name: &str,
        listener: Listener<PlayerEvent>,
        options: ListenOptions,
    ) -> ListenerId {
        self.events.add_listener(event_name, listener, options)
    }

    fn remove_listener(&self, event_name: &str, id: ListenerId) -> bool {
        self.events.remove_listener(event_name, id)
    }
}

impl VideoPlayer for MockPlayer {
    fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::SeqCst)
    }

    fn current_time(&self) -> f64 {
        *self.current_time.lock().unwrap()
    }

    fn preferred_playback_state(&self) -> PlaybackState {
        *self.preferred.lock().unwrap()
    }

    fn play_video(&self, resume: bool) {
        self.calls.lock().unwrap().push(PlayerCall::Play { resume });
    }

    fn load_video_by_config(&self, config: PlayerConfig) {
        self.calls.lock().unwrap().push(PlayerCall::Load(config));
    }

    fn cue_video_by_config(&self, config: PlayerConfig) {
        self.calls.lock().unwrap().push(PlayerCall::Cue(config));
    }
}

/// Progress reporter that forwards every report to a channel
pub struct RecordingReporter {
    sender: mpsc::UnboundedSender<ProgressReport>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingReporter {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ProgressReport>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let reporter = Arc::new(Self {
            sender,
            failing: AtomicBool::new(false),
            delay: Mutex::new(None),
        });
        (reporter, receiver)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl ProgressReporter for RecordingReporter {
    async fn report(&self, report: &ProgressReport) -> Result<()> {
        let _ = self.sender.send(report.clone());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("progress endpoint unavailable"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolveCall {
    /// Media id for `get_media`, URL for `get_media_by_url`
    pub key: String,
    pub by_url: bool,
    pub quality: QualityPreference,
    pub options: ResolveOptions,
}

/// Media resolver answering from a table, or holding calls until released
pub struct ScriptedResolver {
    responses: Mutex<HashMap<String, Result<Media, String>>>,
    gated: AtomicBool,
    pending: Mutex<Vec<(String, oneshot::Sender<Result<Media, String>>)>>,
    calls: Mutex<Vec<ResolveCall>>,
}

impl ScriptedResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(HashMap::new()),
            gated: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Calls block until [`ScriptedResolver::release`] is invoked for them
    pub fn gated() -> Arc<Self> {
        let resolver = Self::new();
        resolver.gated.store(true, Ordering::SeqCst);
        resolver
    }

    pub fn respond(&self, key: &str, media: Media) {
        self.responses
            .lock()
            .unwrap()
            .insert(key.to_string(), Ok(media));
    }

    pub fn fail(&self, key: &str, error: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(key.to_string(), Err(error.to_string()));
    }

    /// Complete the oldest held call for `key`
    pub fn release(&self, key: &str, result: Result<Media, String>) -> bool {
        let mut pending = self.pending.lock().unwrap();
        match pending.iter().position(|(k, _)| k == key) {
            Some(index) => {
                let (_, sender) = pending.remove(index);
                sender.send(result).is_ok()
            }
            None => false,
        }
    }

    pub fn pending_keys(&self) -> Vec<String> {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<ResolveCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn lookup(&self, call: ResolveCall) -> Result<Media> {
        let key = call.key.clone();
        self.calls.lock().unwrap().push(call);

        if self.gated.load(Ordering::SeqCst) {
            let (sender, receiver) = oneshot::channel();
            self.pending.lock().unwrap().push((key.clone(), sender));
            return match receiver.await {
                Ok(Ok(media)) => Ok(media),
                Ok(Err(e)) => Err(anyhow!(e)),
                Err(_) => Err(anyhow!("resolution for {} abandoned", key)),
            };
        }

        let response = self.responses.lock().unwrap().get(&key).cloned();
        match response {
            Some(Ok(media)) => Ok(media),
            Some(Err(e)) => Err(anyhow!(e)),
            None => Err(anyhow!("no media for {}", key)),
        }
    }
}

#[async_trait]
impl MediaResolver for ScriptedResolver {
    async fn get_media(
        &self,
        id: &MediaId,
        quality: &QualityPreference,
        _page_url: &Url,
        options: &ResolveOptions,
    ) -> Result<Media> {
        self.lookup(ResolveCall {
            key: id.to_string(),
            by_url: false,
            quality: quality.clone(),
            options: options.clone(),
        })
        .await
    }

    async fn get_media_by_url(
        &self,
        url: &Url,
        quality: &QualityPreference,
        options: &ResolveOptions,
    ) -> Result<Media> {
        self.lookup(ResolveCall {
            key: url.to_string(),
            by_url: true,
            quality: quality.clone(),
            options: options.clone(),
        })
        .await
    }
}

/// Fragment fetcher serving documents from a table keyed by absolute URL
#[derive(Default)]
pub struct StaticFragments {
    documents: Mutex<HashMap<String, String>>,
}

impl StaticFragments {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, url: &str, document: &str) {
        self.documents
            .lock()
            .unwrap()
            .insert(url.to_string(), document.to_string());
    }
}

#[async_trait]
impl FragmentFetcher for StaticFragments {
    async fn fetch_fragment(&self, url: &Url) -> Result<String> {
        self.documents
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("404 for {}", url))
    }
}

/// Host page double
#[derive(Default)]
pub struct MockPage {
    thumbnails: Mutex<HashMap<String, String>>,
    layouts: Mutex<Vec<LayoutMode>>,
    locations: Mutex<Vec<Url>>,
    fail_layout: AtomicBool,
}

impl MockPage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_thumbnail(&self, media_id: &str, url: &str) {
        self.thumbnails
            .lock()
            .unwrap()
            .insert(media_id.to_string(), url.to_string());
    }

    pub fn set_fail_layout(&self, fail: bool) {
        self.fail_layout.store(fail, Ordering::SeqCst);
    }

    pub fn layouts(&self) -> Vec<LayoutMode> {
        self.layouts.lock().unwrap().clone()
    }

    pub fn locations(&self) -> Vec<Url> {
        self.locations.lock().unwrap().clone()
    }
}

impl PageAccessor for MockPage {
    fn find_thumbnail(&self, media_id: &MediaId) -> Option<String> {
        self.thumbnails
            .lock()
            .unwrap()
            .get(media_id.as_str())
            .cloned()
    }

    fn apply_layout(&self, mode: LayoutMode) -> Result<()> {
        if self.fail_layout.load(Ordering::SeqCst) {
            return Err(anyhow!("layout containers missing"));
        }
        self.layouts.lock().unwrap().push(mode);
        Ok(())
    }

    fn replace_location(&self, url: &Url) {
        self.locations.lock().unwrap().push(url.clone());
    }
}

/// Error reporter keeping every reported failure
#[derive(Default)]
pub struct RecordingErrors {
    reported: Mutex<Vec<(String, String)>>,
}

impl RecordingErrors {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reported(&self) -> Vec<(String, String)> {
        self.reported.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingErrors {
    fn report(&self, context: &str, error: &OverlayError) {
        self.reported
            .lock()
            .unwrap()
            .push((context.to_string(), error.to_string()));
    }
}
