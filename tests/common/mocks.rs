use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use stream_overlay::events::{
    EventEmitter, EventSource, ListenOptions, Listener, ListenerId, PlayerEvent,
};
use stream_overlay::models::{Media, MediaId, PlayerConfig};
use stream_overlay::player::{PlaybackState, VideoPlayer};
use stream_overlay::services::{
    ErrorReporter, LayoutMode, MediaResolver, PageAccessor, QualityPreference, ResolveOptions,
};
use stream_overlay::utils::OverlayError;
use url::Url;

pub struct MockPlayer {
    events: EventEmitter<PlayerEvent>,
    pub fullscreen: AtomicBool,
    pub current_time: Mutex<f64>,
    pub loaded: Mutex<Vec<PlayerConfig>>,
    pub cued: Mutex<Vec<PlayerConfig>>,
}

impl MockPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: EventEmitter::new(),
            fullscreen: AtomicBool::new(false),
            current_time: Mutex::new(0.0),
            loaded: Mutex::new(Vec::new()),
            cued: Mutex::new(Vec::new()),
        })
    }

    pub fn emit(&self, event: &PlayerEvent) -> usize {
        self.events.emit(event)
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    /// Every config handed over, cued or loaded, placeholders excluded
    pub fn media_configs(&self) -> Vec<PlayerConfig> {
        let mut configs = self.cued.lock().unwrap().clone();
        configs.extend(self.loaded.lock().unwrap().iter().cloned());
        configs.retain(|c| !c.is_placeholder());
        configs
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
        PlaybackState::Playing
    }

    fn play_video(&self, _resume: bool) {}

    fn load_video_by_config(&self, config: PlayerConfig) {
        self.loaded.lock().unwrap().push(config);
    }

    fn cue_video_by_config(&self, config: PlayerConfig) {
        self.cued.lock().unwrap().push(config);
    }
}

/// Resolver backed by a fixed catalogue, with switchable failures
pub struct MockResolver {
    pub by_id: HashMap<String, Media>,
    pub by_url: HashMap<String, Media>,
    pub error_mode: Arc<Mutex<Option<String>>>,
    pub requests: Mutex<Vec<(String, QualityPreference, ResolveOptions)>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
            by_url: HashMap::new(),
            error_mode: Arc::new(Mutex::new(None)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_media(mut self, media: Media) -> Self {
        self.by_id.insert(media.id.to_string(), media);
        self
    }

    pub fn with_media_at(mut self, url: &str, media: Media) -> Self {
        self.by_url.insert(url.to_string(), media);
        self
    }

    pub fn inject_error(&self, error: String) {
        *self.error_mode.lock().unwrap() = Some(error);
    }

    pub fn clear_error(&self) {
        *self.error_mode.lock().unwrap() = None;
    }

    fn check_error(&self) -> Result<()> {
        if let Some(error) = self.error_mode.lock().unwrap().clone() {
            return Err(anyhow!(error));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaResolver for MockResolver {
    async fn get_media(
        &self,
        id: &MediaId,
        quality: &QualityPreference,
        _page_url: &Url,
        options: &ResolveOptions,
    ) -> Result<Media> {
        self.requests
            .lock()
            .unwrap()
            .push((id.to_string(), quality.clone(), options.clone()));
        self.check_error()?;
        self.by_id
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("media {} not found", id))
    }

    async fn get_media_by_url(
        &self,
        url: &Url,
        quality: &QualityPreference,
        options: &ResolveOptions,
    ) -> Result<Media> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), quality.clone(), options.clone()));
        self.check_error()?;
        self.by_url
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("no media at {}", url))
    }
}

#[derive(Default)]
pub struct MockPage {
    pub layouts: Mutex<Vec<LayoutMode>>,
    pub locations: Mutex<Vec<Url>>,
}

impl PageAccessor for MockPage {
    fn find_thumbnail(&self, _media_id: &MediaId) -> Option<String> {
        None
    }

    fn apply_layout(&self, mode: LayoutMode) -> Result<()> {
        self.layouts.lock().unwrap().push(mode);
        Ok(())
    }

    fn replace_location(&self, url: &Url) {
        self.locations.lock().unwrap().push(url.clone());
    }
}

#[derive(Default)]
pub struct CollectingErrors {
    pub errors: Mutex<Vec<String>>,
}

impl ErrorReporter for CollectingErrors {
    fn report(&self, context: &str, error: &OverlayError) {
        self.errors
            .lock()
            .unwrap()
            .push(format!("{}: {}", context, error));
    }
}
