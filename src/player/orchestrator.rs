use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};
use url::Url;

use super::progress_tracker::{ProgressTracker, TrackerSettings};
use super::traits::VideoPlayer;
use crate::events::player::{FULLSCREEN_CHANGE, NEXT_VIDEO, SIZE_CHANGE};
use crate::events::{EventHandler, ListenOptions, PlayerEvent};
use crate::models::{Media, MediaId, NextVideoDescriptor, PlayerConfig};
use crate::services::{
    ErrorReporter, FragmentFetcher, LayoutMode, MediaResolver, PageAccessor, ProgressReporter,
    QualityPreference, ResolveOptions, load_next_video,
};
use crate::utils::{OverlayError, OverlayResult};

/// Query parameter carrying the playback position on navigation
pub const TIME_PARAM: &str = "t";

/// Whether a next-video transition has happened in this session.
///
/// Only `Transitioned` lets a fullscreen exit navigate the page. There is no
/// way back to `Initial` short of a new orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionState {
    #[default]
    Initial,
    Transitioned,
}

#[derive(Debug, Clone, Default)]
pub struct OrchestratorOptions {
    pub quality: Option<String>,
    pub format: Option<String>,
    /// Overrides the resolved start time of the first media only
    pub start_time: Option<f64>,
    pub size_toggle: bool,
    pub auto_play: Option<bool>,
    pub affiliate_id: Option<String>,
    pub tracker: TrackerSettings,
}

impl OrchestratorOptions {
    pub fn quality_preference(&self) -> QualityPreference {
        QualityPreference::from_options(self.format.as_deref(), self.quality.as_deref())
    }
}

/// External collaborators the orchestrator drives.
#[derive(Clone)]
pub struct Services {
    pub resolver: Arc<dyn MediaResolver>,
    pub fragments: Arc<dyn FragmentFetcher>,
    pub reporter: Arc<dyn ProgressReporter>,
    pub page: Arc<dyn PageAccessor>,
    pub errors: Arc<dyn ErrorReporter>,
}

/// Point-in-time view of the orchestrator state
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSnapshot {
    pub page_url: Url,
    pub transition: TransitionState,
    pub player_ready: bool,
    /// Media bound to the live progress tracker, if any
    pub tracked_media: Option<MediaId>,
    pub generation: u64,
    pub next_video: Option<NextVideoDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolutionKind {
    Initial,
    NextVideo,
}

struct ResolvedMedia {
    media: Media,
    next_video: Option<NextVideoDescriptor>,
}

/// Commands processed by the orchestrator loop
enum OrchestratorCommand {
    PlayerReady(Arc<dyn VideoPlayer>),
    NextVideo {
        url: String,
    },
    FullscreenChange {
        fullscreen: bool,
        current_time: f64,
    },
    SizeChange {
        large: bool,
    },
    MediaResolved {
        generation: u64,
        origin: Url,
        kind: ResolutionKind,
        result: OverlayResult<ResolvedMedia>,
    },
    Snapshot {
        respond_to: oneshot::Sender<OrchestratorSnapshot>,
    },
    Shutdown {
        respond_to: oneshot::Sender<()>,
    },
}

impl OrchestratorCommand {
    fn name(&self) -> &'static str {
        match self {
            OrchestratorCommand::PlayerReady(_) => "PlayerReady",
            OrchestratorCommand::NextVideo { .. } => "NextVideo",
            OrchestratorCommand::FullscreenChange { .. } => "FullscreenChange",
            OrchestratorCommand::SizeChange { .. } => "SizeChange",
            OrchestratorCommand::MediaResolved { .. } => "MediaResolved",
            OrchestratorCommand::Snapshot { .. } => "Snapshot",
            OrchestratorCommand::Shutdown { .. } => "Shutdown",
        }
    }
}

/// Handle for communicating with a running [`PlaybackOrchestrator`].
///
/// Dropping every handle ends the orchestrator once in-flight resolutions
/// have settled.
#[derive(Clone)]
pub struct OrchestratorHandle {
    sender: mpsc::UnboundedSender<OrchestratorCommand>,
}

impl std::fmt::Debug for OrchestratorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorHandle")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl OrchestratorHandle {
    /// Signal that the player widget finished initializing. Only the first
    /// call has any effect.
    pub fn player_ready(&self, player: Arc<dyn VideoPlayer>) -> OverlayResult<()> {
        self.sender
            .send(OrchestratorCommand::PlayerReady(player))
            .map_err(|_| OverlayError::ChannelClosed)
    }

    /// Resolves after every previously sent command has been processed
    pub async fn snapshot(&self) -> OverlayResult<OrchestratorSnapshot> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(OrchestratorCommand::Snapshot { respond_to })
            .map_err(|_| OverlayError::ChannelClosed)?;
        response.await.map_err(|_| OverlayError::ChannelClosed)
    }

    /// Dispose the tracker, detach every listener and stop the loop
    pub async fn shutdown(&self) -> OverlayResult<()> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(OrchestratorCommand::Shutdown { respond_to })
            .map_err(|_| OverlayError::ChannelClosed)?;
        response.await.map_err(|_| OverlayError::ChannelClosed)
    }
}

/// Owns the player lifecycle for one page view.
///
/// All state lives in this struct and is only touched from [`run`], one
/// command at a time. Player listeners and resolution tasks talk to it
/// exclusively through the command channel.
///
/// [`run`]: PlaybackOrchestrator::run
pub struct PlaybackOrchestrator {
    mount: String,
    page_url: Url,
    media_id: MediaId,
    options: OrchestratorOptions,
    services: Services,
    player: Option<Arc<dyn VideoPlayer>>,
    transition: TransitionState,
    tracker: Option<ProgressTracker>,
    /// Bumped for every resolution; only the latest one may load
    generation: u64,
    next_video: Option<NextVideoDescriptor>,
    listeners: EventHandler,
    sender: mpsc::WeakUnboundedSender<OrchestratorCommand>,
    receiver: mpsc::UnboundedReceiver<OrchestratorCommand>,
}

impl PlaybackOrchestrator {
    /// Store configuration. No I/O happens until the player is ready.
    pub fn new(
        mount: impl Into<String>,
        page_url: Url,
        media_id: MediaId,
        options: OrchestratorOptions,
        services: Services,
    ) -> (OrchestratorHandle, PlaybackOrchestrator) {
        let (sender, receiver) = mpsc::unbounded_channel();

        let orchestrator = PlaybackOrchestrator {
            mount: mount.into(),
            page_url,
            media_id,
            options,
            services,
            player: None,
            transition: TransitionState::Initial,
            tracker: None,
            generation: 0,
            next_video: None,
            listeners: EventHandler::new(),
            sender: sender.downgrade(),
            receiver,
        };
        let handle = OrchestratorHandle { sender };

        (handle, orchestrator)
    }

    /// Element id the player widget is expected to be mounted on
    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Run the orchestrator event loop
    pub async fn run(mut self) {
        debug!(
            "PlaybackOrchestrator started for {} on #{}",
            self.media_id, self.mount
        );

        while let Some(command) = self.receiver.recv().await {
            trace!("Processing {}", command.name());
            match command {
                OrchestratorCommand::PlayerReady(player) => self.on_player_ready(player),
                OrchestratorCommand::NextVideo { url } => self.on_next_video(&url),
                OrchestratorCommand::FullscreenChange {
                    fullscreen,
                    current_time,
                } => self.on_fullscreen_change(fullscreen, current_time),
                OrchestratorCommand::SizeChange { large } => self.on_size_change(large),
                OrchestratorCommand::MediaResolved {
                    generation,
                    origin,
                    kind,
                    result,
                } => self.on_media_resolved(generation, origin, kind, result),
                OrchestratorCommand::Snapshot { respond_to } => {
                    let _ = respond_to.send(self.snapshot());
                }
                OrchestratorCommand::Shutdown { respond_to } => {
                    self.teardown();
                    let _ = respond_to.send(());
                    return;
                }
            }
        }

        self.teardown();
    }

    fn on_player_ready(&mut self, player: Arc<dyn VideoPlayer>) {
        if self.player.is_some() {
            warn!("Player signalled readiness more than once, ignoring");
            return;
        }
        info!("Player ready, resolving media {}", self.media_id);
        self.player = Some(Arc::clone(&player));

        let fullscreen_tx = self.sender.clone();
        let fullscreen_state = Arc::downgrade(&player);
        let next_tx = self.sender.clone();
        let fullscreen_source = Arc::downgrade(&player);
        let next_base = self.page_url.clone();
        self.listeners
            .listen(
                &player,
                FULLSCREEN_CHANGE,
                move |_: &PlayerEvent| {
                    // Read now; the player may toggle again before the loop runs
                    let Some(player) = fullscreen_state.upgrade() else {
                        return;
                    };
                    if let Some(tx) = fullscreen_tx.upgrade() {
                        let _ = tx.send(OrchestratorCommand::FullscreenChange {
                            fullscreen: player.is_fullscreen(),
                            current_time: player.current_time(),
                        });
                    }
                },
                ListenOptions::default(),
            )
            .listen(
                &player,
                NEXT_VIDEO,
                move |event: &PlayerEvent| {
                    let PlayerEvent::NextVideo(request) = event else {
                        return;
                    };
                    // Only intercepted while immersed; otherwise the page
                    // navigates as usual.
                    let fullscreen = fullscreen_source
                        .upgrade()
                        .is_some_and(|player| player.is_fullscreen());
                    if !fullscreen {
                        debug!("Next video outside fullscreen, leaving navigation to the page");
                        return;
                    }
                    // Only intercept what the loop can resolve
                    if let Err(e) = next_base.join(request.url()) {
                        debug!("Unusable next video URL '{}': {}", request.url(), e);
                        return;
                    }
                    if let Some(tx) = next_tx.upgrade() {
                        request.prevent_default();
                        let _ = tx.send(OrchestratorCommand::NextVideo {
                            url: request.url().to_string(),
                        });
                    }
                },
                ListenOptions::default(),
            );

        if self.options.size_toggle {
            let size_tx = self.sender.clone();
            self.listeners.listen(
                &player,
                SIZE_CHANGE,
                move |event: &PlayerEvent| {
                    if let PlayerEvent::SizeChange { large } = event {
                        if let Some(tx) = size_tx.upgrade() {
                            let _ = tx.send(OrchestratorCommand::SizeChange { large: *large });
                        }
                    }
                },
                ListenOptions::default(),
            );
        }

        let origin = self.page_url.clone();
        self.spawn_resolution(ResolutionKind::Initial, origin);
    }

    fn on_next_video(&mut self, url: &str) {
        let target = match self.page_url.join(url) {
            Ok(target) => target,
            Err(e) => {
                self.services
                    .errors
                    .report("Ignoring next video with an invalid URL", &e.into());
                return;
            }
        };

        info!("Switching to next video {}", target);
        let thumbnail = self.placeholder_thumbnail(&target);
        self.page_url = target.clone();
        self.transition = TransitionState::Transitioned;
        self.dispose_tracker();
        self.next_video = None;

        if let Some(player) = &self.player {
            player.load_video_by_config(PlayerConfig::placeholder(thumbnail));
        }

        self.spawn_resolution(ResolutionKind::NextVideo, target);
    }

    fn placeholder_thumbnail(&self, target: &Url) -> Option<String> {
        self.next_video
            .as_ref()
            .filter(|next| next.url == target.as_str())
            .and_then(|next| next.thumbnail_url.clone())
            .or_else(|| {
                MediaId::from_page_url(target)
                    .and_then(|id| self.services.page.find_thumbnail(&id))
            })
    }

    fn spawn_resolution(&mut self, kind: ResolutionKind, origin: Url) {
        self.generation += 1;
        let generation = self.generation;

        let Some(sender) = self.sender.upgrade() else {
            debug!("Orchestrator is shutting down, skipping resolution of {}", origin);
            return;
        };

        let services = self.services.clone();
        let quality = self.options.quality_preference();
        let media_id = self.media_id.clone();
        let resolve_options = ResolveOptions {
            affiliate_id: self.options.affiliate_id.clone(),
            auto_play: match kind {
                ResolutionKind::Initial => self.options.auto_play,
                ResolutionKind::NextVideo => Some(true),
            },
        };

        debug!(
            "Resolving {:?} media from {} (generation {})",
            kind, origin, generation
        );

        tokio::spawn(async move {
            let resolved = match kind {
                ResolutionKind::Initial => {
                    services
                        .resolver
                        .get_media(&media_id, &quality, &origin, &resolve_options)
                        .await
                }
                ResolutionKind::NextVideo => {
                    services
                        .resolver
                        .get_media_by_url(&origin, &quality, &resolve_options)
                        .await
                }
            };

            let result = match resolved {
                Ok(media) => {
                    let next_video = match media.next_video_url.as_deref() {
                        Some(next_url) => match origin.join(next_url) {
                            Ok(next_url) => {
                                load_next_video(services.fragments.as_ref(), &next_url).await
                            }
                            Err(e) => {
                                debug!("Unusable next video URL '{}': {}", next_url, e);
                                None
                            }
                        },
                        None => None,
                    };
                    Ok(ResolvedMedia { media, next_video })
                }
                Err(e) => Err(OverlayError::resolution(&e)),
            };

            let _ = sender.send(OrchestratorCommand::MediaResolved {
                generation,
                origin,
                kind,
                result,
            });
        });
    }

    fn on_media_resolved(
        &mut self,
        generation: u64,
        origin: Url,
        kind: ResolutionKind,
        result: OverlayResult<ResolvedMedia>,
    ) {
        if generation != self.generation
            || (kind == ResolutionKind::NextVideo && origin != self.page_url)
        {
            debug!(
                "Discarding stale resolution of {} (generation {}, current {})",
                origin, generation, self.generation
            );
            return;
        }

        match result {
            Ok(ResolvedMedia {
                mut media,
                next_video,
            }) => {
                if kind == ResolutionKind::Initial {
                    if let Some(start_time) = self.options.start_time {
                        media.start_time = Some(start_time);
                    }
                }
                self.load(media, next_video);
            }
            Err(e) => {
                // The player keeps whatever it currently shows
                self.services
                    .errors
                    .report(&format!("Failed to resolve media for {}", origin), &e);
            }
        }
    }

    fn load(&mut self, media: Media, next_video: Option<NextVideoDescriptor>) {
        let Some(player) = self.player.clone() else {
            warn!("Media {} resolved without a player, not loading", media.id);
            return;
        };

        self.dispose_tracker();

        let config = PlayerConfig::from_media(&media, next_video.clone());
        let auto_play = media.auto_play;
        info!(
            "Loading {} '{}' (auto play: {}, next video: {})",
            media.id,
            config.title.as_deref().unwrap_or_default(),
            auto_play,
            next_video.is_some()
        );
        self.next_video = next_video;

        self.tracker = Some(ProgressTracker::start(
            Arc::new(media),
            &player,
            Arc::clone(&self.services.reporter),
            &self.options.tracker,
        ));

        if auto_play {
            player.load_video_by_config(config);
        } else {
            player.cue_video_by_config(config);
        }
    }

    fn on_fullscreen_change(&mut self, fullscreen: bool, current_time: f64) {
        if self.player.is_none() || fullscreen {
            return;
        }
        match self.transition {
            TransitionState::Initial => {
                trace!("Fullscreen exited without a transition, staying on page");
            }
            TransitionState::Transitioned => {
                let seconds = if current_time.is_finite() {
                    current_time.max(0.0).floor() as u64
                } else {
                    0
                };
                let url = with_time_param(&self.page_url, seconds);
                info!("Fullscreen exited after transition, replacing location with {}", url);
                self.services.page.replace_location(&url);
            }
        }
    }

    fn on_size_change(&mut self, large: bool) {
        let Some(player) = self.player.clone() else {
            return;
        };
        let resume = player.preferred_playback_state().is_playing();
        let mode = LayoutMode::from_large(large);
        debug!("Switching layout to {:?} (resume: {})", mode, resume);

        if let Err(e) = self.services.page.apply_layout(mode) {
            self.services.errors.report(
                "Failed to switch page layout",
                &OverlayError::Layout(format!("{:#}", e)),
            );
        }

        // Moving the player around can reset its rendering
        if resume {
            player.play_video(true);
        }
    }

    fn dispose_tracker(&mut self) {
        if let Some(mut tracker) = self.tracker.take() {
            tracker.dispose();
        }
    }

    fn snapshot(&self) -> OrchestratorSnapshot {
        OrchestratorSnapshot {
            page_url: self.page_url.clone(),
            transition: self.transition,
            player_ready: self.player.is_some(),
            tracked_media: self.tracker.as_ref().map(|t| t.media_id().clone()),
            generation: self.generation,
            next_video: self.next_video.clone(),
        }
    }

    fn teardown(&mut self) {
        self.dispose_tracker();
        self.listeners.remove_all();
        info!("PlaybackOrchestrator for {} shut down", self.media_id);
    }
}

/// `url` with its `t` parameter set to `seconds`, other parameters kept in
/// order.
pub fn with_time_param(url: &Url, seconds: u64) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != TIME_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut updated = url.clone();
    updated
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(TIME_PARAM, &seconds.to_string());
    updated
}
