use crate::events::{EventSource, PlayerEvent};
use crate::models::PlayerConfig;

/// Playback state as reported by the player widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Unstarted,
    Buffering,
    Playing,
    Paused,
    Ended,
}

impl PlaybackState {
    /// States that count as "the user wants this playing"
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Buffering)
    }
}

/// Capability interface of the hosted player widget.
///
/// Events (`fullscreenchange`, `nextvideo`, `playbackstatechange`,
/// `sizechange`) are subscribed through the [`EventSource`] supertrait.
pub trait VideoPlayer: EventSource<PlayerEvent> {
    fn is_fullscreen(&self) -> bool;

    /// Playhead position in seconds
    fn current_time(&self) -> f64;

    /// The state the user asked for, which may differ from what is rendering
    fn preferred_playback_state(&self) -> PlaybackState;

    fn play_video(&self, resume: bool);

    /// Load and start priming `config` immediately
    fn load_video_by_config(&self, config: PlayerConfig);

    /// Stage `config` without starting playback
    fn cue_video_by_config(&self, config: PlayerConfig);
}
