use std::sync::atomic::{AtomicBool, Ordering};

use super::emitter::Event;
use crate::player::PlaybackState;

pub const FULLSCREEN_CHANGE: &str = "fullscreenchange";
pub const NEXT_VIDEO: &str = "nextvideo";
pub const PLAYBACK_STATE_CHANGE: &str = "playbackstatechange";
pub const SIZE_CHANGE: &str = "sizechange";

/// Events emitted by the player widget.
#[derive(Debug)]
pub enum PlayerEvent {
    /// Fullscreen was entered or exited; query the player for which
    FullscreenChange,
    NextVideo(NextVideoRequest),
    PlaybackStateChange(PlaybackState),
    SizeChange { large: bool },
}

impl Event for PlayerEvent {
    fn event_name(&self) -> &str {
        match self {
            PlayerEvent::FullscreenChange => FULLSCREEN_CHANGE,
            PlayerEvent::NextVideo(_) => NEXT_VIDEO,
            PlayerEvent::PlaybackStateChange(_) => PLAYBACK_STATE_CHANGE,
            PlayerEvent::SizeChange { .. } => SIZE_CHANGE,
        }
    }
}

/// Request to move on to the next video.
///
/// Unless a listener calls [`NextVideoRequest::prevent_default`], the host
/// navigates the page to `url` after dispatch.
#[derive(Debug)]
pub struct NextVideoRequest {
    url: String,
    default_prevented: AtomicBool,
}

impl NextVideoRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            default_prevented: AtomicBool::new(false),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::SeqCst);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }
}
