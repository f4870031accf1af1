//! Playback orchestration for an embedded streaming-site video overlay.
//!
//! A [`PlaybackOrchestrator`] owns one player widget for a page view: it
//! resolves media, loads or cues it, tracks progress and intercepts
//! next-video transitions while the player is fullscreen.

#![allow(clippy::result_large_err)]

pub mod config;
pub mod events;
pub mod models;
pub mod player;
pub mod services;
pub mod utils;
pub mod widgets;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use player::{
    OrchestratorHandle, OrchestratorOptions, OrchestratorSnapshot, PlaybackOrchestrator, Services,
    TransitionState,
};
pub use utils::{OverlayError, OverlayResult, init_logging};
