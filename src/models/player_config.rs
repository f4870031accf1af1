use serde::{Deserialize, Serialize};
use std::fmt;

use super::media::{Media, Subtitle};

/// Length of the upcoming video.
///
/// A fragment that carries no usable duration yields `Unknown` rather than
/// zero, so the player can tell "no data" from "empty video".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum VideoDuration {
    Known(f64),
    #[default]
    Unknown,
}

impl VideoDuration {
    /// Finite, non-negative values become `Known`; anything else is `Unknown`
    pub fn from_seconds(seconds: Option<f64>) -> Self {
        match seconds {
            Some(s) if s.is_finite() && s >= 0.0 => VideoDuration::Known(s),
            _ => VideoDuration::Unknown,
        }
    }

    pub fn seconds(&self) -> Option<f64> {
        match self {
            VideoDuration::Known(s) => Some(*s),
            VideoDuration::Unknown => None,
        }
    }
}

impl fmt::Display for VideoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoDuration::Known(s) => write!(f, "{}", s),
            VideoDuration::Unknown => write!(f, "NaN"),
        }
    }
}

/// Metadata of the episode that follows the one being played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextVideoDescriptor {
    pub episode_number: String,
    pub episode_title: String,
    pub duration: VideoDuration,
    pub url: String,
    pub thumbnail_url: Option<String>,
}

impl NextVideoDescriptor {
    pub fn title(&self) -> String {
        format!("Episode {} – {}", self.episode_number, self.episode_title)
    }
}

/// What the player widget is loaded with. Built fresh for every load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub title: Option<String>,
    pub url: Option<String>,
    pub duration: Option<f64>,
    pub subtitles: Vec<Subtitle>,
    pub start_time: Option<f64>,
    pub auto_play: bool,
    pub thumbnail_url: Option<String>,
    pub next_video: Option<NextVideoDescriptor>,
}

impl PlayerConfig {
    pub fn from_media(media: &Media, next_video: Option<NextVideoDescriptor>) -> Self {
        Self {
            title: Some(media.metadata.display_title()),
            url: Some(media.stream.file_url.clone()),
            duration: Some(media.stream.duration),
            subtitles: media.subtitles.clone(),
            start_time: media.start_time,
            auto_play: media.auto_play,
            thumbnail_url: media.metadata.episode_image_url.clone(),
            next_video,
        }
    }

    /// Shown while the next media resolves, so the player never goes blank
    pub fn placeholder(thumbnail_url: Option<String>) -> Self {
        Self {
            thumbnail_url,
            ..Default::default()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.url.is_none()
    }
}
