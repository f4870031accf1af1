use serde::{Deserialize, Serialize};

use super::identifiers::{EncodeId, MediaId};

/// A playable unit as resolved by the media resolution service.
///
/// Never mutated after resolution; every transition produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: MediaId,
    pub stream: StreamInfo,
    pub metadata: MediaMetadata,
    #[serde(default)]
    pub subtitles: Vec<Subtitle>,
    /// Seconds into the video where playback should begin
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub auto_play: bool,
    /// Page URL of the following episode, possibly relative
    #[serde(default)]
    pub next_video_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub file_url: String,
    /// Total length in seconds
    pub duration: f64,
    pub encode_id: EncodeId,
    pub media_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub series_title: String,
    pub episode_number: String,
    pub episode_title: String,
    #[serde(default)]
    pub episode_image_url: Option<String>,
}

impl MediaMetadata {
    /// `"<series> Episode <number> – <episode title>"`
    pub fn display_title(&self) -> String {
        format!(
            "{} Episode {} – {}",
            self.series_title, self.episode_number, self.episode_title
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    pub id: String,
    pub title: String,
    pub language: String,
    pub url: String,
    #[serde(default)]
    pub is_default: bool,
}
