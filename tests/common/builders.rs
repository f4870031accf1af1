use stream_overlay::models::{EncodeId, Media, MediaId, MediaMetadata, StreamInfo, Subtitle};

pub struct MediaBuilder {
    media: Media,
}

impl MediaBuilder {
    pub fn episode(id: &str) -> Self {
        Self {
            media: Media {
                id: MediaId::new(id),
                stream: StreamInfo {
                    file_url: format!("https://cdn.example.com/{}/master.m3u8", id),
                    duration: 1420.0,
                    encode_id: EncodeId::new(format!("enc-{}", id)),
                    media_type: "anime".to_string(),
                },
                metadata: MediaMetadata {
                    series_title: "Mock Series".to_string(),
                    episode_number: "1".to_string(),
                    episode_title: "Beginnings".to_string(),
                    episode_image_url: None,
                },
                subtitles: Vec::new(),
                start_time: None,
                auto_play: false,
                next_video_url: None,
            },
        }
    }

    pub fn number(mut self, number: &str, title: &str) -> Self {
        self.media.metadata.episode_number = number.to_string();
        self.media.metadata.episode_title = title.to_string();
        self
    }

    pub fn next_video(mut self, url: &str) -> Self {
        self.media.next_video_url = Some(url.to_string());
        self
    }

    pub fn auto_play(mut self) -> Self {
        self.media.auto_play = true;
        self
    }

    pub fn with_subtitle(mut self, language: &str) -> Self {
        self.media.subtitles.push(Subtitle {
            id: format!("sub-{}", language),
            title: language.to_uppercase(),
            language: language.to_string(),
            url: format!("https://cdn.example.com/subs/{}.ass", language),
            is_default: self.media.subtitles.is_empty(),
        });
        self
    }

    pub fn build(self) -> Media {
        self.media
    }
}
