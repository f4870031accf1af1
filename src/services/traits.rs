use anyhow::Result;
use async_trait::async_trait;
use tracing::error;
use url::Url;

use super::progress_reporter::ProgressReport;
use crate::models::{Media, MediaId};
use crate::utils::OverlayError;

/// Which stream variant to ask the resolution service for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QualityPreference {
    /// Let the service pick
    #[default]
    Default,
    Quality(String),
    /// Explicit pair; only used when both halves are configured
    FormatQuality { format: String, quality: String },
}

impl QualityPreference {
    /// The (format, quality) pair wins when both are present, otherwise the
    /// single quality preference is used.
    pub fn from_options(format: Option<&str>, quality: Option<&str>) -> Self {
        match (format, quality) {
            (Some(format), Some(quality)) => QualityPreference::FormatQuality {
                format: format.to_string(),
                quality: quality.to_string(),
            },
            (_, Some(quality)) => QualityPreference::Quality(quality.to_string()),
            _ => QualityPreference::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolveOptions {
    pub affiliate_id: Option<String>,
    /// `None` leaves the decision to the service
    pub auto_play: Option<bool>,
}

/// Opaque service that turns a media id or episode URL into a [`Media`].
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn get_media(
        &self,
        id: &MediaId,
        quality: &QualityPreference,
        page_url: &Url,
        options: &ResolveOptions,
    ) -> Result<Media>;

    async fn get_media_by_url(
        &self,
        url: &Url,
        quality: &QualityPreference,
        options: &ResolveOptions,
    ) -> Result<Media>;
}

/// Out-of-band fetch of the metadata fragment for a next-video URL.
#[async_trait]
pub trait FragmentFetcher: Send + Sync {
    async fn fetch_fragment(&self, url: &Url) -> Result<String>;
}

/// Remote endpoint that records playback progress.
///
/// Success means "did not fail"; the response is not interpreted.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, report: &ProgressReport) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    Normal,
    Wide,
}

impl LayoutMode {
    pub fn from_large(large: bool) -> Self {
        if large { LayoutMode::Wide } else { LayoutMode::Normal }
    }
}

/// Access to the host page.
pub trait PageAccessor: Send + Sync {
    /// Thumbnail image URL the page shows for `media_id`, if any
    fn find_thumbnail(&self, media_id: &MediaId) -> Option<String>;

    /// Move the layout containers and flip their classes for `mode`
    fn apply_layout(&self, mode: LayoutMode) -> Result<()>;

    /// Replace the current location without adding a history entry
    fn replace_location(&self, url: &Url);
}

/// Sink for failures that must not escape into event dispatch.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, context: &str, error: &OverlayError);
}

/// Default [`ErrorReporter`]: logs and moves on.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, context: &str, error: &OverlayError) {
        error!("{}: {}", context, error);
    }
}
