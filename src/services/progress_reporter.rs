use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::traits::ProgressReporter;
use crate::utils::{OverlayError, OverlayResult};

pub const DEFAULT_REQUEST_TAG: &str = "RpcApiVideo_VideoView";

/// One "record progress" call, serialized as a form body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    /// Attempt number for this media, starting at 1
    #[serde(rename = "cbcallcount")]
    pub call_count: u64,
    /// Whole seconds since tracking began
    #[serde(rename = "cbelapsed")]
    pub elapsed: u64,
    #[serde(rename = "video_encode_id")]
    pub encode_id: String,
    #[serde(rename = "req")]
    pub request_tag: String,
    pub media_type: String,
    /// Whole seconds into the video
    pub playhead: u64,
    pub media_id: String,
}

/// Posts [`ProgressReport`]s to the remote progress endpoint.
#[derive(Debug, Clone)]
pub struct HttpProgressReporter {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpProgressReporter {
    pub fn new(endpoint: Url, timeout: Duration) -> OverlayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OverlayError::from_reqwest)?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ProgressReporter for HttpProgressReporter {
    async fn report(&self, report: &ProgressReport) -> Result<()> {
        debug!(
            "Reporting progress for media {} - playhead: {}s, attempt: {}",
            report.media_id, report.playhead, report.call_count
        );

        self.client
            .post(self.endpoint.clone())
            .form(report)
            .send()
            .await
            .map_err(OverlayError::from_reqwest)?;

        Ok(())
    }
}
