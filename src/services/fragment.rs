use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use super::traits::FragmentFetcher;
use crate::models::{NextVideoDescriptor, VideoDuration};
use crate::utils::{OverlayError, OverlayResult};

const METADATA_ELEMENT: &str = "media_metadata";

/// Fetches next-video metadata fragments over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFragmentFetcher {
    client: reqwest::Client,
}

impl HttpFragmentFetcher {
    pub fn new(timeout: Duration) -> OverlayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OverlayError::from_reqwest)?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FragmentFetcher for HttpFragmentFetcher {
    async fn fetch_fragment(&self, url: &Url) -> Result<String> {
        debug!("Fetching next video fragment from {}", url);
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/xml, text/xml")
            .send()
            .await
            .map_err(OverlayError::from_reqwest)?
            .error_for_status()
            .map_err(OverlayError::from_reqwest)?;

        response
            .text()
            .await
            .context("Failed to read fragment body")
    }
}

#[derive(Default)]
struct FragmentFields {
    episode_number: Option<String>,
    episode_title: Option<String>,
    duration: Option<String>,
    episode_image_url: Option<String>,
}

impl FragmentFields {
    /// The first occurrence of a field wins; repeats are ignored.
    fn set(&mut self, element: &str, text: String) {
        let slot = match element {
            "episode_number" => &mut self.episode_number,
            "episode_title" => &mut self.episode_title,
            "duration" => &mut self.duration,
            "episode_image_url" => &mut self.episode_image_url,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(text);
        }
    }
}

/// Parse a `<media_metadata>` fragment into a [`NextVideoDescriptor`].
///
/// `episode_number` and `episode_title` are required. A missing or
/// non-numeric `duration` becomes [`VideoDuration::Unknown`].
pub fn parse_next_video(document: &str, url: &Url) -> OverlayResult<NextVideoDescriptor> {
    let mut reader = Reader::from_str(document);

    let mut fields = FragmentFields::default();
    let mut found = false;
    let mut depth_in_metadata = 0usize;
    // Direct child of <media_metadata> being read, with its text so far.
    // Text inside nested inline markup belongs to that child.
    let mut field: Option<(String, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if depth_in_metadata > 0 {
                    depth_in_metadata += 1;
                    if depth_in_metadata == 2 {
                        let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                        field = Some((name, String::new()));
                    }
                } else if e.local_name().as_ref() == METADATA_ELEMENT.as_bytes() {
                    found = true;
                    depth_in_metadata = 1;
                }
            }
            Ok(Event::Text(e)) => {
                if let Some((_, text)) = field.as_mut() {
                    let unescaped = e
                        .unescape()
                        .map_err(|err| OverlayError::Parse(err.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some((_, text)) = field.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                if depth_in_metadata > 0 {
                    if depth_in_metadata == 2 {
                        if let Some((name, text)) = field.take() {
                            fields.set(&name, text);
                        }
                    }
                    depth_in_metadata -= 1;
                    if depth_in_metadata == 0 {
                        break;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(OverlayError::Parse(format!(
                    "malformed fragment at byte {}: {}",
                    reader.buffer_position(),
                    err
                )));
            }
            _ => {}
        }
    }

    if !found {
        return Err(OverlayError::Parse(format!(
            "no <{}> element in fragment",
            METADATA_ELEMENT
        )));
    }

    let episode_number = non_empty(fields.episode_number)
        .ok_or_else(|| OverlayError::Parse("missing episode_number".to_string()))?;
    let episode_title = non_empty(fields.episode_title)
        .ok_or_else(|| OverlayError::Parse("missing episode_title".to_string()))?;
    let duration = VideoDuration::from_seconds(
        non_empty(fields.duration).and_then(|d| d.trim().parse::<f64>().ok()),
    );

    Ok(NextVideoDescriptor {
        episode_number,
        episode_title,
        duration,
        url: url.to_string(),
        thumbnail_url: non_empty(fields.episode_image_url),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fetch and parse the descriptor for `url`.
///
/// Every failure degrades to `None`: a missing next-video section is not an
/// error for the load that asked for it.
pub async fn load_next_video(
    fetcher: &dyn FragmentFetcher,
    url: &Url,
) -> Option<NextVideoDescriptor> {
    let document = match fetcher.fetch_fragment(url).await {
        Ok(document) => document,
        Err(e) => {
            debug!("Next video fragment unavailable for {}: {:#}", url, e);
            return None;
        }
    };

    match parse_next_video(&document, url) {
        Ok(descriptor) => {
            trace!("Parsed next video descriptor: {:?}", descriptor);
            Some(descriptor)
        }
        Err(e) => {
            debug!("Ignoring unparseable next video fragment for {}: {}", url, e);
            None
        }
    }
}
