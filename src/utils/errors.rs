use thiserror::Error;

/// Typed error enum for the overlay's public boundaries.
///
/// Collaborator traits return `anyhow::Result`; these variants are what the
/// crate hands back to its own callers, so they can tell a programming error
/// (`RangeViolation`) from a runtime one (`Network`, `Resolution`).
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Media resolution failed: {0}")]
    Resolution(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse document: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Value {value} is outside of [{min}, {max}]")]
    RangeViolation { value: f64, min: f64, max: f64 },

    #[error("Page layout error: {0}")]
    Layout(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Orchestrator is no longer running")]
    ChannelClosed,
}

impl OverlayError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            OverlayError::Network(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            OverlayError::Network(format!("Connection failed: {}", error))
        } else if error.is_request() {
            OverlayError::Network(format!("Request error: {}", error))
        } else if error.is_status() {
            OverlayError::Network(format!("Unexpected status: {}", error))
        } else {
            OverlayError::Network(error.to_string())
        }
    }

    /// Wrap a collaborator failure from the media resolution service
    pub fn resolution(error: &anyhow::Error) -> Self {
        OverlayError::Resolution(format!("{:#}", error))
    }

    /// Network failures are the only ones a later attempt can fix
    pub fn is_transient(&self) -> bool {
        matches!(self, OverlayError::Network(_))
    }
}

pub type OverlayResult<T> = Result<T, OverlayError>;
