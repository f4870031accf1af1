use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::player::{OrchestratorOptions, TrackerSettings};
use crate::services::DEFAULT_REQUEST_TAG;
use crate::utils::OverlayResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub progress: ProgressConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_play: Option<bool>,

    #[serde(default = "default_true")]
    pub size_toggle: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_request_tag")]
    pub request_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Config {
    /// Load from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        info!("Config loaded successfully");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("stream-overlay").join("config.toml"))
    }

    /// Orchestrator options for one page view. `start_time` usually comes
    /// from the page URL rather than the file.
    pub fn orchestrator_options(&self, start_time: Option<f64>) -> OrchestratorOptions {
        OrchestratorOptions {
            quality: self.playback.quality.clone(),
            format: self.playback.format.clone(),
            start_time,
            size_toggle: self.playback.size_toggle,
            auto_play: self.playback.auto_play,
            affiliate_id: self.playback.affiliate_id.clone(),
            tracker: self.tracker_settings(),
        }
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            interval: Duration::from_secs(self.progress.interval_secs.max(1)),
            request_tag: self.progress.request_tag.clone(),
        }
    }

    pub fn progress_endpoint(&self) -> OverlayResult<Url> {
        Ok(Url::parse(&self.progress.endpoint)?)
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout_secs)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            quality: None,
            format: None,
            auto_play: None,
            size_toggle: default_true(),
            affiliate_id: None,
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            interval_secs: default_interval(),
            request_tag: default_request_tag(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_endpoint() -> String { "https://www.crunchyroll.com/ajax/".to_string() }
fn default_interval() -> u64 { 30 }
fn default_request_tag() -> String { DEFAULT_REQUEST_TAG.to_string() }
fn default_timeout() -> u64 { 30 }
