use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::AsrModelSize;
use crate::file_utils::FileManager;
use crate::preview::download::DEFAULT_DOWNLOAD_NAME;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Pipeline backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Preview controller settings
    #[serde(default)]
    pub preview: PreviewConfig,

    /// Directory downloads are saved into (platform download dir if unset)
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    /// ASR model size used when submitting jobs
    #[serde(default)]
    pub asr_model_size: AsrModelSize,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Pipeline backend connection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL of the pipeline service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds; uploads wait for processing to finish
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Preview controller settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PreviewConfig {
    /// Delay before re-synchronizing tracks once the video is ready
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Delay before revoking the temporary handle of a download
    #[serde(default = "default_release_delay_ms")]
    pub release_delay_ms: u64,

    /// Filename used when the server does not suggest one
    #[serde(default = "default_download_name")]
    pub default_download_name: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            release_delay_ms: default_release_delay_ms(),
            default_download_name: default_download_name(),
        }
    }
}

impl PreviewConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn release_delay(&self) -> Duration {
        Duration::from_millis(self.release_delay_ms)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching log crate filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    300 // processing happens inside the upload request
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_settle_delay_ms() -> u64 {
    200
}

fn default_release_delay_ms() -> u64 {
    100
}

fn default_download_name() -> String {
    DEFAULT_DOWNLOAD_NAME.to_string()
}

// Upper bound for the preview delays; anything longer is a typo
const MAX_DELAY_MS: u64 = 10_000;

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.backend.base_url)
            .with_context(|| format!("Invalid backend base URL: {}", self.backend.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("Backend base URL must use http or https: {}", self.backend.base_url));
        }

        if self.backend.timeout_secs == 0 {
            return Err(anyhow!("Backend timeout must be greater than zero"));
        }

        if self.preview.settle_delay_ms > MAX_DELAY_MS || self.preview.release_delay_ms > MAX_DELAY_MS {
            return Err(anyhow!("Preview delays must not exceed {} ms", MAX_DELAY_MS));
        }

        if FileManager::sanitize_filename(&self.preview.default_download_name) != self.preview.default_download_name
            || self.preview.default_download_name.is_empty()
        {
            return Err(anyhow!(
                "Default download name must be a plain file name: {:?}",
                self.preview.default_download_name
            ));
        }

        Ok(())
    }

    /// Directory downloads are saved into
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(FileManager::default_download_dir)
    }

    /// Load the configuration file, creating it with defaults if missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;
        Ok(config)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            backend: BackendConfig::default(),
            preview: PreviewConfig::default(),
            download_dir: None,
            asr_model_size: AsrModelSize::default(),
            log_level: LogLevel::default(),
        }
    }
}
