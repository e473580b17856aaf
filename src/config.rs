//! Configuration for the assistant
//!
//! Holds API credentials, playback defaults and runtime tuning. Loaded from a
//! TOML file where every field is optional.

use crate::{ParleyError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder left in fresh config files for the weather key
pub const WEATHER_KEY_PLACEHOLDER: &str = "YOUR_OPENWEATHERMAP_API_KEY";

/// Placeholder left in fresh config files for the news key
pub const NEWS_KEY_PLACEHOLDER: &str = "YOUR_NEWSAPI_KEY";

/// Configuration for the complete assistant
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// OpenWeatherMap API key
    pub weather_api_key: Option<String>,

    /// NewsAPI key
    pub news_api_key: Option<String>,

    /// Volume applied whenever a playlist starts
    pub default_volume: f32,

    /// Directory holding persisted key-value data (app shortcuts)
    pub store_dir: PathBuf,

    /// Whether the host runs in a secure context (required for the camera)
    pub secure_context: bool,

    /// Channel buffer size
    pub channel_buffer_size: usize,

    /// Period between countdown ticks
    pub tick_interval_ms: u64,

    /// Timeout for weather/news requests
    pub http_timeout_ms: u64,

    /// Shutdown timeout in milliseconds
    pub shutdown_timeout_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            news_api_key: None,
            default_volume: 0.5,
            store_dir: default_store_dir(),
            secure_context: true,
            channel_buffer_size: 100,
            tick_interval_ms: 1000,
            http_timeout_ms: 10_000,
            shutdown_timeout_ms: 5000,
        }
    }
}

impl AssistantConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ParleyError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ParleyError::ConfigError(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Set the weather API key
    pub fn with_weather_api_key(mut self, key: impl Into<String>) -> Self {
        self.weather_api_key = Some(key.into());
        self
    }

    /// Set the news API key
    pub fn with_news_api_key(mut self, key: impl Into<String>) -> Self {
        self.news_api_key = Some(key.into());
        self
    }

    /// Set the persisted data directory
    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = dir.into();
        self
    }

    /// Mark the host as an insecure context (camera disabled)
    pub fn insecure(mut self) -> Self {
        self.secure_context = false;
        self
    }

    /// Set the countdown tick period
    pub fn with_tick_interval_ms(mut self, interval: u64) -> Self {
        self.tick_interval_ms = interval;
        self
    }

    /// Set the channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }

    /// Weather key, if one other than the placeholder is configured
    pub fn weather_key(&self) -> Option<&str> {
        usable_key(self.weather_api_key.as_deref(), WEATHER_KEY_PLACEHOLDER)
    }

    /// News key, if one other than the placeholder is configured
    pub fn news_key(&self) -> Option<&str> {
        usable_key(self.news_api_key.as_deref(), NEWS_KEY_PLACEHOLDER)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(ParleyError::ConfigError(format!(
                "default_volume must be within 0.0..=1.0, got {}",
                self.default_volume
            )));
        }

        if self.tick_interval_ms == 0 {
            return Err(ParleyError::ConfigError(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.channel_buffer_size == 0 {
            return Err(ParleyError::ConfigError(
                "channel_buffer_size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn usable_key<'a>(key: Option<&'a str>, placeholder: &str) -> Option<&'a str> {
    key.map(str::trim)
        .filter(|k| !k.is_empty() && *k != placeholder)
}

/// `<config_dir>/parley/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("parley").join("config.toml"))
}

fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parley")
}
