use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const BASE_URL_ENV: &str = "VIDEO_COACH_API_URL";

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct ServiceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Caller-imposed limit on a single analysis request. Unset means wait forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ServiceConfig {
    /// Get the base URL, falling back to the local development service
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub default_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
        }
    }
}

impl OutputConfig {
    pub fn prefers_pretty(&self) -> bool {
        self.default_format == "pretty"
    }
}

fn default_format() -> String {
    "json".to_string()
}

impl Config {
    /// Load config from file or default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {:?}", config_path))?
        } else {
            tracing::debug!("No config at {:?}, using defaults", config_path);
            Config::default()
        };

        config.apply_env_fallbacks(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Default config path: ~/.config/video-coach/config.toml
    pub fn default_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("video-coach").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("video-coach")
            .join("config.toml")
    }

    /// Fill an unset base URL from the environment
    fn apply_env_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.service.base_url.is_none() {
            self.service.base_url = lookup(BASE_URL_ENV).filter(|url| !url.trim().is_empty());
        }
    }

    pub fn set_base_url(&mut self, url: &str) {
        self.service.base_url = Some(url.trim_end_matches('/').to_string());
    }

    /// Write config to the given path, or the default location
    pub fn write(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, toml_str)
            .with_context(|| format!("Failed to write config to {:?}", path))?;
        Ok(path)
    }
}
