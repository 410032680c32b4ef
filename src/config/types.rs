use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Applied uniformly to connect, read and write.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_session_id")]
    pub session_id: String,
    /// Root of the farm data service (`/api/v1/...`); defaults to `base_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.client.validate()
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(&self.base_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("Invalid base_url '{}': {}", self.base_url, e)))?;

        if let Some(api_base_url) = &self.api_base_url {
            reqwest::Url::parse(api_base_url).map_err(|e| {
                Error::config(format!("Invalid api_base_url '{}': {}", api_base_url, e))
            })?;
        }

        if self.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be greater than zero"));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::config(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }

        if self.session_id.trim().is_empty() {
            return Err(Error::config("session_id must not be empty"));
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            jpeg_quality: default_jpeg_quality(),
            session_id: default_session_id(),
            api_base_url: None,
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_session_id() -> String {
    "default".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
