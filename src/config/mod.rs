mod types;

pub use types::*;

use crate::Result;
use std::{env, path::Path};
use tracing::debug;

pub const BASE_URL_ENV: &str = "KRISHI_BASE_URL";
pub const API_BASE_URL_ENV: &str = "KRISHI_API_BASE_URL";

/// Loads the configuration from `path`, falling back to defaults when the file
/// does not exist, then applies environment overrides and validates.
pub async fn load_from(path: impl AsRef<Path>) -> Result<Config> {
    load_from_with(path, |key| env::var(key).ok()).await
}

/// Same as [`load_from`] but resolves overrides through `lookup` instead of
/// the process environment.
pub async fn load_from_with<F>(path: impl AsRef<Path>, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let path = path.as_ref();
    debug!("Loading configuration from: {}", path.display());

    let mut config: Config = match tokio::fs::read_to_string(path).await {
        Ok(config_str) => serde_yaml::from_str(&config_str)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No configuration file at {}, using defaults", path.display());
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(base_url) = lookup(BASE_URL_ENV) {
        debug!("Overriding base URL from {}", BASE_URL_ENV);
        config.client.base_url = base_url;
    }
    if let Some(api_base_url) = lookup(API_BASE_URL_ENV) {
        debug!("Overriding API base URL from {}", API_BASE_URL_ENV);
        config.client.api_base_url = Some(api_base_url);
    }

    config.validate()?;
    Ok(config)
}
