//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the rate service URL, the optional application-shell
//! origin for the asset cache, and the last selected currency pair.
//!
//! Configuration is stored at `~/.config/ratecache/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_URL;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "ratecache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the conversion rate service.
    pub api_url: String,
    /// Origin hosting the static application shell. When set, the asset
    /// cache installs the shell manifest from here at startup.
    pub app_url: Option<String>,
    /// Last selected pair, restored at startup.
    pub last_from: String,
    pub last_to: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            app_url: None,
            last_from: "USD".to_string(),
            last_to: "EUR".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };

        // Environment override, mainly for pointing tests and development
        // at a local service.
        if let Ok(url) = std::env::var("RATECACHE_API_URL") {
            config.api_url = url;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory backing the local persistent store.
    pub fn store_dir(&self) -> Result<PathBuf> {
        Ok(Self::cache_root()?.join("store"))
    }

    /// Directory holding asset cache buckets.
    pub fn assets_dir(&self) -> Result<PathBuf> {
        Ok(Self::cache_root()?.join("assets"))
    }

    fn cache_root() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
