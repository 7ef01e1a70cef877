//! Configuration for the tasklist client
//!
//! Stored in `<config dir>/tasklist/config.toml`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `api_url`
pub const API_URL_ENV: &str = "TASKLIST_API_URL";

/// tasklist client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the item service
    pub api_url: String,

    /// Per-request timeout in seconds; no timeout when unset
    pub request_timeout_secs: Option<u64>,

    /// Priority for new items when none is given (1=low, 2=medium, 3=high)
    pub default_priority: u8,

    /// Display settings
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:3000".to_string(),
            request_timeout_secs: None,
            default_priority: 1,
            display: DisplayConfig::default(),
        }
    }
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use colors in output
    pub colors: bool,

    /// Date format for due dates
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a TOML file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `<config dir>/tasklist/config.toml`, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tasklist").join("config.toml"))
    }

    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV)
            && !url.is_empty()
        {
            self.api_url = url;
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        crate::Priority::try_from(self.default_priority)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        if self.api_url.is_empty() {
            return Err(crate::Error::Config("api_url must not be empty".into()));
        }
        Ok(())
    }

    /// Generate a default config file with comments
    pub fn default_with_comments() -> String {
        r#"# tasklist configuration

# Base URL of the item service
api_url = "http://127.0.0.1:3000"

# Per-request timeout in seconds (no timeout when unset)
# request_timeout_secs = 10

# Priority for new items (1=low, 2=medium, 3=high)
default_priority = 1

[display]
# Use colors in output
colors = true

# Date format for due dates (strftime format)
date_format = "%Y-%m-%d"
"#
        .to_string()
    }
}
