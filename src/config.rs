//! TOML configuration parsing.
//!
//! The configuration is an explicit value loaded once at startup and passed
//! down to every component that needs it. Nothing reads the API base URL from
//! ambient state.
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000/api"
//! timeout_secs = 30
//!
//! [sync]
//! revert_after_ms = 2000
//!
//! [view]
//! selection = "clear-on-miss"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::view::SelectionPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// How long a `saved`/`error` save state stays visible before reverting to `idle`.
    #[serde(default = "default_revert_after_ms")]
    pub revert_after_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            revert_after_ms: default_revert_after_ms(),
        }
    }
}

fn default_revert_after_ms() -> u64 {
    2000
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ViewConfig {
    #[serde(default)]
    pub selection: SelectionPolicy,
}

impl Config {
    /// A config with every default filled in, pointing at `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                base_url: base_url.into(),
                timeout_secs: default_timeout_secs(),
            },
            sync: SyncConfig::default(),
            view: ViewConfig::default(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn revert_after(&self) -> Duration {
        Duration::from_millis(self.sync.revert_after_ms)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if url.is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!(
                "api.base_url must start with http:// or https://, got '{}'",
                url
            );
        }
        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be > 0");
        }
        if self.sync.revert_after_ms == 0 {
            anyhow::bail!("sync.revert_after_ms must be > 0");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
