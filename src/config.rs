//! Service configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! environment variables. The resulting [`ServiceConfig`] is built once in
//! `main` and cloned into each component.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Minimum length of a usable osu! API v1 key.
const MIN_API_KEY_LEN: usize = 16;

#[derive(Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    Io(String),
    /// The config file is not valid TOML for [`ServiceConfig`].
    Parse(String),
    /// A value is present but unusable.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Could not read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Could not parse config: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub api_key: String,
    pub database_path: PathBuf,
    pub beatmap_dir: PathBuf,
    pub listen_addr: String,
    /// Base URL of the osu! API v1 (without trailing slash).
    pub api_base_url: String,
    /// Base URL serving raw `.osu` files by beatmap id.
    pub origin_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            database_path: PathBuf::from("data/pp.db"),
            beatmap_dir: PathBuf::from("data/beatmaps"),
            listen_addr: "0.0.0.0:5000".to_string(),
            api_base_url: "https://osu.ppy.sh/api".to_string(),
            origin_base_url: "https://osu.ppy.sh/osu".to_string(),
            request_timeout_secs: 15,
        }
    }
}

impl ServiceConfig {
    /// Loads the config file named by `PPCACHE_CONFIG` (default `ppcache.toml`),
    /// applies environment overrides and validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("PPCACHE_CONFIG").unwrap_or_else(|_| "ppcache.toml".to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies overrides from a variable source (the process environment in production).
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var("OSU_API_KEY") {
            self.api_key = key;
        }
        if let Some(path) = var("PPCACHE_DATABASE") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(dir) = var("PPCACHE_BEATMAP_DIR") {
            self.beatmap_dir = PathBuf::from(dir);
        }
        if let Some(addr) = var("PPCACHE_LISTEN") {
            self.listen_addr = addr;
        }
        if let Some(url) = var("PPCACHE_API_BASE") {
            self.api_base_url = url;
        }
        if let Some(url) = var("PPCACHE_ORIGIN_BASE") {
            self.origin_base_url = url;
        }
        if let Some(secs) = var("PPCACHE_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs.parse().map_err(|_| {
                ConfigError::Invalid(format!("PPCACHE_REQUEST_TIMEOUT_SECS={}", secs))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.len() < MIN_API_KEY_LEN {
            return Err(ConfigError::Invalid("OSU_API_KEY not set".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
