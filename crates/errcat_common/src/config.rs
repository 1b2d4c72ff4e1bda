//! Errcat Configuration
//!
//! Which catalog to open and how to access it.
//! Config file: ~/.config/errcat/config.toml or /etc/errcat/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_TTL;
use crate::query::{ErrorCatalog, Strategy};
use crate::source::FileSource;

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "ERRCAT_CONFIG";

/// Default catalog location, relative to the working directory
pub const DEFAULT_CATALOG_PATH: &str = "Error/ErrorLog.xml";

/// Where the catalog document lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

/// Snapshot cache settings (cached strategy only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a snapshot is served before it is re-parsed
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Main errcat configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Access strategy
    #[serde(default)]
    pub strategy: Strategy,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl CatalogConfig {
    /// Get default user config path: ~/.config/errcat/config.toml
    pub fn user_config_path() -> Result<PathBuf> {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg).join("errcat").join("config.toml"));
        }

        let home = std::env::var("HOME").context("Cannot determine home directory")?;
        Ok(Path::new(&home)
            .join(".config")
            .join("errcat")
            .join("config.toml"))
    }

    /// Get system config path: /etc/errcat/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/errcat/config.toml")
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. $ERRCAT_CONFIG
    /// 2. User config (~/.config/errcat/config.toml)
    /// 3. System config (/etc/errcat/config.toml)
    /// 4. Defaults
    pub fn load() -> Result<Self> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            return Self::load_from(Path::new(&explicit));
        }

        if let Ok(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::load_from(&system_path);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: CatalogConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Build the query service described by this configuration.
    pub fn open_catalog(&self) -> ErrorCatalog {
        let source = Arc::new(FileSource::new(&self.source.path));
        ErrorCatalog::with_strategy(self.strategy, source, self.cache.ttl())
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from(DEFAULT_CATALOG_PATH)
}

fn default_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL.as_secs()
}
