//! Session configuration, loaded from YAML.
//!
//! ```yaml
//! cache_capacity: 25
//! fetch_timeout_ms: 30000
//! compression: lzma
//! window:
//!   start: 1600000000.0
//!   rate: 0.5
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use postal_cache::DEFAULT_CAPACITY;
use postal_codec::{Compression, FetchWindow};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid YAML for [`SessionConfig`].
    #[error("parsing config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Tunables of a [`crate::Session`]. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of decoded series kept in the cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Upper bound on one fetch, in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Compression applied by the data source.
    #[serde(default)]
    pub compression: Compression,
    /// Time window and decimation applied to every fetched series.
    #[serde(default)]
    pub window: FetchWindow,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            compression: Compression::default(),
            window: FetchWindow::default(),
        }
    }
}

impl SessionConfig {
    /// Load from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Fetch timeout as a [`Duration`].
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_fetch_timeout_ms() -> u64 {
    30_000
}
