//! # vfhash-config
//!
//! Configuration management for the vfhash mounted-file hasher.
//!
//! Loads configuration from:
//! 1. `~/.vfhash/config.toml` (global)
//! 2. `.vfhash/config.toml` (project-local, overrides global)
//! 3. Environment variables (highest priority)

pub mod logging;
pub mod testing;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Chunk size used when streaming file content into the hasher (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Upper bound on the configured chunk size (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Name given to the background hashing thread.
pub const DEFAULT_THREAD_NAME: &str = "vfhash-worker";

/// Virtual mount prefixes accepted for hashing.
pub const DEFAULT_PREFIXES: [&str; 7] = [
    "platform:/",
    "common:/",
    "update:/",
    "update2:/",
    "audio:/",
    "commoncrc:/",
    "platformcrc:/",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML render error: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hasher: HasherConfig,
    /// Virtual prefix -> host directory
    pub mounts: BTreeMap<String, PathBuf>,
}

impl Config {
    /// Load config from standard locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(
            Self::global_config_path().as_deref(),
            Some(Path::new(".vfhash/config.toml")),
        )
    }

    /// Load config from explicit global/project files, then apply env overrides.
    ///
    /// Missing files are skipped.
    pub fn load_from(global: Option<&Path>, project: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(global_path) = global {
            if global_path.exists() {
                debug!("Loading global config from {:?}", global_path);
                let contents = std::fs::read_to_string(global_path)?;
                config = toml::from_str(&contents)?;
            }
        }

        if let Some(project_path) = project {
            if project_path.exists() {
                debug!("Loading project config from {:?}", project_path);
                let contents = std::fs::read_to_string(project_path)?;
                let project_config: Config = toml::from_str(&contents)?;
                config.merge(project_config);
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Global config path: ~/.vfhash/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".vfhash/config.toml"))
    }

    /// Merge another config (project overrides)
    fn merge(&mut self, other: Config) {
        let defaults = HasherConfig::default();
        if other.hasher.chunk_size != defaults.chunk_size {
            self.hasher.chunk_size = other.hasher.chunk_size;
        }
        if other.hasher.thread_name != defaults.thread_name {
            self.hasher.thread_name = other.hasher.thread_name;
        }
        if !other.hasher.extra_prefixes.is_empty() {
            self.hasher.extra_prefixes = other.hasher.extra_prefixes;
        }
        if other.hasher.clear_on_shutdown {
            self.hasher.clear_on_shutdown = true;
        }
        // Project mounts add to (and shadow) global mounts
        self.mounts.extend(other.mounts);
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognised keys: `VFHASH_CHUNK_SIZE`, `VFHASH_THREAD_NAME`,
    /// `VFHASH_EXTRA_PREFIXES` (comma-separated).
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(size) = lookup("VFHASH_CHUNK_SIZE") {
            if let Ok(n) = size.trim().parse() {
                self.hasher.chunk_size = n;
            }
        }
        if let Some(name) = lookup("VFHASH_THREAD_NAME") {
            if !name.is_empty() {
                self.hasher.thread_name = name;
            }
        }
        if let Some(prefixes) = lookup("VFHASH_EXTRA_PREFIXES") {
            self.hasher.extra_prefixes = prefixes
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
    }

    /// Render this config as pretty TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate default config TOML string
    pub fn default_toml() -> String {
        Config::default().to_toml().unwrap_or_default()
    }
}

/// Hash worker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    /// Bytes read from the device per call
    pub chunk_size: usize,
    /// Name of the background worker thread
    pub thread_name: String,
    /// Prefixes accepted in addition to [`DEFAULT_PREFIXES`]
    pub extra_prefixes: Vec<String>,
    /// Also forget every stored hash when a session shuts down
    pub clear_on_shutdown: bool,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            extra_prefixes: Vec::new(),
            clear_on_shutdown: false,
        }
    }
}

impl HasherConfig {
    /// Chunk size clamped to `1..=MAX_CHUNK_SIZE`.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.clamp(1, MAX_CHUNK_SIZE)
    }

    /// Default prefixes followed by the non-empty extra prefixes.
    pub fn prefixes(&self) -> Vec<String> {
        DEFAULT_PREFIXES
            .iter()
            .map(|p| p.to_string())
            .chain(self.extra_prefixes.iter().filter(|p| !p.is_empty()).cloned())
            .collect()
    }
}
