//! Runner configuration, read from TOML.
//!
//! Every field has a default, so an empty file (or no file) is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Number of nodes in the generated tree.
    pub nodes: usize,
    /// Children per internal node.
    pub branching_factor: usize,
    /// How long to wait for the root's ticket.
    pub timeout_ms: u64,
    /// Seed for reproducible draws (None = fresh entropy per node).
    pub seed: Option<u64>,
    /// Used when RUST_LOG is not set.
    pub log_filter: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            nodes: 13,
            branching_factor: 2,
            timeout_ms: 5_000,
            seed: None,
            log_filter: "info".into(),
        }
    }
}

impl NodeConfig {
    /// `<config dir>/treelot/config.toml`, where the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("treelot").join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// An explicit path must exist; otherwise fall back to the default
    /// location, then to built-in defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes == 0 {
            return Err(ConfigError::Invalid("nodes must be at least 1".into()));
        }
        if self.branching_factor == 0 {
            return Err(ConfigError::Invalid("branching_factor must be at least 1".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
