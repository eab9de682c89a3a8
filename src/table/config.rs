//! Table handle configuration
//!
//! Loaded from a JSON file or built in code. Unknown keys are rejected so
//! a typo never silently falls back to a default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which store backs newly created tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Log,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandleConfig {
    /// Store backend (default: memory)
    #[serde(default)]
    pub backend: BackendKind,

    /// Directory holding one log file per table; required for `log`
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// fsync every appended record (default: true)
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
}

fn default_sync_writes() -> bool {
    true
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            data_dir: None,
            sync_writes: default_sync_writes(),
        }
    }
}

impl HandleConfig {
    /// In-memory tables, lost when the handle is dropped.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Durable tables, one append-only log per table under `data_dir`.
    pub fn log(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::Log,
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: HandleConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        match (self.backend, &self.data_dir) {
            (BackendKind::Log, None) => Err(ConfigError::Invalid(
                "data_dir is required for the log backend".to_string(),
            )),
            (BackendKind::Log, Some(dir)) if dir.as_os_str().is_empty() => Err(
                ConfigError::Invalid("data_dir must not be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }
}
