//! Station configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::StationError;

/// Configuration for a pollbox voting station.
///
/// Can be loaded from a TOML file via [`StationConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StationConfig {
    /// Data directory for the LMDB store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in megabytes.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./pollbox_data")
}

fn default_map_size_mb() -> usize {
    64
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl StationConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, StationError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StationError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, StationError> {
        toml::from_str(s).map_err(|e| StationError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("StationConfig is always serializable to TOML")
    }

    /// The LMDB map size in bytes.
    pub fn map_size(&self) -> usize {
        self.map_size_mb * 1024 * 1024
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
