//! Typed configuration file contents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Log line encoding on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Where topology records are read from, and how the tool logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopologyConfig {
    /// Mount point of the process information filesystem.
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,

    /// Directory holding pseudo-terminal slave devices.
    #[serde(default = "default_pts_dir")]
    pub pts_dir: PathBuf,

    /// Default `tracing` filter directive when `PTOPO_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

fn default_pts_dir() -> PathBuf {
    PathBuf::from("/dev/pts")
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            proc_root: default_proc_root(),
            pts_dir: default_pts_dir(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl TopologyConfig {
    /// Parse a config from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, crate::validate::ValidationError> {
        serde_json::from_str(json).map_err(|e| {
            crate::validate::ValidationError::ParseError(format!("Invalid JSON: {}", e))
        })
    }

    /// Load a config from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::validate::ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::validate::ValidationError::IoError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse_json(&content)
    }
}
