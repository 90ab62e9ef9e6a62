//! Semantic validation of a loaded configuration.

use crate::settings::TopologyConfig;
use thiserror::Error;

/// Errors from loading or validating configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

impl TopologyConfig {
    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.proc_root.as_os_str().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "proc_root".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.pts_dir.as_os_str().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "pts_dir".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "log_level".to_string(),
                reason: format!("expected one of {}", LOG_LEVELS.join(", ")),
            });
        }
        Ok(())
    }
}
