//! Process topology configuration loading and validation.
//!
//! This crate provides:
//! - The typed `TopologyConfig` struct (proc root, pts directory, logging)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation

pub mod resolve;
pub mod settings;
pub mod validate;

pub use resolve::{resolve_config, resolve_config_with, ConfigSource, ResolvedConfig};
pub use settings::{LogFormat, TopologyConfig};
pub use validate::ValidationError;

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG: &str = "PTOPO_CONFIG";

/// Environment variable overriding the proc root.
pub const ENV_PROC_ROOT: &str = "PTOPO_PROC_ROOT";

/// Environment variable overriding the pseudo-terminal directory.
pub const ENV_PTS_DIR: &str = "PTOPO_PTS_DIR";
