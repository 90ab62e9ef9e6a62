//! Config resolution: CLI → env → XDG → defaults.

use crate::settings::TopologyConfig;
use crate::validate::ValidationError;
use crate::{ENV_CONFIG, ENV_PROC_ROOT, ENV_PTS_DIR};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the effective config file came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config <path>` on the command line.
    Cli(PathBuf),
    /// `PTOPO_CONFIG` environment variable.
    Env(PathBuf),
    /// `<config_dir>/ptopo/config.json`.
    Xdg(PathBuf),
    /// No file; built-in defaults.
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Cli(p) => write!(f, "cli:{}", p.display()),
            ConfigSource::Env(p) => write!(f, "env:{}", p.display()),
            ConfigSource::Xdg(p) => write!(f, "xdg:{}", p.display()),
            ConfigSource::Defaults => write!(f, "defaults"),
        }
    }
}

/// A validated config together with its origin.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: TopologyConfig,
    pub source: ConfigSource,
}

/// Resolve the effective config from the real environment.
pub fn resolve_config(cli_path: Option<&Path>) -> Result<ResolvedConfig, ValidationError> {
    resolve_config_with(cli_path, dirs::config_dir(), |key| std::env::var_os(key))
}

/// Resolve the effective config with an explicit XDG base and env lookup.
///
/// An explicitly named file (CLI or env) must exist and parse. The XDG
/// file is optional: if it is absent, defaults are used.
pub fn resolve_config_with<F>(
    cli_path: Option<&Path>,
    xdg_config_dir: Option<PathBuf>,
    env: F,
) -> Result<ResolvedConfig, ValidationError>
where
    F: Fn(&str) -> Option<OsString>,
{
    let (mut config, source) = if let Some(path) = cli_path {
        (TopologyConfig::from_file(path)?, ConfigSource::Cli(path.to_path_buf()))
    } else if let Some(path) = env(ENV_CONFIG).filter(|v| !v.is_empty()).map(PathBuf::from) {
        (TopologyConfig::from_file(&path)?, ConfigSource::Env(path))
    } else {
        match xdg_config_dir.map(|dir| dir.join("ptopo").join("config.json")) {
            Some(path) if path.is_file() => {
                (TopologyConfig::from_file(&path)?, ConfigSource::Xdg(path))
            }
            _ => (TopologyConfig::default(), ConfigSource::Defaults),
        }
    };

    if let Some(root) = env(ENV_PROC_ROOT).filter(|v| !v.is_empty()) {
        debug!(proc_root = ?root, "proc root overridden from environment");
        config.proc_root = PathBuf::from(root);
    }
    if let Some(dir) = env(ENV_PTS_DIR).filter(|v| !v.is_empty()) {
        debug!(pts_dir = ?dir, "pts dir overridden from environment");
        config.pts_dir = PathBuf::from(dir);
    }

    config.validate()?;
    debug!(source = %source, "configuration resolved");
    Ok(ResolvedConfig { config, source })
}
