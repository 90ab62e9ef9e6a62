//! Structured logging setup.
//!
//! Logs go to stderr so stdout carries only query results. The filter is
//! taken from `PTOPO_LOG` when set (any `EnvFilter` directive), otherwise
//! from the configured level.

use ptopo_config::LogFormat;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const ENV_LOG: &str = "PTOPO_LOG";

/// Build the filter from `PTOPO_LOG`, falling back to `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init(default_level: &str, format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected() {
        let _ = init("warn", LogFormat::Text);
        assert!(!init("warn", LogFormat::Json));
    }
}
