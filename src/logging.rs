//! Structured logging setup.
//!
//! Stderr only — stdout belongs to the run summary. Pretty output for
//! interactive use, JSON when `DCC_TABULAR_LOG_FORMAT=json` (CI log
//! collection); the filter comes from `DCC_TABULAR_LOG` and defaults to
//! `info`.

use anyhow::{Result, anyhow};
use std::env;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Configuration for logging setup.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub filter: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let format = match env::var("DCC_TABULAR_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        let filter = env::var("DCC_TABULAR_LOG").unwrap_or_else(|_| "info".to_string());
        Self { format, filter }
    }
}

/// Initialize the global subscriber. Errors if called twice or if the
/// filter directive is malformed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| anyhow!("invalid log filter {:?}: {e}", config.filter))?;
    match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!("failed to initialize logging: {e}")),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!("failed to initialize logging: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_pretty_info() {
        // Only meaningful when the env vars are unset, which is the
        // normal test environment.
        if env::var("DCC_TABULAR_LOG").is_err() && env::var("DCC_TABULAR_LOG_FORMAT").is_err() {
            let config = LoggingConfig::from_env();
            assert_eq!(config.format, LogFormat::Pretty);
            assert_eq!(config.filter, "info");
        }
    }

    #[test]
    fn bad_filter_is_rejected() {
        let config = LoggingConfig {
            format: LogFormat::Pretty,
            filter: "not==valid".to_string(),
        };
        assert!(init_logging(&config).is_err());
    }
}
