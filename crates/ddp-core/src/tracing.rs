//! Tracing setup for the DDP client crates.
//!
//! Library consumers call [`init_tracing`] once at startup; the `RUST_LOG`
//! environment variable overrides the configured default level.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors that can occur during tracing initialization.
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set the global subscriber (already initialized).
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse an env filter directive.
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact single-line format (default).
    #[default]
    Compact,
    /// Multi-line human-oriented format.
    Pretty,
    /// JSON, for structured log collection.
    Json,
}

/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default level when `RUST_LOG` is not set.
    pub default_level: Level,
    /// Output format for log lines.
    pub format: LogFormat,
    /// Whether to include the module path in each line.
    pub include_target: bool,
    /// Custom env filter directive; overrides `default_level` when set.
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            format: LogFormat::Compact,
            include_target: true,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Set the default level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set a custom env filter directive.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }
}

/// Initialize tracing with the given configuration.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed or the env
/// filter directive cannot be parsed.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = if let Some(ref filter) = config.env_filter {
        EnvFilter::try_new(filter)?
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = config.default_level;
            EnvFilter::new(format!(
                "ddp_core={level},ddp_protocol={level},ddp_client={level}"
            ))
        })
    };

    match config.format {
        LogFormat::Compact => {
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_target(config.include_target));
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Pretty => {
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_target(config.include_target));
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_target(config.include_target));
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.include_target);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn builder_methods() {
        let config = TracingConfig::default()
            .with_level(Level::DEBUG)
            .with_format(LogFormat::Json)
            .with_env_filter("ddp_client=trace");

        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.env_filter, Some("ddp_client=trace".to_string()));
    }
}
