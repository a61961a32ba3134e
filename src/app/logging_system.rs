use super::config::{ConfigError, LogFormat, LogLevel};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Builds the filter for the sink's own diagnostics. `RUST_LOG`, when set
/// and valid, replaces the configured level.
pub fn build_env_filter(level: LogLevel) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level.as_str())
        .map_err(|e| ConfigError::InvalidConfig(format!("Invalid log filter '{}': {e}", level.as_str())))
}

/// Installs the global subscriber. Diagnostics go to stderr so they never
/// mix with event output on stdout.
pub fn setup_logging(level: LogLevel, format: LogFormat) -> Result<(), ConfigError> {
    let env_filter = build_env_filter(level)?;

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init(),
    };

    result.map_err(|e| ConfigError::InvalidConfig(format!("Failed to install tracing subscriber: {e}")))
}
