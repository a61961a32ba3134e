use crate::appender::{AppenderError, ConfigError};
use thiserror::Error;

/// Top-level error type for the sink binary.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Appender error: {0}")]
    Appender(#[from] AppenderError),

    #[error("Unknown host: {0}")]
    UnknownHost(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Shutdown error: {0}")]
    Shutdown(String),
}
