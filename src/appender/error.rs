use std::path::PathBuf;
use thiserror::Error;

/// Configuration problems, reported synchronously by setters and activation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for option {option}: {reason}")]
    InvalidOption {
        option: String,
        value: String,
        reason: String,
    },
    #[error("Unknown level name: '{0}'")]
    UnknownLevel(String),
    #[error("Appender '{0}' requires a layout but none is set")]
    MissingLayout(String),
    #[error("Missing required option {0}")]
    MissingOption(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn invalid_option(option: &str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidOption {
            option: option.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppenderError {
    #[error("Appender '{0}' is closed")]
    Closed(String),
    #[error("Appender '{0}' is not active")]
    Inactive(String),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to bind to address {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Rollover of {path} failed: {source}")]
    Rollover {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to start background worker: {0}")]
    Spawn(String),
}
