use super::{ConfigError, LogFormat, LogLevel};
use crate::appender::broadcast::DEFAULT_PORT;
use crate::appender::options;
use crate::domain::Level;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity of the sink's own diagnostics (RUST_LOG takes precedence)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Diagnostics format on stderr
    #[arg(long, env = "LOG_FORMAT", default_value = "compact", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Read lines from stdin and deliver them to the broadcast hub and an optional rolling file
    Serve(ServeConfig),
    /// Connect to a broadcast hub and print every event it sends
    Tail(TailConfig),
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Port the broadcast hub listens on (0 picks a free port)
    #[arg(long, env = "SINK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address the broadcast hub binds to
    #[arg(long, env = "SINK_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: IpAddr,

    /// Ship source location with each event
    #[arg(long, env = "SINK_LOCATION_INFO")]
    pub location_info: bool,

    /// Frames queued per client before it is disconnected as too slow
    #[arg(long, env = "SINK_CLIENT_QUEUE_CAPACITY", default_value_t = 1024)]
    pub client_queue_capacity: usize,

    /// Time client writers get to drain on shutdown
    #[arg(long, env = "SINK_SHUTDOWN_GRACE_MS", default_value_t = 1000)]
    pub shutdown_grace_ms: u64,

    /// Also write events to this rolling file
    #[arg(long, env = "SINK_FILE")]
    pub file: Option<PathBuf>,

    /// Size that triggers a rollover (bytes, or with a KB/MB/GB suffix)
    #[arg(long, env = "SINK_MAX_FILE_SIZE", default_value = "10MB")]
    pub max_file_size: String,

    /// Number of backups kept next to the active file
    #[arg(long, env = "SINK_MAX_BACKUP_INDEX", default_value_t = 1)]
    pub max_backup_index: u32,

    /// Drop events below this level
    #[arg(long, env = "SINK_LEVEL_MIN")]
    pub level_min: Option<Level>,

    /// Drop events above this level
    #[arg(long, env = "SINK_LEVEL_MAX")]
    pub level_max: Option<Level>,

    /// TOML file with the settings above; replaces the command line when given
    #[arg(long, env = "SINK_CONFIG_FILE")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Derived from `max_file_size`
    #[arg(skip)]
    #[serde(skip)]
    pub max_file_size_bytes: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            location_info: false,
            client_queue_capacity: 1024,
            shutdown_grace_ms: 1000,
            file: None,
            max_file_size: "10MB".to_string(),
            max_backup_index: 1,
            level_min: None,
            level_max: None,
            config_file: None,
            max_file_size_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct TailConfig {
    /// Host running the broadcast hub
    #[arg(long, env = "SINK_HOST", default_value = "localhost")]
    pub host: String,

    /// Port of the broadcast hub
    #[arg(long, env = "SINK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl Cli {
    /// Parses and validates without exiting the process on bad input.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut cli = Cli::try_parse_from(args).map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        cli.post_process()?;
        Ok(cli)
    }

    /// Loads the serve config file if one was named, then validates the command.
    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        match &mut self.command {
            Command::Serve(serve) => {
                if let Some(path) = serve.config_file.clone() {
                    *serve = ServeConfig::from_file(&path)?;
                    serve.config_file = Some(path);
                } else {
                    serve.post_process()?;
                    serve.validate()?;
                }
            }
            Command::Tail(tail) => tail.validate()?,
        }
        Ok(())
    }
}

impl ServeConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: ServeConfig = toml::from_str(&content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.max_file_size_bytes = options::to_file_size("max_file_size", &self.max_file_size)?;
        Ok(())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
