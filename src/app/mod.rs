pub mod config;
pub mod logging_system;
pub mod serve;
pub mod shutdown;
pub mod tail;

pub use config::{Cli, Command, ConfigError, LogFormat, LogLevel, ServeConfig, TailConfig};
pub use logging_system::setup_logging;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// Main entry point for the application
pub async fn main() -> anyhow::Result<()> {
    // Help, version and usage errors exit here.
    let mut cli = Cli::parse();

    setup_logging(cli.log_level, cli.log_format).context("failed to initialise logging")?;
    cli.post_process().context("invalid configuration")?;

    info!("Starting rask-log-sink v{}", get_version());

    let shutdown = CancellationToken::new();
    let watcher = shutdown::spawn_signal_watcher(shutdown.clone());

    let result = match cli.command {
        Command::Serve(config) => serve::run(config, shutdown.clone()).await.context("serve failed"),
        Command::Tail(config) => tail::run(config, shutdown.clone()).await.context("tail failed"),
    };

    shutdown.cancel();
    watcher.abort();
    result
}
