//! `serve`: stdin lines in, appenders out.

use super::config::ServeConfig;
use crate::appender::{
    Appender, AppenderError, BroadcastAppender, BroadcastHub, RollingFileAppender, RollingFileWriter, SimpleLayout,
};
use crate::domain::{Level, LoggingEvent, SinkError};
use crate::filter::LevelRangeFilter;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const STDIN_LOGGER: &str = "stdin";

/// Builds and activates every appender the config asks for. Nothing stays
/// active if one of them fails.
pub fn build_appenders(config: &ServeConfig) -> Result<Vec<Arc<dyn Appender>>, AppenderError> {
    let mut appenders: Vec<Arc<dyn Appender>> = Vec::new();

    let hub = BroadcastAppender::new(
        "broadcast",
        BroadcastHub::new(config.port)
            .with_bind_address(config.bind_address)
            .with_location_info(config.location_info)
            .with_client_queue_capacity(config.client_queue_capacity)
            .with_shutdown_grace(config.shutdown_grace()),
    );
    appenders.push(Arc::new(hub));

    if let Some(path) = &config.file {
        let file = RollingFileAppender::new(
            "file",
            RollingFileWriter::new(path)
                .with_max_file_size(config.max_file_size_bytes)
                .with_max_backup_index(config.max_backup_index),
        )
        .with_layout(Arc::new(SimpleLayout));
        appenders.push(Arc::new(file));
    }

    for appender in &appenders {
        if config.level_min.is_some() || config.level_max.is_some() {
            let mut range = LevelRangeFilter::new();
            range.set_level_min(config.level_min);
            range.set_level_max(config.level_max);
            appender.add_filter(Box::new(range));
        }

        if let Err(e) = appender.activate_options() {
            error!(appender = appender.name(), error = %e, "activation failed");
            for built in &appenders {
                built.close();
            }
            return Err(e);
        }
    }

    Ok(appenders)
}

/// Hands `event` to every appender. A failing appender is reported and
/// does not stop delivery to the others.
pub fn dispatch(appenders: &[Arc<dyn Appender>], event: &LoggingEvent) -> usize {
    let mut failures = 0;
    for appender in appenders {
        if let Err(e) = appender.do_append(event) {
            failures += 1;
            warn!(appender = appender.name(), error = %e, "append failed");
        }
    }
    failures
}

/// Turns every line of `reader` into an INFO event until EOF or `shutdown`.
/// Appenders do blocking IO, so each event is dispatched on the blocking
/// pool; lines are still delivered one at a time, in order.
/// Returns the number of lines dispatched.
pub async fn pump<R>(reader: R, appenders: &[Arc<dyn Appender>], shutdown: &CancellationToken) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let shared: Arc<[Arc<dyn Appender>]> = Arc::from(appenders);
    let mut lines = reader.lines();
    let mut count = 0;

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                debug!("shutdown requested, no longer reading input");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let event = LoggingEvent::new(STDIN_LOGGER, Level::Info, line);
                    let targets = Arc::clone(&shared);
                    if let Err(e) = tokio::task::spawn_blocking(move || dispatch(&targets, &event)).await {
                        error!(error = %e, "dispatch task failed");
                    }
                    count += 1;
                }
                Ok(None) => {
                    info!("input closed");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "failed to read input");
                    break;
                }
            }
        }
    }

    count
}

/// Closes every appender off the async runtime; closing the hub joins its
/// thread.
pub async fn close_all(appenders: Vec<Arc<dyn Appender>>) -> Result<(), SinkError> {
    let closing = appenders.into_iter().map(|appender| {
        tokio::task::spawn_blocking(move || {
            appender.close();
        })
    });

    for result in futures::future::join_all(closing).await {
        result.map_err(|e| SinkError::Shutdown(format!("appender close task failed: {e}")))?;
    }
    Ok(())
}

pub async fn run(config: ServeConfig, shutdown: CancellationToken) -> Result<(), SinkError> {
    let appenders = build_appenders(&config)?;
    info!(
        port = config.port,
        file = ?config.file,
        appenders = appenders.len(),
        "rask-log-sink serving stdin"
    );

    let count = pump(BufReader::new(tokio::io::stdin()), &appenders, &shutdown).await;

    close_all(appenders).await?;
    info!(events = count, "rask-log-sink stopped");
    Ok(())
}
