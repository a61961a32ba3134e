//! `tail`: a conforming hub client that prints what it receives.

use super::config::TailConfig;
use crate::appender::broadcast::wire;
use crate::appender::{Layout, SimpleLayout};
use crate::domain::SinkError;
use crate::net;
use std::net::SocketAddr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Copies events from `reader` to `out`, one laid-out line each, until the
/// hub closes the stream or `shutdown` fires. Undecodable lines are skipped.
pub async fn follow<R, W>(reader: R, out: &mut W, shutdown: &CancellationToken) -> Result<usize, SinkError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let layout = SimpleLayout;
    let mut lines = reader.lines();
    let mut printed = 0;

    loop {
        let line = tokio::select! {
            () = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            info!("hub closed the connection");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match wire::decode_frame(&line) {
            Ok(event) => {
                out.write_all(layout.format(&event).as_bytes()).await?;
                out.flush().await?;
                printed += 1;
            }
            Err(e) => warn!(error = %e, "skipping undecodable frame"),
        }
    }

    Ok(printed)
}

pub async fn run(config: TailConfig, shutdown: CancellationToken) -> Result<(), SinkError> {
    let ip = net::by_name(&config.host).ok_or_else(|| SinkError::UnknownHost(config.host.clone()))?;
    let addr = SocketAddr::new(ip, config.port);

    let stream = TcpStream::connect(addr).await?;
    info!(host = %config.host, addr = %addr, "connected to broadcast hub");

    let mut stdout = tokio::io::stdout();
    let printed = follow(BufReader::new(stream), &mut stdout, &shutdown).await?;
    info!(events = printed, "tail finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Level, LoggingEvent};

    #[tokio::test]
    async fn test_follow_prints_decoded_events() {
        let mut input = Vec::new();
        input.extend_from_slice(&wire::encode_event(&LoggingEvent::new("a", Level::Warn, "disk low"), false).unwrap());
        input.extend_from_slice(b"garbage\n\n");
        input.extend_from_slice(&wire::encode_event(&LoggingEvent::new("a", Level::Info, "ok"), false).unwrap());

        let mut out = Vec::new();
        let printed = follow(&input[..], &mut out, &CancellationToken::new()).await.unwrap();

        assert_eq!(printed, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "WARN - disk low\nINFO - ok\n");
    }

    #[tokio::test]
    async fn test_unknown_host() {
        let config = TailConfig {
            host: "no-such-host.invalid".to_string(),
            port: 4560,
        };
        assert!(matches!(
            run(config, CancellationToken::new()).await,
            Err(SinkError::UnknownHost(_))
        ));
    }
}
