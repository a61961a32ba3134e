//! Wire form of the broadcast hub: newline-delimited JSON, one event per line.
//!
//! There is no handshake and no acknowledgement. A client connects and
//! reads lines until the hub closes the stream.

use crate::domain::{Level, LocationInfo, LoggingEvent};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, BufRead};

/// Borrowed view of an event with the same field names as `LoggingEvent`'s
/// serde form, so frames decode straight back into `LoggingEvent`.
#[derive(Serialize)]
struct WireEvent<'a> {
    timestamp: &'a DateTime<Utc>,
    level: Level,
    logger: &'a str,
    message: &'a str,
    thread: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ndc: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a LocationInfo>,
}

/// Serialises one frame, newline included. Location info is only shipped
/// when `location_info` is set.
pub fn encode_event(event: &LoggingEvent, location_info: bool) -> Result<Bytes, serde_json::Error> {
    let wire = WireEvent {
        timestamp: &event.timestamp,
        level: event.level,
        logger: &event.logger_name,
        message: &event.message,
        thread: &event.thread_name,
        ndc: event.ndc.as_deref(),
        location: if location_info {
            event.location.as_ref()
        } else {
            None
        },
    };

    let mut buffer = Vec::with_capacity(128 + event.message.len());
    serde_json::to_writer(&mut buffer, &wire)?;
    buffer.push(b'\n');
    Ok(Bytes::from(buffer))
}

/// Decodes one frame; surrounding whitespace, including the newline, is ignored.
pub fn decode_frame(line: &str) -> Result<LoggingEvent, serde_json::Error> {
    serde_json::from_str(line.trim())
}

/// Blocking reader for hub clients.
///
/// Yields one event per frame, skips blank lines and ends at EOF.
pub struct EventReader<R> {
    inner: R,
    line: String,
}

impl<R: BufRead> EventReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = io::Result<LoggingEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.inner.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) if self.line.trim().is_empty() => continue,
                Ok(_) => {
                    return Some(
                        decode_frame(&self.line)
                            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
                    );
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
