use super::level::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source position of the call that produced an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub file: String,
    pub line: u32,
    pub module: String,
}

/// A fully built logging event.
///
/// Appenders only read events; construction and message rendering happen
/// upstream. Field names double as the wire names of the broadcast hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingEvent {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    #[serde(rename = "logger")]
    pub logger_name: String,
    pub message: String,
    #[serde(rename = "thread")]
    pub thread_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ndc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationInfo>,
}

impl LoggingEvent {
    /// Stamps the event with the current time and the calling thread's name.
    pub fn new(logger_name: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        let current = std::thread::current();
        let thread_name = match current.name() {
            Some(name) => name.to_string(),
            None => format!("{:?}", current.id()),
        };

        Self {
            timestamp: Utc::now(),
            level,
            logger_name: logger_name.into(),
            message: message.into(),
            thread_name,
            ndc: None,
            location: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32, module: impl Into<String>) -> Self {
        self.location = Some(LocationInfo {
            file: file.into(),
            line,
            module: module.into(),
        });
        self
    }

    pub fn with_ndc(mut self, ndc: impl Into<String>) -> Self {
        self.ndc = Some(ndc.into());
        self
    }
}
