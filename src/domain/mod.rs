//! Domain layer for rask-log-sink.
//!
//! Contains the types shared across all modules:
//! - `LoggingEvent`: the already-built event handed to appenders
//! - `Level`: totally ordered severity (Debug/Info/Warn/Error/Fatal)
//! - `SinkError`: top-level error type

pub mod error;
pub mod event;
pub mod level;

pub use error::SinkError;
pub use event::{LocationInfo, LoggingEvent};
pub use level::Level;
