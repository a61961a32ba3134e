use crate::domain::LoggingEvent;
use std::fmt::Debug;

/// Renders an event into the text an appender writes.
pub trait Layout: Debug + Send + Sync {
    fn format(&self, event: &LoggingEvent) -> String;
}

/// `LEVEL - message` followed by a newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleLayout;

impl Layout for SimpleLayout {
    fn format(&self, event: &LoggingEvent) -> String {
        format!("{} - {}\n", event.level, event.message)
    }
}
