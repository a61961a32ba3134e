//! Accept/deny policy evaluated before an appender writes an event.
//!
//! A [`FilterChain`] asks each of its filters in insertion order. The first
//! non-neutral answer wins; if every filter is neutral (or there are none)
//! the event is accepted.

mod deny_all;
mod level_match;
mod level_range;
mod string_match;

pub use deny_all::DenyAllFilter;
pub use level_match::LevelMatchFilter;
pub use level_range::LevelRangeFilter;
pub use string_match::StringMatchFilter;

use crate::appender::ConfigError;
use crate::domain::LoggingEvent;
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Deliver the event without asking the remaining filters.
    Accept,
    /// Drop the event without asking the remaining filters.
    Deny,
    /// No opinion; defer to the next filter or the default.
    Neutral,
}

pub trait Filter: Debug + Send + Sync {
    fn decide(&self, event: &LoggingEvent) -> FilterDecision;

    /// Applies a named option. Names are case-insensitive and unknown names
    /// are ignored. A rejected value leaves the filter unchanged.
    fn set_option(&mut self, _option: &str, _value: &str) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Ordered, appender-owned sequence of filters.
#[derive(Debug, Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the end of the chain; filters are never reordered.
    pub fn push(&mut self, filter: Box<dyn Filter>) {
        self.filters.push(filter);
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn evaluate(&self, event: &LoggingEvent) -> bool {
        for filter in &self.filters {
            match filter.decide(event) {
                FilterDecision::Deny => return false,
                FilterDecision::Accept => return true,
                FilterDecision::Neutral => {}
            }
        }
        true
    }
}
