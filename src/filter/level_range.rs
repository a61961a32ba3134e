use super::{Filter, FilterDecision};
use crate::appender::{ConfigError, options};
use crate::domain::{Level, LoggingEvent};

/// Rejects events whose level falls outside `[level_min, level_max]`.
///
/// Both bounds are inclusive; an unset bound is unbounded on that side.
/// Events inside the range are accepted outright when `accept_on_match` is
/// set, otherwise left to the rest of the chain.
#[derive(Debug, Clone, Default)]
pub struct LevelRangeFilter {
    level_min: Option<Level>,
    level_max: Option<Level>,
    accept_on_match: bool,
}

impl LevelRangeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level_min(mut self, level: Level) -> Self {
        self.level_min = Some(level);
        self
    }

    pub fn with_level_max(mut self, level: Level) -> Self {
        self.level_max = Some(level);
        self
    }

    pub fn with_accept_on_match(mut self, accept_on_match: bool) -> Self {
        self.accept_on_match = accept_on_match;
        self
    }

    pub fn set_level_min(&mut self, level: Option<Level>) {
        self.level_min = level;
    }

    pub fn set_level_max(&mut self, level: Option<Level>) {
        self.level_max = level;
    }

    pub fn set_accept_on_match(&mut self, accept_on_match: bool) {
        self.accept_on_match = accept_on_match;
    }

    pub fn level_min(&self) -> Option<Level> {
        self.level_min
    }

    pub fn level_max(&self) -> Option<Level> {
        self.level_max
    }

    pub fn accept_on_match(&self) -> bool {
        self.accept_on_match
    }
}

impl Filter for LevelRangeFilter {
    fn decide(&self, event: &LoggingEvent) -> FilterDecision {
        if self.level_min.is_some_and(|min| event.level < min) {
            return FilterDecision::Deny;
        }
        if self.level_max.is_some_and(|max| event.level > max) {
            return FilterDecision::Deny;
        }

        if self.accept_on_match {
            FilterDecision::Accept
        } else {
            FilterDecision::Neutral
        }
    }

    fn set_option(&mut self, option: &str, value: &str) -> Result<(), ConfigError> {
        if option.eq_ignore_ascii_case("LevelMin") {
            self.level_min = Some(options::to_level(option, value)?);
        } else if option.eq_ignore_ascii_case("LevelMax") {
            self.level_max = Some(options::to_level(option, value)?);
        } else if option.eq_ignore_ascii_case("AcceptOnMatch") {
            self.accept_on_match = options::to_bool(option, value)?;
        }
        Ok(())
    }
}
