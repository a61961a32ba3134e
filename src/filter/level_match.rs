use super::{Filter, FilterDecision};
use crate::appender::{ConfigError, options};
use crate::domain::{Level, LoggingEvent};

/// Matches a single level exactly.
#[derive(Debug, Clone)]
pub struct LevelMatchFilter {
    level_to_match: Option<Level>,
    accept_on_match: bool,
}

impl LevelMatchFilter {
    pub fn new(level_to_match: Level) -> Self {
        Self {
            level_to_match: Some(level_to_match),
            accept_on_match: true,
        }
    }

    pub fn with_accept_on_match(mut self, accept_on_match: bool) -> Self {
        self.accept_on_match = accept_on_match;
        self
    }
}

impl Default for LevelMatchFilter {
    fn default() -> Self {
        Self {
            level_to_match: None,
            accept_on_match: true,
        }
    }
}

impl Filter for LevelMatchFilter {
    fn decide(&self, event: &LoggingEvent) -> FilterDecision {
        match self.level_to_match {
            Some(level) if level == event.level => {
                if self.accept_on_match {
                    FilterDecision::Accept
                } else {
                    FilterDecision::Deny
                }
            }
            _ => FilterDecision::Neutral,
        }
    }

    fn set_option(&mut self, option: &str, value: &str) -> Result<(), ConfigError> {
        if option.eq_ignore_ascii_case("LevelToMatch") {
            self.level_to_match = Some(options::to_level(option, value)?);
        } else if option.eq_ignore_ascii_case("AcceptOnMatch") {
            self.accept_on_match = options::to_bool(option, value)?;
        }
        Ok(())
    }
}
