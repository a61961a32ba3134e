use super::{Filter, FilterDecision};
use crate::appender::{ConfigError, options};
use crate::domain::LoggingEvent;

/// Substring match against the rendered message.
#[derive(Debug, Clone)]
pub struct StringMatchFilter {
    string_to_match: Option<String>,
    accept_on_match: bool,
}

impl StringMatchFilter {
    pub fn new(string_to_match: impl Into<String>) -> Self {
        Self {
            string_to_match: Some(string_to_match.into()),
            accept_on_match: true,
        }
    }

    pub fn with_accept_on_match(mut self, accept_on_match: bool) -> Self {
        self.accept_on_match = accept_on_match;
        self
    }
}

impl Default for StringMatchFilter {
    fn default() -> Self {
        Self {
            string_to_match: None,
            accept_on_match: true,
        }
    }
}

impl Filter for StringMatchFilter {
    fn decide(&self, event: &LoggingEvent) -> FilterDecision {
        let Some(needle) = self.string_to_match.as_deref() else {
            return FilterDecision::Neutral;
        };

        if !event.message.contains(needle) {
            return FilterDecision::Neutral;
        }

        if self.accept_on_match {
            FilterDecision::Accept
        } else {
            FilterDecision::Deny
        }
    }

    fn set_option(&mut self, option: &str, value: &str) -> Result<(), ConfigError> {
        if option.eq_ignore_ascii_case("StringToMatch") {
            self.string_to_match = Some(value.to_string());
        } else if option.eq_ignore_ascii_case("AcceptOnMatch") {
            self.accept_on_match = options::to_bool(option, value)?;
        }
        Ok(())
    }
}
