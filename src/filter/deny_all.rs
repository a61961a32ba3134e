use super::{Filter, FilterDecision};
use crate::domain::LoggingEvent;

/// Denies everything. Put it last to turn the chain's default into deny.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllFilter;

impl Filter for DenyAllFilter {
    fn decide(&self, _event: &LoggingEvent) -> FilterDecision {
        FilterDecision::Deny
    }
}
