//! The appender contract and the engines that implement it.
//!
//! [`AppenderSkeleton`] owns everything every appender shares: the
//! lifecycle state, the threshold, the filter chain and the layout. It wraps
//! all of that together with an engine in a single mutex, so `do_append` is
//! the one serialisation point per appender and an [`AppendEngine`] body
//! never needs locking of its own.

pub mod broadcast;
mod error;
mod layout;
pub mod options;
pub mod rolling_file;

pub use broadcast::BroadcastHub;
pub use error::{AppenderError, ConfigError};
pub use layout::{Layout, SimpleLayout};
pub use rolling_file::RollingFileWriter;

use crate::domain::{Level, LoggingEvent};
use crate::filter::{Filter, FilterChain};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type RollingFileAppender = AppenderSkeleton<RollingFileWriter>;
pub type BroadcastAppender = AppenderSkeleton<BroadcastHub>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppenderState {
    /// Options may be set; nothing is written.
    Inactive,
    /// The underlying resource is open.
    Active,
    /// Terminal.
    Closed,
}

/// Shared contract of every output engine, usable as `Arc<dyn Appender>`.
pub trait Appender: Send + Sync {
    fn name(&self) -> &str;

    /// Validates the options and acquires the resource. A second call
    /// releases the current resource first. On failure the appender is
    /// left inactive.
    fn activate_options(&self) -> Result<(), AppenderError>;

    /// Runs threshold, filters and the engine body under the appender lock.
    /// Filtered events and events nobody is listening for return `Ok`.
    fn do_append(&self, event: &LoggingEvent) -> Result<(), AppenderError>;

    /// Releases the resource. Idempotent, and fine on a never-activated appender.
    fn close(&self);

    fn requires_layout(&self) -> bool;

    fn set_option(&self, option: &str, value: &str) -> Result<(), AppenderError>;

    fn add_filter(&self, filter: Box<dyn Filter>);

    fn clear_filters(&self);

    fn set_layout(&self, layout: Arc<dyn Layout>);

    fn state(&self) -> AppenderState;

    fn is_closed(&self) -> bool {
        self.state() == AppenderState::Closed
    }
}

/// Engine-specific body of an appender.
///
/// Every method is called with the owning appender's lock held.
pub trait AppendEngine: Send + 'static {
    fn requires_layout(&self) -> bool;

    /// Applies an engine option. Unknown names must be ignored and a
    /// rejected value must leave the engine unchanged.
    fn set_option(&mut self, option: &str, value: &str) -> Result<(), ConfigError>;

    fn activate(&mut self, name: &str) -> Result<(), AppenderError>;

    fn append(&mut self, event: &LoggingEvent, layout: Option<&dyn Layout>) -> Result<(), AppenderError>;

    /// Must tolerate being called when nothing was acquired.
    fn release(&mut self, name: &str);
}

struct Guarded<E> {
    engine: E,
    state: AppenderState,
    threshold: Option<Level>,
    filters: FilterChain,
    layout: Option<Arc<dyn Layout>>,
}

pub struct AppenderSkeleton<E: AppendEngine> {
    name: String,
    inner: Mutex<Guarded<E>>,
}

impl<E: AppendEngine> AppenderSkeleton<E> {
    pub fn new(name: impl Into<String>, engine: E) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(Guarded {
                engine,
                state: AppenderState::Inactive,
                threshold: None,
                filters: FilterChain::new(),
                layout: None,
            }),
        }
    }

    pub fn with_layout(self, layout: Arc<dyn Layout>) -> Self {
        self.inner.lock().layout = Some(layout);
        self
    }

    pub fn with_threshold(self, threshold: Level) -> Self {
        self.inner.lock().threshold = Some(threshold);
        self
    }

    pub fn threshold(&self) -> Option<Level> {
        self.inner.lock().threshold
    }

    pub fn filter_count(&self) -> usize {
        self.inner.lock().filters.len()
    }

    /// Runs `f` against the engine under the appender lock.
    pub(crate) fn with_engine<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        f(&mut self.inner.lock().engine)
    }
}

impl<E: AppendEngine> Appender for AppenderSkeleton<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn activate_options(&self) -> Result<(), AppenderError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        match inner.state {
            AppenderState::Closed => return Err(AppenderError::Closed(self.name.clone())),
            AppenderState::Active => {
                debug!(appender = %self.name, "re-activating, releasing current resource");
                inner.engine.release(&self.name);
                inner.state = AppenderState::Inactive;
            }
            AppenderState::Inactive => {}
        }

        if inner.engine.requires_layout() && inner.layout.is_none() {
            return Err(ConfigError::MissingLayout(self.name.clone()).into());
        }

        inner.engine.activate(&self.name)?;
        inner.state = AppenderState::Active;
        info!(appender = %self.name, "appender activated");
        Ok(())
    }

    fn do_append(&self, event: &LoggingEvent) -> Result<(), AppenderError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        match inner.state {
            AppenderState::Closed => {
                warn!(appender = %self.name, "attempted to append to closed appender");
                return Err(AppenderError::Closed(self.name.clone()));
            }
            AppenderState::Inactive => {
                return Err(AppenderError::Inactive(self.name.clone()));
            }
            AppenderState::Active => {}
        }

        if inner.threshold.is_some_and(|threshold| event.level < threshold) {
            return Ok(());
        }

        if !inner.filters.evaluate(event) {
            return Ok(());
        }

        inner.engine.append(event, inner.layout.as_deref())
    }

    fn close(&self) {
        let mut guard = self.inner.lock();
        if guard.state == AppenderState::Closed {
            return;
        }

        guard.engine.release(&self.name);
        guard.state = AppenderState::Closed;
        info!(appender = %self.name, "appender closed");
    }

    fn requires_layout(&self) -> bool {
        self.inner.lock().engine.requires_layout()
    }

    fn set_option(&self, option: &str, value: &str) -> Result<(), AppenderError> {
        let mut guard = self.inner.lock();
        if guard.state == AppenderState::Closed {
            return Err(AppenderError::Closed(self.name.clone()));
        }

        if option.eq_ignore_ascii_case("Threshold") {
            guard.threshold = Some(options::to_level(option, value)?);
            return Ok(());
        }

        guard.engine.set_option(option, value)?;
        Ok(())
    }

    fn add_filter(&self, filter: Box<dyn Filter>) {
        self.inner.lock().filters.push(filter);
    }

    fn clear_filters(&self) {
        self.inner.lock().filters.clear();
    }

    fn set_layout(&self, layout: Arc<dyn Layout>) {
        self.inner.lock().layout = Some(layout);
    }

    fn state(&self) -> AppenderState {
        self.inner.lock().state
    }
}

impl<E: AppendEngine> Drop for AppenderSkeleton<E> {
    fn drop(&mut self) {
        self.close();
    }
}
