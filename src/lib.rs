#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Sizes stay far below the platform limits
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. AppenderError in appender module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod appender;
pub mod domain;
pub mod filter;
pub mod net;

// Re-export main types for easy access
pub use appender::{
    Appender, AppenderError, AppenderSkeleton, AppenderState, BroadcastAppender, BroadcastHub, ConfigError, Layout,
    RollingFileAppender, RollingFileWriter, SimpleLayout,
};
pub use domain::{Level, LocationInfo, LoggingEvent, SinkError};
pub use filter::{Filter, FilterChain, FilterDecision, LevelRangeFilter};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
