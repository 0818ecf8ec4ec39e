//! Logging setup.
//!
//! The engine logs through the `tracing` macros; this module only installs a
//! subscriber. Embedding applications that already own a subscriber can skip
//! it entirely.

mod types;

pub use types::LogLevel;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingSettings;

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr
///
/// Should be called once at application startup. Later calls are ignored.
pub fn init_tracing(default_level: LogLevel, show_target: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(show_target)
                .with_thread_ids(false),
        )
        .with(filter)
        .try_init();
}

/// Initialize tracing from the `[logging]` config section.
pub fn init_from_settings(settings: &LoggingSettings) {
    init_tracing(settings.level, settings.show_target);
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
