//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Map the configured log level onto an `EnvFilter`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level configurable via config and environment
//! - Installing twice is not an error (tests host several daemons per process)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogLevel;

/// Install the global subscriber writing to stderr.
pub fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    match result {
        Ok(()) => tracing::debug!(level = %level, "Logging initialized"),
        Err(e) => tracing::debug!(error = %e, "Logging already initialized"),
    }
}
