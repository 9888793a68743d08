//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Config, engine and lifecycle produce:
//!     → logging.rs (structured log events via tracing)
//!
//! Consumers:
//!     → stderr (fmt layer)
//! ```
//!
//! # Design Decisions
//! - Subscriber is installed once, after options are resolved
//! - `RUST_LOG` overrides the configured level
//! - Errors before logging is up go to stderr directly

pub mod logging;

pub use logging::init_logging;
