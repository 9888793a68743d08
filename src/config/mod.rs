//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!
//! config file (TOML)
//!     → loader.rs (read & deserialize into FileConfig)
//!     → validation.rs (semantic checks, typed OptionsLayer)
//!
//! command line
//!     → flags.rs (clap, typed OptionsLayer)
//!
//! resolve.rs: defaults < file < flags
//!     → Options (immutable, handed to the engine)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Layers only carry values their source set explicitly

pub mod flags;
pub mod layer;
pub mod loader;
pub mod resolve;
pub mod schema;
pub mod validation;

pub use flags::{version_string, Cli, DAEMON_NAME};
pub use layer::OptionsLayer;
pub use loader::ConfigError;
pub use resolve::{load_options, resolve};
pub use schema::{LogLevel, Options, TlsMinVersion, TlsRequired};
pub use validation::ValidationError;
