//! Queue Daemon Library
//!
//! Process lifecycle for a message-queue daemon: layered option
//! resolution, a pluggable engine boundary, and a controller that shuts the
//! engine down exactly once.

pub mod config;
pub mod engine;
pub mod lifecycle;
pub mod observability;

pub use config::{Cli, Options};
pub use engine::{Engine, EngineError, EngineFactory, QueueEngine, QueueEngineFactory};
pub use lifecycle::{run_daemon, Controller, Exit};
