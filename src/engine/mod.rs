//! Engine boundary.
//!
//! # Data Flow
//! ```text
//! Options → EngineFactory::construct → Engine
//!     load_state → persist_state → run (blocks) ... request_stop → run returns
//! ```
//!
//! # Design Decisions
//! - The lifecycle controller only sees this trait, never engine internals
//! - `request_stop` must be idempotent and callable while `run` is in progress
//! - Shutdown-in-progress is observable through a cancellation token

mod error;
pub mod metadata;
pub mod queue;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::Options;

pub use error::EngineError;
pub use queue::{QueueEngine, QueueEngineFactory};

/// Operations the lifecycle controller drives on the message engine.
#[async_trait]
pub trait Engine: Send + Sync + 'static {
    /// Restore durable state accumulated by prior runs.
    fn load_state(&self) -> Result<(), EngineError>;

    /// Write current state to durable storage.
    fn persist_state(&self) -> Result<(), EngineError>;

    /// Serve until stopped.
    ///
    /// Returns `Ok` once a stop request has been honoured and `Err` on a
    /// fatal internal failure.
    async fn run(&self) -> Result<(), EngineError>;

    /// Ask `run` to unwind and release resources.
    fn request_stop(&self);

    /// Token cancelled as soon as a stop has been requested.
    fn cancellation(&self) -> CancellationToken;
}

/// Builds an engine from the effective configuration.
pub trait EngineFactory {
    type Engine: Engine;

    fn construct(&self, options: Options) -> Result<Self::Engine, EngineError>;
}
