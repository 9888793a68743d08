//! Startup orchestration.
//!
//! # Responsibilities
//! - Construct the engine from the resolved options
//! - Load persisted state, then persist it once to prove the data path is writable
//! - Release the engine again if any of those steps fails
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, nothing is retried
//! - Steps run in order, never concurrently
//! - The run loop starts last (no work accepted before state is loaded)

use thiserror::Error;

use crate::config::Options;
use crate::engine::{EngineError, EngineFactory};
use crate::lifecycle::controller::{Controller, Phase, PhaseTracker};
use crate::lifecycle::shutdown::Trigger;

/// Errors that abort the lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to instantiate engine - {0}")]
    Construct(#[source] EngineError),

    #[error("failed to load metadata - {0}")]
    LoadState(#[source] EngineError),

    #[error("failed to persist metadata - {0}")]
    PersistState(#[source] EngineError),

    #[error("lifecycle step requires phase {expected}, controller is {actual}")]
    InvalidPhase { expected: Phase, actual: Phase },
}

/// Build a controller whose engine is constructed and has its state loaded.
///
/// `phase` must be at `ConfigResolved`; otherwise nothing is constructed.
pub fn bootstrap<F: EngineFactory>(
    options: Options,
    factory: &F,
    phase: PhaseTracker,
) -> Result<Controller<F::Engine>, LifecycleError> {
    phase.expect(Phase::ConfigResolved)?;
    let engine = factory
        .construct(options)
        .map_err(LifecycleError::Construct)?;
    phase.advance(Phase::ConfigResolved, Phase::EngineConstructed)?;
    let controller = Controller::new(engine, phase);

    if let Err(e) = controller.prepare() {
        // The engine must not outlive a failed startup.
        controller.shutdown(Trigger::StartupFailure);
        return Err(e);
    }
    Ok(controller)
}
