//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Hosting (daemon.rs):
//!     Parse flags → --version short-circuit → Resolve options → Init logging
//!
//! Startup (startup.rs):
//!     Construct engine → Load state → Persist state
//!
//! Run (controller.rs):
//!     Spawn run loop + signal task → Wait for outcome
//!
//! Shutdown (shutdown.rs):
//!     Signal / run failure / stop → Guard → request_stop exactly once
//!
//! Signals (signals.rs):
//!     SIGTERM → controller signal task
//!     SIGINT  → hosting layer → Controller::stop
//! ```
//!
//! # Design Decisions
//! - Ordered startup: options first, then engine, then state, then run loop
//! - Shutdown is idempotent: every trigger goes through one guard
//! - Exit status is derived from how the run loop ended, never from the trigger

pub mod controller;
pub mod daemon;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use controller::{Controller, Outcome, Phase, PhaseTracker, RunHandle};
pub use daemon::{run_daemon, Exit};
pub use shutdown::{ShutdownGuard, Trigger};
pub use signals::{Interrupt, SignalSource, TerminateSignals};
pub use startup::{bootstrap, LifecycleError};
