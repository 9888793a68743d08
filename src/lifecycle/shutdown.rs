//! Shutdown coordination for the daemon.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// What asked the daemon to shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// An OS termination signal arrived.
    Signal(&'static str),
    /// The engine run loop returned an error.
    EngineFailure,
    /// The engine run loop returned on its own.
    EngineExited,
    /// `Controller::stop` was called.
    External,
    /// Loading or persisting state failed during startup.
    StartupFailure,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Signal(name) => write!(f, "signal {name}"),
            Trigger::EngineFailure => f.write_str("engine failure"),
            Trigger::EngineExited => f.write_str("engine exit"),
            Trigger::External => f.write_str("external stop"),
            Trigger::StartupFailure => f.write_str("startup failure"),
        }
    }
}

/// Single-execution latch shared by every shutdown trigger.
///
/// The first caller of [`run_once`](Self::run_once) executes the action while
/// holding the latch. Concurrent callers block until it has finished and
/// then return without running anything.
#[derive(Debug, Default)]
pub struct ShutdownGuard {
    consumed: Mutex<bool>,
}

impl ShutdownGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` unless the guard has already been consumed.
    ///
    /// Returns `true` if this call ran the action.
    pub fn run_once<F: FnOnce()>(&self, action: F) -> bool {
        let mut consumed = self.consumed.lock().unwrap_or_else(PoisonError::into_inner);
        if *consumed {
            return false;
        }
        // Set first: a panicking action must still never run twice.
        *consumed = true;
        action();
        true
    }

    pub fn is_consumed(&self) -> bool {
        *self.consumed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
