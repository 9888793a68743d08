//! Lifecycle controller.
//!
//! # States
//! ```text
//! Created → ConfigResolved → EngineConstructed → StateLoaded → Running
//!     → ShuttingDown → Stopped
//! ```
//!
//! # Shutdown Triggers
//! - Termination signal (signal task)
//! - Engine run loop returning an error (run task)
//! - Explicit `stop` call (hosting layer, embedders)
//!
//! All triggers go through one [`ShutdownGuard`], so `request_stop` reaches
//! the engine exactly once. There is no way back to `Running`.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::{Engine, EngineError};
use crate::lifecycle::shutdown::{ShutdownGuard, Trigger};
use crate::lifecycle::signals::SignalSource;
use crate::lifecycle::startup::LifecycleError;

/// Position in the daemon lifecycle. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Created,
    ConfigResolved,
    EngineConstructed,
    StateLoaded,
    Running,
    ShuttingDown,
    Stopped,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Created => "created",
            Phase::ConfigResolved => "config_resolved",
            Phase::EngineConstructed => "engine_constructed",
            Phase::StateLoaded => "state_loaded",
            Phase::Running => "running",
            Phase::ShuttingDown => "shutting_down",
            Phase::Stopped => "stopped",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the run loop ended.
#[derive(Debug)]
pub enum Outcome {
    /// The engine unwound after a stop request.
    Graceful,
    /// The engine failed; the process must exit non-zero.
    Failed(EngineError),
}

impl Outcome {
    pub fn is_graceful(&self) -> bool {
        matches!(self, Outcome::Graceful)
    }
}

/// Forward-only phase cell.
///
/// Created by the hosting layer before options are resolved and handed to
/// the controller once the engine exists, so every phase from `Created` on
/// is recorded in one place.
#[derive(Debug)]
pub struct PhaseTracker {
    tx: watch::Sender<Phase>,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Phase::Created);
        Self { tx }
    }

    pub fn current(&self) -> Phase {
        *self.tx.borrow()
    }

    /// Receiver notified on every phase change.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.tx.subscribe()
    }

    pub fn expect(&self, expected: Phase) -> Result<(), LifecycleError> {
        let actual = self.current();
        if actual == expected {
            Ok(())
        } else {
            Err(LifecycleError::InvalidPhase { expected, actual })
        }
    }

    /// Move from `from` to `to`, failing if the current phase is not `from`.
    pub fn advance(&self, from: Phase, to: Phase) -> Result<(), LifecycleError> {
        let mut actual = from;
        let moved = self.tx.send_if_modified(|phase| {
            if *phase == from {
                *phase = to;
                true
            } else {
                actual = *phase;
                false
            }
        });
        if !moved {
            return Err(LifecycleError::InvalidPhase {
                expected: from,
                actual,
            });
        }
        tracing::info!(from = %from, to = %to, "Lifecycle transition");
        Ok(())
    }

    /// Move to `to` from any earlier phase. Later phases are left alone.
    fn transition(&self, to: Phase) {
        let mut from = to;
        let moved = self.tx.send_if_modified(|phase| {
            from = *phase;
            if to > *phase {
                *phase = to;
                true
            } else {
                false
            }
        });
        if moved {
            tracing::info!(from = %from, to = %to, "Lifecycle transition");
        }
    }
}

/// Owns the engine and the shutdown guard for the lifetime of the process.
pub struct Controller<E: Engine> {
    engine: Arc<E>,
    guard: ShutdownGuard,
    phase: PhaseTracker,
}

impl<E: Engine> Controller<E> {
    /// Wrap a freshly constructed engine.
    ///
    /// `phase` should already be at `EngineConstructed`; `prepare` rejects
    /// anything else.
    pub fn new(engine: E, phase: PhaseTracker) -> Self {
        Self {
            engine: Arc::new(engine),
            guard: ShutdownGuard::new(),
            phase,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn phase(&self) -> Phase {
        self.phase.current()
    }

    /// Receiver notified on every phase change.
    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Token cancelled once shutdown has begun.
    pub fn cancellation(&self) -> CancellationToken {
        self.engine.cancellation()
    }

    /// Load persisted state, then persist it straight back.
    ///
    /// The immediate persist proves the data path is writable before any
    /// work is accepted.
    pub fn prepare(&self) -> Result<(), LifecycleError> {
        self.phase.expect(Phase::EngineConstructed)?;
        self.engine.load_state().map_err(LifecycleError::LoadState)?;
        self.engine
            .persist_state()
            .map_err(LifecycleError::PersistState)?;
        self.phase.advance(Phase::EngineConstructed, Phase::StateLoaded)
    }

    /// Spawn the run loop and the signal task.
    pub fn start<S: SignalSource>(
        self: &Arc<Self>,
        mut signals: S,
    ) -> Result<RunHandle, LifecycleError> {
        self.phase.advance(Phase::StateLoaded, Phase::Running)?;

        let signal_task = {
            let controller = Arc::clone(self);
            tokio::spawn(async move {
                // Keep receiving after the first signal so later ones are
                // absorbed by the guard instead of the default handler.
                while let Some(name) = signals.recv().await {
                    tracing::info!(signal = name, "Termination signal received");
                    controller.shutdown(Trigger::Signal(name));
                }
            })
        };

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = match controller.engine.run().await {
                Ok(()) => {
                    controller.shutdown(Trigger::EngineExited);
                    Outcome::Graceful
                }
                Err(e) => {
                    tracing::error!(error = %e, "Engine run loop failed");
                    controller.shutdown(Trigger::EngineFailure);
                    Outcome::Failed(e)
                }
            };
            controller.phase.transition(Phase::Stopped);
            let _ = outcome_tx.send(outcome);
        });

        Ok(RunHandle {
            outcome: outcome_rx,
            signal_task,
        })
    }

    /// Route a shutdown trigger through the guard.
    ///
    /// Returns `true` if this call performed the shutdown. Callers that lose
    /// the race return only after the winning shutdown has completed.
    pub fn shutdown(&self, trigger: Trigger) -> bool {
        let ran = self.guard.run_once(|| {
            self.phase.transition(Phase::ShuttingDown);
            tracing::info!(trigger = %trigger, "Shutting down");
            self.engine.request_stop();
        });
        if !ran {
            tracing::debug!(trigger = %trigger, "Shutdown already performed");
        }
        ran
    }

    /// Explicit external stop.
    pub fn stop(&self) -> bool {
        self.shutdown(Trigger::External)
    }
}

/// Handle on a started controller.
pub struct RunHandle {
    outcome: oneshot::Receiver<Outcome>,
    signal_task: JoinHandle<()>,
}

impl RunHandle {
    /// Wait for the run loop to finish and shutdown to complete.
    pub async fn wait(self) -> Outcome {
        let outcome = self.outcome.await.unwrap_or_else(|_| {
            Outcome::Failed(EngineError::Internal(
                "run loop ended without reporting an outcome".to_string(),
            ))
        });
        self.signal_task.abort();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct CountingEngine {
        stops: AtomicUsize,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl Engine for CountingEngine {
        fn load_state(&self) -> Result<(), EngineError> {
            Ok(())
        }

        fn persist_state(&self) -> Result<(), EngineError> {
            Ok(())
        }

        async fn run(&self) -> Result<(), EngineError> {
            self.cancel.cancelled().await;
            Ok(())
        }

        fn request_stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.cancel.cancel();
        }

        fn cancellation(&self) -> CancellationToken {
            self.cancel.clone()
        }
    }

    fn constructed() -> Arc<Controller<CountingEngine>> {
        let phase = PhaseTracker::new();
        phase.advance(Phase::Created, Phase::ConfigResolved).unwrap();
        phase
            .advance(Phase::ConfigResolved, Phase::EngineConstructed)
            .unwrap();
        Arc::new(Controller::new(CountingEngine::default(), phase))
    }

    #[test]
    fn test_tracker_starts_created_and_only_moves_forward() {
        let phase = PhaseTracker::new();
        assert_eq!(phase.current(), Phase::Created);

        let err = phase
            .advance(Phase::ConfigResolved, Phase::EngineConstructed)
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidPhase {
                expected: Phase::ConfigResolved,
                actual: Phase::Created,
            }
        ));

        phase.advance(Phase::Created, Phase::ConfigResolved).unwrap();
        phase.transition(Phase::ShuttingDown);
        phase.transition(Phase::Running);
        assert_eq!(phase.current(), Phase::ShuttingDown);
        assert!(phase.expect(Phase::ShuttingDown).is_ok());
    }

    #[tokio::test]
    async fn test_prepare_rejects_unconstructed_phase() {
        let controller = Controller::new(CountingEngine::default(), PhaseTracker::new());
        assert!(matches!(
            controller.prepare(),
            Err(LifecycleError::InvalidPhase {
                expected: Phase::EngineConstructed,
                actual: Phase::Created,
            })
        ));
    }

    #[tokio::test]
    async fn test_phases_move_forward() {
        let controller = constructed();
        let mut phases = controller.watch_phase();
        assert_eq!(controller.phase(), Phase::EngineConstructed);

        controller.prepare().unwrap();
        assert_eq!(controller.phase(), Phase::StateLoaded);

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = controller.start(rx).unwrap();
        assert_eq!(controller.phase(), Phase::Running);

        tx.send("SIGTERM").unwrap();
        phases
            .wait_for(|phase| *phase == Phase::Stopped)
            .await
            .unwrap();
        assert!(handle.wait().await.is_graceful());
        assert_eq!(controller.phase(), Phase::Stopped);
        assert!(controller.cancellation().is_cancelled());
    }

    #[tokio::test]
    async fn test_start_requires_loaded_state() {
        let controller = constructed();
        let (_tx, rx) = mpsc::unbounded_channel();

        let err = controller.start(rx).err().unwrap();
        assert!(matches!(
            err,
            LifecycleError::InvalidPhase {
                expected: Phase::StateLoaded,
                actual: Phase::EngineConstructed,
            }
        ));
    }

    #[tokio::test]
    async fn test_cannot_restart_after_stop() {
        let controller = constructed();
        controller.prepare().unwrap();

        let (_tx, rx) = mpsc::unbounded_channel();
        let handle = controller.start(rx).unwrap();
        assert!(controller.stop());
        assert!(!controller.stop());
        handle.wait().await;

        let (_tx, rx) = mpsc::unbounded_channel();
        assert!(controller.start(rx).is_err());
        assert!(controller.prepare().is_err());
        assert_eq!(controller.engine().stops.load(Ordering::SeqCst), 1);
    }
}
