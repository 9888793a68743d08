//! Shared utilities for lifecycle integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

use queue_daemon::config::{Cli, Options};
use queue_daemon::engine::{Engine, EngineError, EngineFactory};
use queue_daemon::lifecycle::{Phase, PhaseTracker};

/// Call counters shared between a mock factory and the engines it builds.
#[derive(Debug, Default)]
pub struct Calls {
    pub construct: AtomicUsize,
    pub load: AtomicUsize,
    pub persist: AtomicUsize,
    pub run: AtomicUsize,
    pub request_stop: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// How the mock run loop ends.
#[derive(Debug, Clone)]
pub enum RunBehavior {
    /// Wait for `request_stop`, then return Ok.
    UntilStopped,
    /// Return an error straight away.
    FailImmediately,
    /// Return an error once the notify fires.
    FailOn(Arc<Notify>),
}

#[derive(Debug, Clone)]
pub struct MockFactory {
    pub calls: Arc<Calls>,
    pub fail_construct: bool,
    pub fail_load: bool,
    pub fail_persist: bool,
    pub run: RunBehavior,
}

impl Default for MockFactory {
    fn default() -> Self {
        Self {
            calls: Arc::new(Calls::default()),
            fail_construct: false,
            fail_load: false,
            fail_persist: false,
            run: RunBehavior::UntilStopped,
        }
    }
}

impl EngineFactory for MockFactory {
    type Engine = MockEngine;

    fn construct(&self, options: Options) -> Result<MockEngine, EngineError> {
        self.calls.construct.fetch_add(1, Ordering::SeqCst);
        if self.fail_construct {
            return Err(EngineError::InvalidOptions("mock construct failure".into()));
        }
        Ok(MockEngine {
            options,
            calls: self.calls.clone(),
            fail_load: self.fail_load,
            fail_persist: self.fail_persist,
            run: self.run.clone(),
            cancel: CancellationToken::new(),
        })
    }
}

pub struct MockEngine {
    pub options: Options,
    calls: Arc<Calls>,
    fail_load: bool,
    fail_persist: bool,
    run: RunBehavior,
    cancel: CancellationToken,
}

#[async_trait]
impl Engine for MockEngine {
    fn load_state(&self) -> Result<(), EngineError> {
        self.calls.load.fetch_add(1, Ordering::SeqCst);
        if self.fail_load {
            return Err(EngineError::Internal("mock load failure".into()));
        }
        Ok(())
    }

    fn persist_state(&self) -> Result<(), EngineError> {
        self.calls.persist.fetch_add(1, Ordering::SeqCst);
        if self.fail_persist {
            return Err(EngineError::Internal("mock persist failure".into()));
        }
        Ok(())
    }

    async fn run(&self) -> Result<(), EngineError> {
        self.calls.run.fetch_add(1, Ordering::SeqCst);
        match &self.run {
            RunBehavior::UntilStopped => {
                self.cancel.cancelled().await;
                Ok(())
            }
            RunBehavior::FailImmediately => Err(EngineError::Internal("mock run failure".into())),
            RunBehavior::FailOn(notify) => {
                notify.notified().await;
                Err(EngineError::Internal("mock run failure".into()))
            }
        }
    }

    fn request_stop(&self) {
        self.calls.request_stop.fetch_add(1, Ordering::SeqCst);
        self.cancel.cancel();
    }

    fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Phase tracker as the hosting layer leaves it once options are resolved.
pub fn resolved_phase() -> PhaseTracker {
    let phase = PhaseTracker::new();
    phase.advance(Phase::Created, Phase::ConfigResolved).unwrap();
    phase
}

/// Signal source fed by the returned sender.
pub fn channel_signals() -> (
    mpsc::UnboundedSender<&'static str>,
    mpsc::UnboundedReceiver<&'static str>,
) {
    mpsc::unbounded_channel()
}

/// Parse a command line the way `main` does.
pub fn cli(args: &[&str]) -> Cli {
    use clap::Parser;
    Cli::parse_from(std::iter::once("queued").chain(args.iter().copied()))
}

/// Write `contents` as a config file inside `dir`.
pub fn write_config(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("queued.toml");
    std::fs::write(&path, contents).unwrap();
    path
}
