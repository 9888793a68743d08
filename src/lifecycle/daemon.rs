//! Process hosting layer.
//!
//! Drives the controller from a parsed command line to a process exit
//! status. `main` only wires in the real engine factory and OS signals.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::{load_options, version_string, Cli, DAEMON_NAME};
use crate::engine::{Engine, EngineFactory};
use crate::lifecycle::controller::{Controller, Outcome, Phase, PhaseTracker};
use crate::lifecycle::signals::SignalSource;
use crate::lifecycle::startup::bootstrap;
use crate::observability::init_logging;

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success,
    Failure,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Success => ExitCode::SUCCESS,
            Exit::Failure => ExitCode::FAILURE,
        }
    }
}

/// Run the daemon until it stops.
///
/// `signals` feeds the controller's signal task. `interrupt` resolving is
/// treated as an explicit stop request; its handler must already be
/// registered, since it is first polled only after startup.
pub async fn run_daemon<F, S, I>(cli: Cli, factory: F, signals: S, interrupt: I) -> Exit
where
    F: EngineFactory,
    S: SignalSource,
    I: Future<Output = ()>,
{
    if cli.version {
        println!("{}", version_string());
        return Exit::Success;
    }

    let phase = PhaseTracker::new();

    let options = match load_options(&cli) {
        Ok(options) => options,
        Err(e) => {
            // Logging is configured from these options, so it is not up yet.
            eprintln!("[{DAEMON_NAME}] FATAL: {e}");
            return Exit::Failure;
        }
    };

    init_logging(options.log_level);
    tracing::info!(
        version = %version_string(),
        data_path = %options.data_path.display(),
        "Options resolved"
    );
    if let Err(e) = phase.advance(Phase::Created, Phase::ConfigResolved) {
        tracing::error!(error = %e, "Startup failed");
        return Exit::Failure;
    }

    let controller = match bootstrap(options, &factory, phase) {
        Ok(controller) => Arc::new(controller),
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Exit::Failure;
        }
    };

    let handle = match controller.start(signals) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start engine");
            controller.stop();
            return Exit::Failure;
        }
    };

    let outcome = wait_or_interrupt(&controller, handle.wait(), interrupt).await;
    match outcome {
        Outcome::Graceful => {
            tracing::info!("Shutdown complete");
            Exit::Success
        }
        Outcome::Failed(e) => {
            tracing::error!(error = %e, "Engine stopped with error");
            Exit::Failure
        }
    }
}

async fn wait_or_interrupt<E, W, I>(controller: &Controller<E>, wait: W, interrupt: I) -> Outcome
where
    E: Engine,
    W: Future<Output = Outcome>,
    I: Future<Output = ()>,
{
    tokio::pin!(wait, interrupt);
    tokio::select! {
        outcome = &mut wait => outcome,
        () = &mut interrupt => {
            controller.stop();
            wait.await
        }
    }
}
