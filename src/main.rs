//! Queue daemon entry point.
//!
//! ```text
//!     argv ──▶ config ──▶ engine ──▶ lifecycle ──▶ exit status
//!               │                      ▲
//!               └── file < flags       └── SIGTERM / SIGINT / run failure
//! ```

use std::process::ExitCode;

use clap::Parser;

use queue_daemon::config::{Cli, DAEMON_NAME};
use queue_daemon::engine::QueueEngineFactory;
use queue_daemon::lifecycle::{run_daemon, Interrupt, TerminateSignals};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Both handlers go in before startup so no signal hits the default action.
    let installed = TerminateSignals::install()
        .and_then(|signals| Ok((signals, Interrupt::install()?)));
    let (signals, interrupt) = match installed {
        Ok(handlers) => handlers,
        Err(e) => {
            eprintln!("[{DAEMON_NAME}] FATAL: failed to install signal handler - {e}");
            return ExitCode::FAILURE;
        }
    };

    run_daemon(cli, QueueEngineFactory, signals, interrupt.wait())
        .await
        .into()
}
