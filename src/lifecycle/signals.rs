//! OS signal handling.
//!
//! # Responsibilities
//! - Register the SIGTERM handler for the controller's signal task
//! - Register the Ctrl-C listener used by the hosting layer
//! - Let embedders and tests feed signals through a channel
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Both handlers are registered before startup begins
//! - The SIGTERM handler stays registered for the whole process lifetime so
//!   repeated signals never fall back to the default (kill) behaviour
//! - SIGINT belongs to the hosting layer, which calls `Controller::stop`

use async_trait::async_trait;
use tokio::sync::mpsc;

/// A stream of termination signals.
#[async_trait]
pub trait SignalSource: Send + 'static {
    /// Wait for the next signal. `None` means no more signals will arrive.
    async fn recv(&mut self) -> Option<&'static str>;
}

/// SIGTERM on Unix, Ctrl-C elsewhere.
pub struct TerminateSignals {
    #[cfg(unix)]
    inner: tokio::signal::unix::Signal,
}

impl TerminateSignals {
    /// Install the handler. Must be called inside a Tokio runtime.
    pub fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                inner: signal(SignalKind::terminate())?,
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }
}

#[cfg(unix)]
#[async_trait]
impl SignalSource for TerminateSignals {
    async fn recv(&mut self) -> Option<&'static str> {
        self.inner.recv().await.map(|()| "SIGTERM")
    }
}

#[cfg(not(unix))]
#[async_trait]
impl SignalSource for TerminateSignals {
    async fn recv(&mut self) -> Option<&'static str> {
        tokio::signal::ctrl_c().await.ok().map(|()| "ctrl-c")
    }
}

#[async_trait]
impl SignalSource for mpsc::UnboundedReceiver<&'static str> {
    async fn recv(&mut self) -> Option<&'static str> {
        mpsc::UnboundedReceiver::recv(self).await
    }
}

/// Ctrl-C (SIGINT) listener.
///
/// The handler is registered by [`install`](Self::install), not on first
/// poll, so an interrupt during startup is held until the hosting layer
/// waits on it instead of killing the process.
pub struct Interrupt {
    #[cfg(unix)]
    inner: tokio::signal::unix::Signal,
    #[cfg(not(unix))]
    inner: tokio::sync::oneshot::Receiver<()>,
}

impl Interrupt {
    /// Install the handler. Must be called inside a Tokio runtime.
    pub fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                inner: signal(SignalKind::interrupt())?,
            })
        }
        #[cfg(not(unix))]
        {
            let (tx, rx) = tokio::sync::oneshot::channel();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        let _ = tx.send(());
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to listen for interrupt"),
                }
            });
            Ok(Self { inner: rx })
        }
    }
}

#[cfg(unix)]
impl Interrupt {
    /// Resolves on the first interrupt. Never resolves if the stream ends.
    pub async fn wait(mut self) {
        match self.inner.recv().await {
            Some(()) => tracing::info!("Interrupt received"),
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(not(unix))]
impl Interrupt {
    /// Resolves on the first interrupt. Never resolves if the listener failed.
    pub async fn wait(self) {
        match self.inner.await {
            Ok(()) => tracing::info!("Interrupt received"),
            Err(_) => std::future::pending::<()>().await,
        }
    }
}
