use std::sync::{Arc, Mutex};

use eyre::{Result, WrapErr};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Represents different shutdown reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// OS signal received (SIGTERM, SIGINT)
    Graceful,
    /// Requested from inside the process
    Manual,
}

/// Coordinates the server's shutdown.
///
/// Anything that must stop with the server (the accept loop, live stream
/// sources) can hang off [`token`](Self::token) or a child of it.
#[derive(Clone, Default)]
pub struct GracefulShutdown {
    token: CancellationToken,
    reason: Arc<Mutex<Option<ShutdownReason>>>,
}

impl GracefulShutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token cancelled when shutdown starts
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Check if shutdown has been initiated
    pub fn is_shutdown_initiated(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Why the shutdown started, once it has
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.reason.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start the shutdown. Only the first reason is kept.
    pub fn trigger_shutdown(&self, reason: ShutdownReason) {
        let mut current = self.reason.lock().unwrap_or_else(|e| e.into_inner());
        if current.is_some() {
            tracing::warn!("Shutdown already initiated, ignoring {:?}", reason);
            return;
        }
        *current = Some(reason);
        tracing::info!("Processing shutdown signal: {:?}", reason);
        self.token.cancel();
    }

    /// Wait for SIGINT or SIGTERM and start the shutdown.
    ///
    /// Returns early, without a signal, if the shutdown is triggered
    /// another way.
    pub async fn run_signal_handler(&self) -> Result<()> {
        tracing::info!("Signal handler started. Listening for SIGTERM and SIGINT");

        #[cfg(unix)]
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .wrap_err("Failed to register SIGTERM handler")?;

        #[cfg(unix)]
        let terminate = sigterm.recv();
        #[cfg(not(unix))]
        let terminate = std::future::pending::<Option<()>>();

        tokio::select! {
            result = signal::ctrl_c() => {
                result.wrap_err("Failed to listen for Ctrl+C")?;
                tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                self.trigger_shutdown(ShutdownReason::Graceful);
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
                self.trigger_shutdown(ShutdownReason::Graceful);
            }
            _ = self.token.cancelled() => {}
        }

        Ok(())
    }

    /// Wait indefinitely for shutdown (used as the server's shutdown future)
    pub async fn wait_for_shutdown_signal(self) -> ShutdownReason {
        self.token.cancelled().await;
        let reason = self.reason().unwrap_or(ShutdownReason::Manual);
        tracing::info!("Shutdown signal received: {:?}", reason);
        reason
    }
}

impl std::fmt::Debug for GracefulShutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GracefulShutdown")
            .field("reason", &self.reason())
            .finish()
    }
}
