//! Graceful shutdown handling
//!
//! Coordinates cancellation across the sync pipeline: SIGINT/SIGTERM and
//! the optional global run timeout both flip the same flag, the producer
//! stops emitting, in-flight task transactions complete, and the run is
//! finalized as failed/cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::warn;

/// Shutdown coordinator shared by the producer and all workers.
#[derive(Clone, Default)]
pub struct ShutdownCoordinator {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl std::fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("requested", &self.requested.load(Ordering::SeqCst))
            .finish()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent.
    pub fn request_shutdown(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested.
    pub async fn wait_for_shutdown(&self) {
        if self.is_shutdown_requested() {
            return;
        }
        self.notify.notified().await;
    }

    /// Listen for SIGINT and SIGTERM in a background task.
    pub fn install_signal_handlers(&self) -> tokio::task::JoinHandle<()> {
        let coordinator = self.clone();

        tokio::spawn(async move {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};

                let mut sigint =
                    signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
                let mut sigterm =
                    signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

                tokio::select! {
                    _ = sigint.recv() => {
                        warn!("received SIGINT, draining in-flight tasks");
                        coordinator.request_shutdown();
                    }
                    _ = sigterm.recv() => {
                        warn!("received SIGTERM, draining in-flight tasks");
                        coordinator.request_shutdown();
                    }
                }
            }

            #[cfg(not(unix))]
            {
                tokio::signal::ctrl_c()
                    .await
                    .expect("failed to install Ctrl+C handler");
                warn!("received Ctrl+C, draining in-flight tasks");
                coordinator.request_shutdown();
            }
        })
    }

    /// Treat timeout expiry as an external cancellation signal.
    pub fn install_timeout(&self, timeout: Duration) -> tokio::task::JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if !coordinator.is_shutdown_requested() {
                warn!(?timeout, "run timeout expired, cancelling");
                coordinator.request_shutdown();
            }
        })
    }
}
