//! Graceful shutdown handling
//!
//! One watch channel fans the shutdown signal out to the HTTP server, the
//! bare metal asset poller and every in-flight import secret poll.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::import::CancelToken;

/// Shutdown coordinator for graceful termination
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    is_shutting_down: Arc<AtomicBool>,
    /// Grace period for draining
    timeout: Duration,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator with default 30s timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            shutdown_tx,
            shutdown_rx,
            is_shutting_down: Arc::new(AtomicBool::new(false)),
            timeout,
        }
    }

    /// Get a receiver for shutdown signals
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Token that is cancelled when shutdown starts
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken::from_receiver(self.subscribe())
    }

    pub fn is_shutting_down(&self) -> bool {
        self.is_shutting_down.load(Ordering::SeqCst)
    }

    /// Initiate graceful shutdown
    pub fn shutdown(&self) {
        if self.is_shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Initiating graceful shutdown...");
        self.shutdown_tx.send_replace(true);
    }

    /// Wait for SIGTERM or SIGINT, then start shutdown
    pub async fn wait_for_signal(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(mut sigterm), Ok(mut sigint)) => {
                    tokio::select! {
                        _ = sigterm.recv() => info!("Received SIGTERM"),
                        _ = sigint.recv() => info!("Received SIGINT"),
                    }
                }
                (Err(e), _) | (_, Err(e)) => {
                    warn!(error = %e, "Failed to register signal handlers, using ctrl-c");
                    wait_for_ctrl_c().await;
                }
            }
        }

        #[cfg(not(unix))]
        wait_for_ctrl_c().await;

        self.shutdown();
    }

    /// Future for axum's graceful shutdown
    pub fn signal(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut token = self.cancel_token();
        async move { token.cancelled().await }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C");
}

/// Background tasks stopped on shutdown
pub struct TaskShutdown {
    tasks: Vec<(&'static str, tokio::task::JoinHandle<()>)>,
}

impl TaskShutdown {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn register(&mut self, name: &'static str, handle: tokio::task::JoinHandle<()>) {
        self.tasks.push((name, handle));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Give each task `timeout` to finish on its own, then abort it
    pub async fn join_all(&mut self, timeout: Duration) {
        info!("Stopping {} background tasks...", self.tasks.len());

        for (name, mut handle) in self.tasks.drain(..) {
            match tokio::time::timeout(timeout, &mut handle).await {
                Ok(Ok(())) => info!("Task '{}' stopped gracefully", name),
                Ok(Err(e)) if e.is_cancelled() => info!("Task '{}' cancelled", name),
                Ok(Err(e)) => warn!("Task '{}' failed: {}", name, e),
                Err(_) => {
                    warn!("Task '{}' did not stop within timeout, aborting", name);
                    handle.abort();
                }
            }
        }
    }
}

impl Default for TaskShutdown {
    fn default() -> Self {
        Self::new()
    }
}
