//! Cleanup coordination.
//!
//! One [`CleanupCoordinator`] per frontend triggers deletion of
//! server-side temporary artifacts. Cleanup is idempotent on the
//! server and treated as such here: repeated or concurrent requests
//! are each dispatched independently, never deduplicated, and never
//! share mutable state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use intake_core::events::JobEvent;

use crate::api::JobTransport;
use crate::sink::StatusSink;

/// Grace period for a teardown-time cleanup dispatch. Elapsing without
/// a response still counts as dispatched.
const SHUTDOWN_CLEANUP_GRACE: Duration = Duration::from_millis(750);

/// What prompted a cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupTrigger {
    /// Explicit user request; the result is awaited and surfaced.
    UserRequest,
    /// Frontend teardown; best-effort, nothing is surfaced.
    Shutdown,
}

/// Fire-and-forget cleanup of server-side temporary state.
pub struct CleanupCoordinator {
    transport: Arc<dyn JobTransport>,
    status: Arc<dyn StatusSink>,
    event_tx: Option<broadcast::Sender<JobEvent>>,
}

impl CleanupCoordinator {
    pub fn new(transport: Arc<dyn JobTransport>, status: Arc<dyn StatusSink>) -> Self {
        Self {
            transport,
            status,
            event_tx: None,
        }
    }

    /// Publish [`JobEvent::CleanupFinished`] onto an existing platform
    /// event feed (usually the controller's).
    pub fn with_events(mut self, event_tx: broadcast::Sender<JobEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Request cleanup now.
    ///
    /// Both triggers issue the same transport call; they differ only
    /// in how the result is handled. Safe to invoke repeatedly or
    /// concurrently: every invocation is independent.
    pub async fn cleanup_now(&self, trigger: CleanupTrigger) {
        match trigger {
            CleanupTrigger::UserRequest => self.user_cleanup().await,
            CleanupTrigger::Shutdown => self.shutdown_cleanup().await,
        }
    }

    async fn user_cleanup(&self) {
        match self.transport.request_cleanup().await {
            Ok(()) => {
                tracing::info!("Cleanup completed");
                self.status.notify_info("Temporary server files removed");
                self.emit(true);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cleanup failed");
                self.status.notify_error(&format!("Cleanup failed: {e}"));
                self.emit(false);
            }
        }
    }

    /// Dispatch with a bounded grace period and no observable failure
    /// path: the frontend is going away, so a missing response counts
    /// the same as success. The intent was dispatched.
    async fn shutdown_cleanup(&self) {
        match tokio::time::timeout(SHUTDOWN_CLEANUP_GRACE, self.transport.request_cleanup()).await
        {
            Ok(Ok(())) => tracing::debug!("Shutdown cleanup acknowledged"),
            Ok(Err(e)) => tracing::debug!(error = %e, "Shutdown cleanup failed"),
            Err(_) => tracing::debug!("Shutdown cleanup still in flight at teardown"),
        }
    }

    fn emit(&self, success: bool) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(JobEvent::CleanupFinished { success });
        }
    }
}
