//! Platform events broadcast by the control layer.
//!
//! High-level state changes any frontend may subscribe to. Produced by
//! the job lifecycle controller and the cleanup coordinator; log lines
//! themselves go to the injected log sink, not this channel.

use serde::Serialize;

use crate::types::JobId;

/// A platform-level event describing lifecycle progress.
#[derive(Debug, Clone, Serialize)]
pub enum JobEvent {
    /// The server accepted a submission; the run is now live.
    SubmitAccepted { job_id: JobId },

    /// A run reached `Completed`; the results view is available.
    RunCompleted {
        job_id: JobId,
        results_url: Option<String>,
    },

    /// A run reached `Failed`.
    RunFailed { job_id: JobId, error: String },

    /// An explicit user-requested cleanup resolved.
    CleanupFinished { success: bool },
}
