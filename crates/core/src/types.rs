//! Job run identity and lifecycle status.

use serde::{Deserialize, Serialize};

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque identifier for one job run.
///
/// Generated client-side (UUID v4) when a run starts; replaced by the
/// server-assigned id if the submission response carries one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh client-side run identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-side lifecycle status of a job run.
///
/// `Completed` and `Failed` are terminal; a new submission always
/// starts a fresh run from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No run in flight.
    Idle,
    /// The submission request is on the wire.
    Submitting,
    /// The server accepted the job; the log stream is (being) attached.
    Running,
    /// The run finished successfully.
    Completed,
    /// The run failed; `JobRun::error_detail` carries the reason.
    Failed,
}

impl RunStatus {
    /// Whether a run in this status occupies the single active slot.
    ///
    /// Submissions arriving while a run is active are ignored.
    pub fn is_active(self) -> bool {
        matches!(self, RunStatus::Submitting | RunStatus::Running)
    }
}

/// One submission-to-completion cycle.
///
/// Owned exclusively by the job lifecycle controller: created on
/// submit, replaced when a new run starts, cleared when a failure is
/// acknowledged.
#[derive(Debug, Clone)]
pub struct JobRun {
    pub id: JobId,
    pub status: RunStatus,
    pub started_at: Timestamp,
    /// Present only when `status` is [`RunStatus::Failed`].
    pub error_detail: Option<String>,
}

impl JobRun {
    /// Start a new run in `Submitting` with a generated id.
    pub fn start() -> Self {
        Self {
            id: JobId::generate(),
            status: RunStatus::Submitting,
            started_at: chrono::Utc::now(),
            error_detail: None,
        }
    }
}

/// Server acknowledgment of an accepted submission.
///
/// The response body is opaque beyond the status code; both fields are
/// best-effort extractions and may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobAccepted {
    /// Server-assigned job identifier, if the server returned one.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Location of the results view, if the server returned one.
    #[serde(default)]
    pub results_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(JobId::generate(), JobId::generate());
    }

    #[test]
    fn new_run_is_submitting_without_error() {
        let run = JobRun::start();
        assert_matches!(run.status, RunStatus::Submitting);
        assert!(run.error_detail.is_none());
    }

    #[test]
    fn only_submitting_and_running_are_active() {
        assert!(RunStatus::Submitting.is_active());
        assert!(RunStatus::Running.is_active());
        assert!(!RunStatus::Idle.is_active());
        assert!(!RunStatus::Completed.is_active());
        assert!(!RunStatus::Failed.is_active());
    }

    #[test]
    fn accepted_parses_lenient_bodies() {
        let full: JobAccepted =
            serde_json::from_str(r#"{"job_id":"j-1","results_url":"/results"}"#).unwrap();
        assert_eq!(full.job_id.as_deref(), Some("j-1"));
        assert_eq!(full.results_url.as_deref(), Some("/results"));

        let empty: JobAccepted = serde_json::from_str("{}").unwrap();
        assert!(empty.job_id.is_none());
        assert!(empty.results_url.is_none());
    }
}
