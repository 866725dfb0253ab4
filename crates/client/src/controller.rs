//! Job lifecycle controller.
//!
//! [`JobController`] owns the single client-side [`JobRun`] and its
//! state machine: Idle -> Submitting -> Running -> Completed/Failed.
//! It drives the transport for submission, spawns a watch task that
//! consumes the log stream, and keeps the loader indicator strictly in
//! sync with run status. Platform-level events are broadcast via a
//! [`tokio::sync::broadcast`] channel; call
//! [`JobController::subscribe`] to receive them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use intake_core::events::JobEvent;
use intake_core::payload::UploadPayload;
use intake_core::types::{JobAccepted, JobId, JobRun, RunStatus};

use crate::api::JobTransport;
use crate::consumer::{LogConsumer, StreamOutcome};
use crate::sink::{LogSink, StatusSink};

/// Broadcast channel capacity for platform events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long shutdown waits for the watch task to exit.
const WATCH_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How a submit request was disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The server accepted the job; the run is now `Running`.
    Accepted,
    /// The submission failed; the run is `Failed` until acknowledged.
    Rejected,
    /// A run was already active; the request was dropped.
    Ignored,
}

/// Client-side state machine for one job run at a time.
///
/// Display handles are injected at construction; the controller is the
/// only writer of the loader indicator, and loader visibility is
/// always recomputed from run status, never toggled ad hoc. Cloning is
/// cheap and clones share the same run.
#[derive(Clone)]
pub struct JobController {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn JobTransport>,
    status: Arc<dyn StatusSink>,
    log: Arc<dyn LogSink>,
    /// The active (or last terminal) run. `None` means `Idle`.
    run: Mutex<Option<JobRun>>,
    watch: Mutex<Option<WatchTask>>,
    event_tx: broadcast::Sender<JobEvent>,
    /// Master cancellation token, cancelled during shutdown.
    cancel: CancellationToken,
}

/// Bookkeeping for the spawned log-watch task.
struct WatchTask {
    handle: tokio::task::JoinHandle<()>,
    /// Per-watch token (child of the master token).
    cancel: CancellationToken,
}

impl JobController {
    pub fn new(
        transport: Arc<dyn JobTransport>,
        status: Arc<dyn StatusSink>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                transport,
                status,
                log,
                run: Mutex::new(None),
                watch: Mutex::new(None),
                event_tx,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Subscribe to platform-level lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Sender half of the event channel, for collaborators (the
    /// cleanup coordinator) that publish onto the same feed.
    pub fn event_sender(&self) -> broadcast::Sender<JobEvent> {
        self.inner.event_tx.clone()
    }

    /// Current run status; `Idle` when no run exists.
    pub async fn status(&self) -> RunStatus {
        self.inner
            .run
            .lock()
            .await
            .as_ref()
            .map(|r| r.status)
            .unwrap_or(RunStatus::Idle)
    }

    /// Snapshot of the current run, for inspection.
    pub async fn current_run(&self) -> Option<JobRun> {
        self.inner.run.lock().await.clone()
    }

    /// Submit a new job.
    ///
    /// Ignored outright while a run is `Submitting` or `Running`: at
    /// most one run is active per controller. From `Idle` or any
    /// terminal state this starts a fresh run.
    pub async fn submit(&self, payload: &UploadPayload) -> SubmitOutcome {
        {
            let mut run = self.inner.run.lock().await;
            if run.as_ref().is_some_and(|r| r.status.is_active()) {
                tracing::debug!("Submit ignored: a run is already active");
                return SubmitOutcome::Ignored;
            }
            let fresh = JobRun::start();
            tracing::info!(job_id = %fresh.id, "Submitting job");
            *run = Some(fresh);
        }
        self.inner.sync_loader(RunStatus::Submitting);

        match self.inner.transport.submit_job(payload).await {
            Ok(accepted) => {
                self.begin_running(accepted).await;
                SubmitOutcome::Accepted
            }
            Err(e) => {
                self.inner.fail_run(format!("submission failed: {e}")).await;
                SubmitOutcome::Rejected
            }
        }
    }

    /// Acknowledge a failed run, returning the controller to `Idle`.
    ///
    /// No-op in any other state.
    pub async fn acknowledge(&self) {
        let mut run = self.inner.run.lock().await;
        if run.as_ref().is_some_and(|r| r.status == RunStatus::Failed) {
            *run = None;
            drop(run);
            self.inner.sync_loader(RunStatus::Idle);
        }
    }

    /// Cancel the watch task and stop the controller.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down job controller");
        self.inner.cancel.cancel();

        let task = self.inner.watch.lock().await.take();
        if let Some(task) = task {
            task.cancel.cancel();
            let _ = tokio::time::timeout(WATCH_SHUTDOWN_TIMEOUT, task.handle).await;
        }
    }

    // ---- private helpers ----

    /// Transition the accepted submission into `Running` and attach
    /// the log watch.
    async fn begin_running(&self, accepted: JobAccepted) {
        let (job_id, results_url) = {
            let mut run = self.inner.run.lock().await;
            let Some(r) = run.as_mut() else {
                // Torn down while the submission was in flight.
                return;
            };
            if let Some(server_id) = accepted.job_id {
                r.id = JobId::from(server_id);
            }
            r.status = RunStatus::Running;
            (r.id.clone(), accepted.results_url)
        };
        self.inner.sync_loader(RunStatus::Running);

        tracing::info!(job_id = %job_id, "Job accepted, attaching log stream");
        let _ = self.inner.event_tx.send(JobEvent::SubmitAccepted {
            job_id: job_id.clone(),
        });

        self.spawn_watch(job_id, results_url).await;
    }

    /// Spawn the task that opens the log stream and consumes it to a
    /// terminal outcome. Any previous watch is cancelled first.
    async fn spawn_watch(&self, job_id: JobId, results_url: Option<String>) {
        let cancel = self.inner.cancel.child_token();
        let inner = Arc::clone(&self.inner);
        let watch_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            watch_run(inner, job_id, results_url, watch_cancel).await;
        });

        let mut watch = self.inner.watch.lock().await;
        if let Some(previous) = watch.replace(WatchTask { handle, cancel }) {
            // A previous watch can only belong to a terminal run, but
            // cancel it regardless: last attach wins.
            previous.cancel.cancel();
        }
    }
}

/// Watch task body: open the log stream, consume it, translate the
/// outcome into a run transition.
async fn watch_run(
    inner: Arc<Inner>,
    job_id: JobId,
    results_url: Option<String>,
    cancel: CancellationToken,
) {
    // The open itself races cancellation, so a shutdown issued while
    // the stream is still connecting never reaches a torn-down
    // frontend through `fail_run`.
    let stream = tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(job_id = %job_id, "Log watch cancelled before the stream opened");
            return;
        }
        opened = inner.transport.open_log_stream(&job_id) => match opened {
            Ok(stream) => stream,
            Err(e) => {
                inner
                    .fail_run(format!("failed to open log stream: {e}"))
                    .await;
                return;
            }
        }
    };

    let mut consumer = LogConsumer::new();
    consumer.attach(stream);

    match consumer.run(inner.log.as_ref(), &cancel).await {
        StreamOutcome::Completed => inner.complete_run(results_url).await,
        StreamOutcome::Failed(reason) => inner.fail_run(reason).await,
        StreamOutcome::Errored(e) => inner.fail_run(e.to_string()).await,
        StreamOutcome::Detached => {
            tracing::debug!(job_id = %job_id, "Log watch detached");
        }
    }
}

impl Inner {
    /// Transition the run to `Completed` and present the results view.
    async fn complete_run(&self, results_url: Option<String>) {
        let job_id = {
            let mut run = self.run.lock().await;
            let Some(r) = run.as_mut() else { return };
            r.status = RunStatus::Completed;
            r.id.clone()
        };
        self.sync_loader(RunStatus::Completed);

        tracing::info!(job_id = %job_id, "Job run completed");
        self.status.show_results(results_url.as_deref());
        let _ = self.event_tx.send(JobEvent::RunCompleted {
            job_id,
            results_url,
        });
    }

    /// Transition the run to `Failed` and surface the error.
    async fn fail_run(&self, reason: String) {
        let job_id = {
            let mut run = self.run.lock().await;
            let Some(r) = run.as_mut() else { return };
            r.status = RunStatus::Failed;
            r.error_detail = Some(reason.clone());
            r.id.clone()
        };
        self.sync_loader(RunStatus::Failed);

        tracing::warn!(job_id = %job_id, error = %reason, "Job run failed");
        self.status.notify_error(&reason);
        let _ = self.event_tx.send(JobEvent::RunFailed {
            job_id,
            error: reason,
        });
    }

    /// Recompute loader visibility from run status. This is the only
    /// place the loader is ever touched.
    fn sync_loader(&self, status: RunStatus) {
        self.status.set_loader_visible(status.is_active());
    }
}
