//! Log stream consumption loop.
//!
//! [`LogConsumer`] owns at most one live [`LogStream`] and drives it
//! to a terminal [`StreamOutcome`], appending every log line to the
//! injected [`LogSink`] in arrival order. It never reconnects: a
//! failed stream is reported upward and whoever owns the run decides
//! what happens next.

use tokio_util::sync::CancellationToken;

use crate::sink::LogSink;
use crate::sse::LogFeedEvent;
use crate::stream::{LogStream, StreamError};

/// How one consumption run ended.
#[derive(Debug)]
pub enum StreamOutcome {
    /// The feed signalled terminal success (`event: done`).
    Completed,
    /// The feed signalled terminal failure (`event: error`).
    Failed(String),
    /// The connection failed, or closed before any terminal signal.
    Errored(StreamError),
    /// Consumption was cancelled from outside.
    Detached,
}

/// Consumes one log stream at a time.
#[derive(Debug, Default)]
pub struct LogConsumer {
    active: Option<LogStream>,
}

impl LogConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a freshly opened stream, closing any prior handle first.
    ///
    /// Last attach wins, immediately: no messages from the previous
    /// stream are observed after this returns.
    pub fn attach(&mut self, stream: LogStream) {
        if let Some(mut previous) = self.active.take() {
            tracing::debug!("Closing superseded log stream");
            previous.close();
        }
        self.active = Some(stream);
    }

    /// Close and drop the current handle, if any. No-op when nothing
    /// is attached or the handle is already closed.
    pub fn detach(&mut self) {
        if let Some(mut stream) = self.active.take() {
            stream.close();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.active.is_some()
    }

    /// Drive the attached stream until a terminal signal, a stream
    /// failure, or cancellation. Each line is appended to `log` in
    /// arrival order; no reordering, no deduplication.
    ///
    /// The handle is always closed by the time this returns. Running
    /// with nothing attached yields [`StreamOutcome::Detached`].
    pub async fn run(&mut self, log: &dyn LogSink, cancel: &CancellationToken) -> StreamOutcome {
        let outcome = loop {
            let Some(stream) = self.active.as_mut() else {
                break StreamOutcome::Detached;
            };

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Log consumption cancelled");
                    break StreamOutcome::Detached;
                }
                event = stream.next_event() => match event {
                    Some(Ok(LogFeedEvent::Line(line))) => log.append(&line),
                    Some(Ok(LogFeedEvent::Completed)) => break StreamOutcome::Completed,
                    Some(Ok(LogFeedEvent::Failed(reason))) => {
                        break StreamOutcome::Failed(reason);
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Log stream failed");
                        break StreamOutcome::Errored(e);
                    }
                    None => {
                        // A feed that ends without `done` or `error`
                        // lost its server; treat it like a dropped
                        // connection rather than silent success.
                        break StreamOutcome::Errored(StreamError::ClosedEarly);
                    }
                }
            }
        };

        self.detach();
        outcome
    }
}
