//! Live log stream handle.
//!
//! [`LogStream`] wraps one open subscription to the service's log
//! feed: a stream of response-body chunks plus the SSE parser that
//! turns them into [`LogFeedEvent`]s. The handle never reconnects;
//! that policy belongs to whoever drives it.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::sse::{LogFeedEvent, SseParser};

/// Chunked response body feeding a [`LogStream`].
pub type ByteSource = Pin<Box<dyn Stream<Item = Result<Bytes, StreamError>> + Send>>;

/// Connection state of a log stream handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// The response is open but no chunk has arrived yet.
    Connecting,
    /// At least one chunk has arrived.
    Open,
    /// Closed cleanly (by the server or by [`LogStream::close`]).
    Closed,
    /// The underlying connection failed.
    Errored,
}

/// Errors on an open log stream.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StreamError {
    /// The connection dropped or the body read failed.
    #[error("log stream connection error: {0}")]
    Connection(String),

    /// The server closed the stream before a terminal signal arrived.
    #[error("log stream closed before the job finished")]
    ClosedEarly,
}

/// One open subscription to the log feed.
pub struct LogStream {
    state: ConnectionState,
    source: Option<ByteSource>,
    parser: SseParser,
    pending: VecDeque<LogFeedEvent>,
}

impl LogStream {
    pub fn new(source: ByteSource) -> Self {
        Self {
            state: ConnectionState::Connecting,
            source: Some(source),
            parser: SseParser::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// Close the subscription, dropping the underlying connection.
    ///
    /// Closing an already-closed (or errored) handle is a no-op.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            self.state = ConnectionState::Closed;
        }
    }

    /// Next decoded event, in arrival order.
    ///
    /// Returns `None` once the stream is closed or exhausted, and
    /// `Some(Err(_))` exactly once when the connection fails; the
    /// handle is `Errored` and unusable afterwards.
    pub async fn next_event(&mut self) -> Option<Result<LogFeedEvent, StreamError>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }

            let source = self.source.as_mut()?;
            match source.next().await {
                Some(Ok(chunk)) => {
                    if self.state == ConnectionState::Connecting {
                        self.state = ConnectionState::Open;
                    }
                    self.pending.extend(self.parser.push(&chunk));
                }
                Some(Err(e)) => {
                    self.state = ConnectionState::Errored;
                    self.source = None;
                    return Some(Err(e));
                }
                None => {
                    self.state = ConnectionState::Closed;
                    self.source = None;
                    return None;
                }
            }
        }
    }
}

impl std::fmt::Debug for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStream")
            .field("state", &self.state)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn stream_of(chunks: Vec<Result<&'static str, StreamError>>) -> LogStream {
        let items: Vec<Result<Bytes, StreamError>> = chunks
            .into_iter()
            .map(|r| r.map(|s| Bytes::from_static(s.as_bytes())))
            .collect();
        LogStream::new(Box::pin(futures::stream::iter(items)))
    }

    #[tokio::test]
    async fn yields_events_in_arrival_order() {
        let mut stream = stream_of(vec![Ok("data: one\n\ndata: two\n\n")]);
        assert_matches!(
            stream.next_event().await,
            Some(Ok(LogFeedEvent::Line(l))) if l == "one"
        );
        assert_matches!(
            stream.next_event().await,
            Some(Ok(LogFeedEvent::Line(l))) if l == "two"
        );
    }

    #[tokio::test]
    async fn opens_on_first_chunk_and_closes_on_exhaustion() {
        let mut stream = stream_of(vec![Ok("data: x\n\n")]);
        assert_eq!(stream.connection_state(), ConnectionState::Connecting);

        let _ = stream.next_event().await;
        assert_eq!(stream.connection_state(), ConnectionState::Open);

        assert!(stream.next_event().await.is_none());
        assert_eq!(stream.connection_state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn connection_error_marks_handle_errored() {
        let mut stream = stream_of(vec![
            Ok("data: before\n\n"),
            Err(StreamError::Connection("reset".into())),
        ]);

        assert_matches!(stream.next_event().await, Some(Ok(LogFeedEvent::Line(_))));
        assert_matches!(
            stream.next_event().await,
            Some(Err(StreamError::Connection(_)))
        );
        assert_eq!(stream.connection_state(), ConnectionState::Errored);

        // The error is reported exactly once.
        assert!(stream.next_event().await.is_none());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let mut stream = stream_of(vec![Ok("data: never read\n\n")]);
        stream.close();
        assert_eq!(stream.connection_state(), ConnectionState::Closed);
        stream.close();
        assert_eq!(stream.connection_state(), ConnectionState::Closed);

        assert!(stream.next_event().await.is_none());
    }

    #[tokio::test]
    async fn event_split_across_body_chunks() {
        let mut stream = stream_of(vec![Ok("data: spl"), Ok("it\n"), Ok("\n")]);
        assert_matches!(
            stream.next_event().await,
            Some(Ok(LogFeedEvent::Line(l))) if l == "split"
        );
    }
}
