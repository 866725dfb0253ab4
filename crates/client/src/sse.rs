//! `text/event-stream` framing for the log feed.
//!
//! The service pushes log lines as server-sent events: `data:` lines
//! accumulate into one event, a blank line dispatches it, and the
//! optional `event:` field names the event type. This module turns raw
//! byte chunks into typed [`LogFeedEvent`]s, tolerating chunk
//! boundaries that fall anywhere, including inside a UTF-8 sequence.

/// One decoded event from the log feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFeedEvent {
    /// A log line (default `message` event). May contain embedded
    /// newlines when the event carried multiple `data:` lines; it is
    /// appended to the display verbatim.
    Line(String),
    /// Terminal success signal (`event: done`).
    Completed,
    /// Terminal failure signal (`event: error`) with a reason.
    Failed(String),
}

/// Incremental server-sent-event parser.
///
/// Feed arbitrary chunks via [`push`](Self::push); complete events are
/// returned in arrival order. State held across calls: the unfinished
/// tail line plus the event name and data lines of the event currently
/// being assembled. An event left unterminated at end of stream is
/// discarded, per the SSE processing model.
#[derive(Debug, Default)]
pub struct SseParser {
    /// Bytes of the current, not-yet-terminated line.
    tail: Vec<u8>,
    event_name: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one chunk of the response body and return every event
    /// completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<LogFeedEvent> {
        let mut events = Vec::new();

        for &byte in chunk {
            if byte != b'\n' {
                self.tail.push(byte);
                continue;
            }

            let mut line = std::mem::take(&mut self.tail);
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let text = String::from_utf8_lossy(&line).into_owned();
            if let Some(event) = self.process_line(&text) {
                events.push(event);
            }
        }

        events
    }

    /// Handle one complete line; a blank line dispatches the pending
    /// event.
    fn process_line(&mut self, line: &str) -> Option<LogFeedEvent> {
        if line.is_empty() {
            return self.dispatch();
        }

        if let Some(comment) = line.strip_prefix(':') {
            tracing::trace!(comment, "Log feed comment");
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event_name = Some(value.to_string()),
            "id" | "retry" => {
                // Last-event-id resumption and retry hints are server
                // reconnection machinery; this client never reconnects
                // on its own.
                tracing::trace!(field, value, "Ignoring log feed field");
            }
            other => {
                tracing::debug!(field = other, "Unknown log feed field");
            }
        }

        None
    }

    /// Build the pending event, if any, and reset the assembly state.
    ///
    /// Multi-line `data:` payloads are joined with `\n`. A default
    /// event without any `data:` line dispatches nothing, but an empty
    /// `data:` line still dispatches an empty line; the terminal
    /// `done` and `error` events dispatch even when the server sent no
    /// data line.
    fn dispatch(&mut self) -> Option<LogFeedEvent> {
        let name = self.event_name.take();
        let lines = std::mem::take(&mut self.data);
        let saw_data = !lines.is_empty();
        let data = lines.join("\n");

        match name.as_deref() {
            None | Some("message") => saw_data.then(|| LogFeedEvent::Line(data)),
            Some("done") => Some(LogFeedEvent::Completed),
            Some("error") => {
                let reason = if data.is_empty() {
                    "job failed".to_string()
                } else {
                    data
                };
                Some(LogFeedEvent::Failed(reason))
            }
            Some(unknown) => {
                tracing::debug!(event = unknown, "Ignoring unknown log feed event");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(chunks: &[&str]) -> Vec<LogFeedEvent> {
        let mut parser = SseParser::new();
        chunks
            .iter()
            .flat_map(|c| parser.push(c.as_bytes()))
            .collect()
    }

    #[test]
    fn single_data_event() {
        let events = parse_all(&["data: Step 1\n\n"]);
        assert_eq!(events, vec![LogFeedEvent::Line("Step 1".into())]);
    }

    #[test]
    fn events_arrive_in_order() {
        let events = parse_all(&["data: Step 1\n\ndata: Step 2\n\n"]);
        assert_eq!(
            events,
            vec![
                LogFeedEvent::Line("Step 1".into()),
                LogFeedEvent::Line("Step 2".into()),
            ]
        );
    }

    #[test]
    fn event_split_across_chunks() {
        let events = parse_all(&["data: Ste", "p 1\n", "\n"]);
        assert_eq!(events, vec![LogFeedEvent::Line("Step 1".into())]);
    }

    #[test]
    fn chunk_boundary_inside_utf8_sequence() {
        let bytes = "data: señal\n\n".as_bytes();
        let (a, b) = bytes.split_at(9); // splits the two-byte 'ñ'
        let mut parser = SseParser::new();
        let mut events = parser.push(a);
        events.extend(parser.push(b));
        assert_eq!(events, vec![LogFeedEvent::Line("señal".into())]);
    }

    #[test]
    fn multi_line_data_joined_with_newline() {
        let events = parse_all(&["data: first\ndata: second\n\n"]);
        assert_eq!(events, vec![LogFeedEvent::Line("first\nsecond".into())]);
    }

    #[test]
    fn crlf_line_endings_tolerated() {
        let events = parse_all(&["data: Step 1\r\n\r\n"]);
        assert_eq!(events, vec![LogFeedEvent::Line("Step 1".into())]);
    }

    #[test]
    fn data_without_leading_space() {
        let events = parse_all(&["data:tight\n\n"]);
        assert_eq!(events, vec![LogFeedEvent::Line("tight".into())]);
    }

    #[test]
    fn comments_are_skipped() {
        let events = parse_all(&[": keep-alive\n\ndata: real\n\n"]);
        assert_eq!(events, vec![LogFeedEvent::Line("real".into())]);
    }

    #[test]
    fn id_and_retry_fields_ignored() {
        let events = parse_all(&["id: 7\nretry: 1000\ndata: line\n\n"]);
        assert_eq!(events, vec![LogFeedEvent::Line("line".into())]);
    }

    #[test]
    fn done_event_is_terminal_success() {
        let events = parse_all(&["data: last\n\nevent: done\ndata: done\n\n"]);
        assert_eq!(
            events,
            vec![LogFeedEvent::Line("last".into()), LogFeedEvent::Completed]
        );
    }

    #[test]
    fn done_event_without_data_still_dispatches() {
        let events = parse_all(&["event: done\n\n"]);
        assert_eq!(events, vec![LogFeedEvent::Completed]);
    }

    #[test]
    fn error_event_carries_reason() {
        let events = parse_all(&["event: error\ndata: step 3 exploded\n\n"]);
        assert_eq!(events, vec![LogFeedEvent::Failed("step 3 exploded".into())]);
    }

    #[test]
    fn error_event_without_data_gets_default_reason() {
        let events = parse_all(&["event: error\n\n"]);
        assert_eq!(events, vec![LogFeedEvent::Failed("job failed".into())]);
    }

    #[test]
    fn unknown_event_names_are_skipped() {
        let events = parse_all(&["event: heartbeat\ndata: x\n\ndata: real\n\n"]);
        assert_eq!(events, vec![LogFeedEvent::Line("real".into())]);
    }

    #[test]
    fn empty_default_event_dispatches_nothing() {
        let events = parse_all(&["\n\n\n"]);
        assert!(events.is_empty());
    }

    #[test]
    fn empty_data_line_dispatches_an_empty_line() {
        let events = parse_all(&["data:\n\n"]);
        assert_eq!(events, vec![LogFeedEvent::Line(String::new())]);
    }

    #[test]
    fn blank_line_between_log_lines_survives_verbatim() {
        let events = parse_all(&["data: above\n\ndata:\n\ndata: below\n\n"]);
        assert_eq!(
            events,
            vec![
                LogFeedEvent::Line("above".into()),
                LogFeedEvent::Line(String::new()),
                LogFeedEvent::Line("below".into()),
            ]
        );
    }

    #[test]
    fn unterminated_event_is_not_dispatched() {
        let mut parser = SseParser::new();
        let events = parser.push(b"data: half-finished");
        assert!(events.is_empty());
    }
}
