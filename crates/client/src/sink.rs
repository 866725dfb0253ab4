//! Presentation seams.
//!
//! The control layer never touches the display directly; frontends
//! hand in these sinks at construction time and the controller and
//! consumer call through them. This keeps every display element
//! single-writer: the loader belongs to the controller, the log view
//! to the consumer.

/// Busy-indicator, notifications, and the results view.
pub trait StatusSink: Send + Sync {
    /// Show or hide the loader. Called by the lifecycle controller
    /// only, and strictly as a function of run status.
    fn set_loader_visible(&self, visible: bool);

    /// Surface a non-blocking error notification.
    fn notify_error(&self, message: &str);

    /// Surface a non-blocking informational notification.
    fn notify_info(&self, message: &str);

    /// Present the results view for a completed run. `location` is the
    /// server-provided results URL when one was returned.
    fn show_results(&self, location: Option<&str>);
}

/// Append-only log display.
pub trait LogSink: Send + Sync {
    /// Append one log line (which may contain embedded newlines) and
    /// keep the view pinned to the latest line.
    fn append(&self, line: &str);
}
