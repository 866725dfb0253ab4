//! Terminal presentation for the control layer.
//!
//! Sink implementations that map display updates onto a terminal, and
//! the glue that binds command-line file arguments into an
//! [`UploadPayload`].

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;

use intake_client::sink::{LogSink, StatusSink};
use intake_core::payload::{UploadFile, UploadPayload};

/// Form field names the service expects for its two inputs.
pub const FORM_DATA_FIELD: &str = "form_data_file";
pub const LOCAL_DB_FIELD: &str = "local_db_file";

/// Status display on stderr, so log output on stdout stays clean.
#[derive(Default)]
pub struct TerminalStatus {
    busy: AtomicBool,
}

impl TerminalStatus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusSink for TerminalStatus {
    fn set_loader_visible(&self, visible: bool) {
        // Only announce edges; the controller re-asserts visibility on
        // every transition.
        let was = self.busy.swap(visible, Ordering::SeqCst);
        if visible && !was {
            eprintln!("processing...");
        }
    }

    fn notify_error(&self, message: &str) {
        eprintln!("error: {message}");
    }

    fn notify_info(&self, message: &str) {
        eprintln!("{message}");
    }

    fn show_results(&self, location: Option<&str>) {
        match location {
            Some(url) => eprintln!("done. results at {url}"),
            None => eprintln!("done."),
        }
    }
}

/// Log lines go to stdout; the terminal's own scrollback is the
/// pinned-to-latest display.
pub struct StdoutLog;

impl LogSink for StdoutLog {
    fn append(&self, line: &str) {
        println!("{line}");
    }
}

/// Bind the optional input files into a payload.
///
/// Either input may be absent; the service falls back to its remote
/// source when the form data workbook is missing.
pub fn build_payload(
    form_data: Option<&Path>,
    local_db: Option<&Path>,
) -> anyhow::Result<UploadPayload> {
    let mut payload = UploadPayload::new();
    if let Some(path) = form_data {
        payload.bind_file(read_upload(FORM_DATA_FIELD, path)?);
    }
    if let Some(path) = local_db {
        payload.bind_file(read_upload(LOCAL_DB_FIELD, path)?);
    }
    Ok(payload)
}

fn read_upload(field: &str, path: &Path) -> anyhow::Result<UploadFile> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| field.to_string());
    Ok(UploadFile::new(field, file_name, bytes))
}
