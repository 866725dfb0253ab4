//! Upload payloads bound to a submission.

/// One named file part of a multipart submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Form field name the server expects (e.g. `form_data_file`).
    pub field: String,
    /// Original file name, forwarded in the multipart part.
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// The set of files bound to one submission.
///
/// A drop-style selection replaces the current selection wholesale;
/// individual form fields are bound one at a time.
#[derive(Debug, Clone, Default)]
pub struct UploadPayload {
    files: Vec<UploadFile>,
}

impl UploadPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a single file to its form field, keeping the rest of the
    /// selection.
    ///
    /// Re-binding an already-bound field replaces that field's file.
    pub fn bind_file(&mut self, file: UploadFile) {
        self.files.retain(|f| f.field != file.field);
        self.files.push(file);
    }

    /// Replace the entire current selection with `files`.
    ///
    /// This is the drop-event contract: a drop replaces, never appends
    /// to, whatever was previously selected.
    pub fn replace_files(&mut self, files: Vec<UploadFile>) {
        self.files = files;
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(field: &str, name: &str) -> UploadFile {
        UploadFile::new(field, name, name.as_bytes().to_vec())
    }

    #[test]
    fn bind_file_keeps_other_fields() {
        let mut payload = UploadPayload::new();
        payload.bind_file(file("form_data_file", "a.xlsx"));
        payload.bind_file(file("local_db_file", "b.xlsx"));
        assert_eq!(payload.files().len(), 2);
    }

    #[test]
    fn rebinding_a_field_replaces_its_file() {
        let mut payload = UploadPayload::new();
        payload.bind_file(file("form_data_file", "old.xlsx"));
        payload.bind_file(file("form_data_file", "new.xlsx"));
        assert_eq!(payload.files().len(), 1);
        assert_eq!(payload.files()[0].file_name, "new.xlsx");
    }

    #[test]
    fn replace_files_discards_prior_selection() {
        let mut payload = UploadPayload::new();
        payload.bind_file(file("form_data_file", "old.xlsx"));

        payload.replace_files(vec![
            file("form_data_file", "one.xlsx"),
            file("local_db_file", "two.xlsx"),
        ]);

        let names: Vec<&str> = payload
            .files()
            .iter()
            .map(|f| f.file_name.as_str())
            .collect();
        assert_eq!(names, vec!["one.xlsx", "two.xlsx"]);
    }

    #[test]
    fn replace_with_empty_clears_selection() {
        let mut payload = UploadPayload::new();
        payload.bind_file(file("form_data_file", "a.xlsx"));
        payload.replace_files(Vec::new());
        assert!(payload.is_empty());
    }
}
