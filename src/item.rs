//! Per-file processing records and byte artifacts.
//!
//! A [`ProcessingItem`] tracks one uploaded file through the batch pipeline.
//! Its status, progress, result, and error message are kept consistent by
//! construction: the only ways to reach a terminal state are
//! [`ProcessingItem::complete`] and [`ProcessingItem::fail`], which set the
//! coupled fields together. Holds:
//!
//! * `result` is present exactly when the status is `Completed`;
//! * `error_message` is present exactly when the status is `Error`;
//! * `progress` is pinned to 100 on completion.
//!
//! An [`Artifact`] is the downloadable output of a successful conversion:
//! immutable bytes behind an `Arc`, cheap to clone into archives, previews,
//! and download responses.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Session-unique identifier for a [`ProcessingItem`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Added to the batch, not yet dispatched.
    Pending,
    /// A transform is running for this item.
    Converting,
    /// Transform finished; the result artifact is available.
    Completed,
    /// Transform failed; the error message is recorded.
    Error,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Converting => "converting",
            ItemStatus::Completed => "completed",
            ItemStatus::Error => "error",
        }
    }

    /// Whether the item has resolved to `Completed` or `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Error)
    }
}

/// A raw file handle supplied by the hosting environment: name, MIME type,
/// and the full byte content.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// The byte content produced by a conversion, addressable for download.
///
/// Bytes are shared behind an `Arc` so an artifact can be handed to the
/// archive packager, rendered as a data URI, and kept on the item without
/// copying.
#[derive(Debug, Clone)]
pub struct Artifact {
    bytes: Arc<[u8]>,
    mime_type: String,
}

impl Artifact {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: Arc::from(bytes.into().into_boxed_slice()),
            mime_type: mime_type.into(),
        }
    }

    /// Wrap already-shared bytes without copying.
    pub fn from_shared(bytes: Arc<[u8]>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Render as a `data:` URI for direct embedding in a host page.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// One file undergoing conversion within a batch.
pub struct ProcessingItem {
    id: ItemId,
    source: Arc<[u8]>,
    source_name: String,
    source_mime: String,
    source_size: u64,
    preview: Option<Artifact>,
    status: ItemStatus,
    progress: f32,
    target_format: String,
    output_label: String,
    result: Option<Artifact>,
    error_message: Option<String>,
}

impl ProcessingItem {
    /// Create a pending item from an upload.
    ///
    /// The default output label is the file name minus its final extension
    /// (or the whole name when there is none). Raster sources get a preview
    /// artifact referencing the original bytes.
    pub(crate) fn new(id: ItemId, upload: FileUpload, target_format: &str) -> Self {
        let FileUpload {
            name,
            mime_type,
            bytes,
        } = upload;
        let source: Arc<[u8]> = Arc::from(bytes.into_boxed_slice());
        let output_label = label_stem(&name);
        let preview = mime_type
            .starts_with("image/")
            .then(|| Artifact::from_shared(Arc::clone(&source), mime_type.clone()));
        Self {
            id,
            source_size: source.len() as u64,
            source,
            source_name: name,
            source_mime: mime_type,
            preview,
            status: ItemStatus::Pending,
            progress: 0.0,
            target_format: target_format.to_string(),
            output_label,
            result: None,
            error_message: None,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn source_mime(&self) -> &str {
        &self.source_mime
    }

    pub fn source_size(&self) -> u64 {
        self.source_size
    }

    /// Lower-cased extension of the source file name, empty when absent.
    pub fn source_extension(&self) -> String {
        match self.source_name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => String::new(),
        }
    }

    pub(crate) fn source_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.source)
    }

    /// Preview of the original content; present only for raster sources.
    pub fn preview(&self) -> Option<&Artifact> {
        self.preview.as_ref()
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Conversion progress, 0 to 100.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn target_format(&self) -> &str {
        &self.target_format
    }

    /// User-editable display name, independent of the underlying artifact.
    pub fn output_label(&self) -> &str {
        &self.output_label
    }

    /// Result artifact; present exactly when the status is `Completed`.
    pub fn result(&self) -> Option<&Artifact> {
        self.result.as_ref()
    }

    /// Error message; present exactly when the status is `Error`.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Suggested download filename: `<output_label or "converted">.<target>`.
    pub fn suggested_filename(&self) -> String {
        let label = if self.output_label.is_empty() {
            "converted"
        } else {
            &self.output_label
        };
        format!("{label}.{}", self.target_format)
    }

    pub(crate) fn set_output_label(&mut self, label: impl Into<String>) {
        self.output_label = label.into();
    }

    pub(crate) fn set_target_format(&mut self, format: &str) {
        self.target_format = format.to_string();
    }

    pub(crate) fn begin_converting(&mut self) {
        self.status = ItemStatus::Converting;
    }

    pub(crate) fn set_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 100.0);
    }

    pub(crate) fn complete(&mut self, artifact: Artifact) {
        self.status = ItemStatus::Completed;
        self.progress = 100.0;
        self.result = Some(artifact);
        self.error_message = None;
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.status = ItemStatus::Error;
        self.result = None;
        self.error_message = Some(message.into());
    }
}

impl fmt::Debug for ProcessingItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingItem")
            .field("id", &self.id)
            .field("source_name", &self.source_name)
            .field("source_mime", &self.source_mime)
            .field("source_size", &self.source_size)
            .field("status", &self.status)
            .field("progress", &self.progress)
            .field("target_format", &self.target_format)
            .field("output_label", &self.output_label)
            .field("result", &self.result.as_ref().map(Artifact::len))
            .field("error_message", &self.error_message)
            .finish()
    }
}

/// File name minus its final extension, or the whole name when undotted.
fn label_stem(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, mime: &str) -> FileUpload {
        FileUpload::new(name, mime, b"payload".to_vec())
    }

    #[test]
    fn label_strips_final_extension_only() {
        assert_eq!(label_stem("report.final.pdf"), "report.final");
        assert_eq!(label_stem("README"), "README");
        assert_eq!(label_stem(".bashrc"), ".bashrc");
    }

    #[test]
    fn image_uploads_get_a_preview() {
        let item = ProcessingItem::new(ItemId::new(1), upload("photo.png", "image/png"), "jpg");
        let preview = item.preview().expect("image source should carry a preview");
        assert_eq!(preview.as_bytes(), b"payload");
        assert_eq!(preview.mime_type(), "image/png");

        let doc = ProcessingItem::new(ItemId::new(2), upload("notes.md", "text/markdown"), "html");
        assert!(doc.preview().is_none());
    }

    #[test]
    fn completion_sets_coupled_fields() {
        let mut item = ProcessingItem::new(ItemId::new(1), upload("a.csv", "text/csv"), "json");
        assert_eq!(item.status(), ItemStatus::Pending);
        assert!(item.result().is_none());

        item.begin_converting();
        assert_eq!(item.status(), ItemStatus::Converting);

        item.complete(Artifact::new(b"[]".to_vec(), "application/json"));
        assert_eq!(item.status(), ItemStatus::Completed);
        assert_eq!(item.progress(), 100.0);
        assert!(item.result().is_some());
        assert!(item.error_message().is_none());
    }

    #[test]
    fn failure_sets_coupled_fields() {
        let mut item = ProcessingItem::new(ItemId::new(1), upload("a.json", "application/json"), "csv");
        item.begin_converting();
        item.fail("boom");
        assert_eq!(item.status(), ItemStatus::Error);
        assert!(item.result().is_none());
        assert_eq!(item.error_message(), Some("boom"));
    }

    #[test]
    fn suggested_filename_uses_label_and_target() {
        let mut item = ProcessingItem::new(ItemId::new(1), upload("invoice.xml", "text/xml"), "json");
        assert_eq!(item.suggested_filename(), "invoice.json");
        item.set_output_label("");
        assert_eq!(item.suggested_filename(), "converted.json");
        item.set_output_label("march");
        assert_eq!(item.suggested_filename(), "march.json");
    }

    #[test]
    fn artifact_data_uri() {
        let a = Artifact::new(b"hi".to_vec(), "text/plain");
        assert_eq!(a.to_data_uri(), "data:text/plain;base64,aGk=");
    }
}
