//! Batch conversion sessions.
//!
//! A [`BatchSession`] owns the lifecycle of one batch of files from upload
//! through conversion to reset:
//!
//! ```text
//! idle ──▶ uploaded ──▶ processing ──▶ completed
//!   ▲                                      │
//!   └────────────── reset ─────────────────┘
//! ```
//!
//! `uploaded → processing` is triggered by a single [`convert_all`] call
//! and is one-way until every item resolves. Each item's transform runs as
//! an independent concurrent task over a snapshot of its inputs; no two
//! in-flight transforms touch shared item state, and the session applies
//! status writes only as each task resolves. One item's failure never
//! aborts or blocks its siblings, and the session reaches `completed` only
//! after all items have resolved one way or the other.
//!
//! [`convert_all`]: BatchSession::convert_all

use crate::catalog::ToolDescriptor;
use crate::config::SessionConfig;
use crate::error::{ConvertError, ItemError};
use crate::item::{Artifact, FileUpload, ItemId, ItemStatus, ProcessingItem};
use crate::progress::{NoopProgress, ProgressHandle};
use crate::transform::{self, data, markdown, raster, reduce, simulate, TransformKind};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle state of a [`BatchSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No files queued.
    Idle,
    /// Files queued, conversion not yet started.
    Uploaded,
    /// Conversion in flight; one-way until every item resolves.
    Processing,
    /// Every item has resolved to completed or error.
    Completed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Uploaded => "uploaded",
            SessionState::Processing => "processing",
            SessionState::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered batch of [`ProcessingItem`]s sharing one target format and
/// one compression-level setting.
pub struct BatchSession {
    tool: ToolDescriptor,
    config: SessionConfig,
    state: SessionState,
    items: Vec<ProcessingItem>,
    next_id: u64,
    target_format: String,
    compression_level: u8,
}

impl BatchSession {
    /// Create an idle session for the given tool.
    ///
    /// The initial target format is the tool's first offered output; the
    /// compression level starts at 50.
    pub fn new(tool: ToolDescriptor, config: SessionConfig) -> Self {
        let target_format = tool.default_output().unwrap_or("txt").to_string();
        info!("New session for tool '{}' ({})", tool.id, tool.category);
        Self {
            tool,
            config,
            state: SessionState::Idle,
            items: Vec::new(),
            next_id: 0,
            target_format,
            compression_level: 50,
        }
    }

    pub fn tool(&self) -> &ToolDescriptor {
        &self.tool
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn target_format(&self) -> &str {
        &self.target_format
    }

    pub fn compression_level(&self) -> u8 {
        self.compression_level
    }

    /// All items in upload order.
    pub fn items(&self) -> &[ProcessingItem] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&ProcessingItem> {
        self.items.iter().find(|i| i.id() == id)
    }

    fn item_mut(&mut self, id: ItemId) -> Option<&mut ProcessingItem> {
        self.items.iter_mut().find(|i| i.id() == id)
    }

    // ── Intake ────────────────────────────────────────────────────────────

    /// Queue uploads as pending items, returning their assigned ids.
    ///
    /// Allowed while `idle` or `uploaded`; moves the session to `uploaded`.
    pub fn add_files(
        &mut self,
        uploads: impl IntoIterator<Item = FileUpload>,
    ) -> Result<Vec<ItemId>, ConvertError> {
        if !matches!(self.state, SessionState::Idle | SessionState::Uploaded) {
            return Err(ConvertError::InvalidState {
                action: "add files",
                state: self.state.as_str(),
            });
        }
        let mut ids = Vec::new();
        for upload in uploads {
            self.next_id += 1;
            let id = ItemId::new(self.next_id);
            debug!(
                "Queued '{}' ({} bytes) as item {}",
                upload.name,
                upload.bytes.len(),
                id
            );
            self.items
                .push(ProcessingItem::new(id, upload, &self.target_format));
            ids.push(id);
        }
        if !self.items.is_empty() {
            self.state = SessionState::Uploaded;
        }
        Ok(ids)
    }

    /// Remove a still-pending item. Removing the last item returns the
    /// session to `idle`.
    pub fn remove_item(&mut self, id: ItemId) -> Result<(), ConvertError> {
        let idx = self
            .items
            .iter()
            .position(|i| i.id() == id)
            .ok_or(ConvertError::UnknownItem { id })?;
        if self.items[idx].status() != ItemStatus::Pending {
            return Err(ConvertError::ItemNotRemovable { id });
        }
        self.items.remove(idx);
        if self.items.is_empty() && self.state == SessionState::Uploaded {
            self.state = SessionState::Idle;
        }
        Ok(())
    }

    /// Change an item's user-facing output label. The underlying artifact
    /// is unaffected.
    pub fn rename_item(
        &mut self,
        id: ItemId,
        label: impl Into<String>,
    ) -> Result<(), ConvertError> {
        self.item_mut(id)
            .ok_or(ConvertError::UnknownItem { id })?
            .set_output_label(label);
        Ok(())
    }

    // ── Batch settings ────────────────────────────────────────────────────

    /// Set the shared target format for the batch.
    ///
    /// Must be one of the tool's offered outputs; allowed until conversion
    /// starts. Already-queued items pick up the new format.
    pub fn set_target_format(&mut self, format: &str) -> Result<(), ConvertError> {
        if !matches!(self.state, SessionState::Idle | SessionState::Uploaded) {
            return Err(ConvertError::InvalidState {
                action: "change the target format",
                state: self.state.as_str(),
            });
        }
        let fmt = format.trim_start_matches('.').to_ascii_lowercase();
        if !self.tool.offers_output(&fmt) {
            return Err(ConvertError::UnsupportedTarget {
                format: fmt,
                tool: self.tool.id.clone(),
            });
        }
        self.target_format = fmt;
        for item in &mut self.items {
            item.set_target_format(&self.target_format);
        }
        Ok(())
    }

    /// Set the compression level for size-reduction batches, clamped to
    /// `[1, 100]`. Allowed until conversion starts.
    pub fn set_compression_level(&mut self, level: u8) -> Result<(), ConvertError> {
        if !matches!(self.state, SessionState::Idle | SessionState::Uploaded) {
            return Err(ConvertError::InvalidState {
                action: "change the compression level",
                state: self.state.as_str(),
            });
        }
        self.compression_level = level.clamp(1, 100);
        Ok(())
    }

    /// Estimated output size for one item at the current compression level.
    pub fn estimated_item_size(&self, id: ItemId) -> Result<u64, ConvertError> {
        let item = self.item(id).ok_or(ConvertError::UnknownItem { id })?;
        Ok(reduce::estimated_size(
            item.source_size(),
            self.compression_level,
        ))
    }

    /// Estimated size reduction at the current compression level, as a
    /// whole percentage.
    pub fn reduction_percent(&self) -> u32 {
        reduce::reduction_percent(self.compression_level)
    }

    // ── Conversion ────────────────────────────────────────────────────────

    /// Convert every queued item concurrently.
    ///
    /// Moves the session `uploaded → processing`, dispatches one transform
    /// task per item, and applies each item's terminal status as its task
    /// resolves. Per-item failures are recorded on the item and never
    /// propagate; the session always finishes in `completed`.
    pub async fn convert_all(&mut self) -> Result<(), ConvertError> {
        if self.state != SessionState::Uploaded {
            return Err(ConvertError::InvalidState {
                action: "convert",
                state: self.state.as_str(),
            });
        }
        self.state = SessionState::Processing;

        let progress: ProgressHandle = self
            .config
            .progress
            .clone()
            .unwrap_or_else(|| Arc::new(NoopProgress));
        let total = self.items.len();
        info!(
            "Converting batch of {} items to '{}'",
            total, self.target_format
        );
        progress.on_batch_start(total);

        let tick = Duration::from_millis(self.config.tick_interval_ms);
        let mut plans = Vec::with_capacity(total);
        for item in &mut self.items {
            item.begin_converting();
            progress.on_item_start(item.id());
            plans.push(TransformPlan {
                id: item.id(),
                kind: transform::select(
                    self.tool.category,
                    item.source_mime(),
                    &item.source_extension(),
                    &self.target_format,
                ),
                source: item.source_bytes(),
                source_mime: item.source_mime().to_string(),
                source_ext: item.source_extension(),
                preview: item.preview().cloned(),
                target: self.target_format.clone(),
                quality: self.config.quality,
                resize: self.config.resize,
                level: self.compression_level,
                tick,
            });
        }

        let mut resolved = stream::iter(plans.into_iter().map(|plan| {
            let progress = Arc::clone(&progress);
            async move {
                let id = plan.id;
                debug!("Dispatching {:?} transform for item {}", plan.kind, id);
                let outcome = run_transform(plan, &progress).await;
                (id, outcome)
            }
        }))
        .buffer_unordered(self.config.concurrency);

        let mut succeeded = 0usize;
        while let Some((id, outcome)) = resolved.next().await {
            match outcome {
                Ok(artifact) => {
                    progress.on_item_progress(id, 100.0);
                    progress.on_item_complete(id, artifact.len());
                    if let Some(item) = self.items.iter_mut().find(|i| i.id() == id) {
                        item.complete(artifact);
                        succeeded += 1;
                    }
                }
                Err(error) => {
                    let message = error.to_string();
                    warn!("Item {} failed: {}", id, message);
                    progress.on_item_error(id, &message);
                    if let Some(item) = self.items.iter_mut().find(|i| i.id() == id) {
                        item.fail(message);
                    }
                }
            }
        }

        self.state = SessionState::Completed;
        info!("Batch complete: {}/{} items converted", succeeded, total);
        progress.on_batch_complete(total, succeeded);
        Ok(())
    }

    // ── Reset ─────────────────────────────────────────────────────────────

    /// Clear all items and return to `idle`, releasing held artifacts.
    ///
    /// Rejected while `processing`: a batch in flight has no cancel.
    pub fn reset(&mut self) -> Result<(), ConvertError> {
        if self.state == SessionState::Processing {
            return Err(ConvertError::InvalidState {
                action: "reset",
                state: self.state.as_str(),
            });
        }
        let released = self.items.len();
        self.items.clear();
        self.state = SessionState::Idle;
        info!("Session reset, released {} items", released);
        Ok(())
    }
}

/// Everything one transform task needs, snapshotted off the item so the
/// task shares no state with the session while in flight.
struct TransformPlan {
    id: ItemId,
    kind: TransformKind,
    source: Arc<[u8]>,
    source_mime: String,
    source_ext: String,
    preview: Option<Artifact>,
    target: String,
    quality: f32,
    resize: Option<(u32, u32)>,
    level: u8,
    tick: Duration,
}

async fn run_transform(
    plan: TransformPlan,
    progress: &ProgressHandle,
) -> Result<Artifact, ItemError> {
    match plan.kind {
        TransformKind::SizeReduction => {
            let reduced = reduce::reduce(&plan.source, plan.level)?;
            Ok(Artifact::new(reduced, "application/pdf"))
        }
        TransformKind::Raster => {
            raster::reencode(plan.source, &plan.target, plan.quality, plan.resize).await
        }
        TransformKind::Markdown => {
            let text = source_text(&plan.source)?;
            Ok(Artifact::new(
                markdown::render_html(text).into_bytes(),
                "text/html",
            ))
        }
        TransformKind::StructuredData => {
            let text = source_text(&plan.source)?;
            let converted = data::transcode(text, &plan.source_ext, &plan.target);
            let mime = if plan.target == "html" {
                "text/html"
            } else {
                "text/plain"
            };
            Ok(Artifact::new(converted.into_bytes(), mime))
        }
        TransformKind::Simulated => {
            let passthrough = plan.preview.unwrap_or_else(|| {
                Artifact::from_shared(Arc::clone(&plan.source), plan.source_mime.clone())
            });
            let id = plan.id;
            let progress = Arc::clone(progress);
            Ok(simulate::run(passthrough, plan.tick, move |p| {
                progress.on_item_progress(id, p)
            })
            .await)
        }
    }
}

fn source_text(bytes: &[u8]) -> Result<&str, ItemError> {
    std::str::from_utf8(bytes).map_err(|e| ItemError::Decode {
        detail: format!("not valid UTF-8: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ToolCategory;

    fn data_tool() -> ToolDescriptor {
        ToolDescriptor::new(
            "data-converter",
            ToolCategory::Text,
            ["json", "xml", "csv", "txt"],
            ["json", "csv", "txt"],
        )
    }

    fn upload(name: &str, mime: &str, bytes: &[u8]) -> FileUpload {
        FileUpload::new(name, mime, bytes.to_vec())
    }

    #[test]
    fn new_session_is_idle_with_default_target() {
        let session = BatchSession::new(data_tool(), SessionConfig::default());
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.target_format(), "json");
        assert_eq!(session.compression_level(), 50);
    }

    #[test]
    fn add_files_moves_to_uploaded_and_assigns_ids() {
        let mut session = BatchSession::new(data_tool(), SessionConfig::default());
        let ids = session
            .add_files(vec![
                upload("a.json", "application/json", b"[]"),
                upload("b.json", "application/json", b"[]"),
            ])
            .unwrap();
        assert_eq!(session.state(), SessionState::Uploaded);
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(session.item(ids[0]).unwrap().output_label(), "a");
    }

    #[test]
    fn removing_last_pending_item_returns_to_idle() {
        let mut session = BatchSession::new(data_tool(), SessionConfig::default());
        let ids = session
            .add_files(vec![upload("a.json", "application/json", b"[]")])
            .unwrap();
        session.remove_item(ids[0]).unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.item(ids[0]).is_none());
    }

    #[test]
    fn target_format_must_be_offered_by_the_tool() {
        let mut session = BatchSession::new(data_tool(), SessionConfig::default());
        assert!(matches!(
            session.set_target_format("docx"),
            Err(ConvertError::UnsupportedTarget { .. })
        ));
        session.set_target_format("CSV").unwrap();
        assert_eq!(session.target_format(), "csv");
    }

    #[test]
    fn compression_level_is_clamped() {
        let mut session = BatchSession::new(data_tool(), SessionConfig::default());
        session.set_compression_level(0).unwrap();
        assert_eq!(session.compression_level(), 1);
        session.set_compression_level(200).unwrap();
        assert_eq!(session.compression_level(), 100);
    }

    #[test]
    fn convert_requires_uploaded_state() {
        let mut session = BatchSession::new(data_tool(), SessionConfig::default());
        let err = futures::executor::block_on(session.convert_all()).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn single_item_batch_converts_and_completes() {
        let mut session = BatchSession::new(data_tool(), SessionConfig::default());
        session.set_target_format("csv").unwrap();
        let ids = session
            .add_files(vec![upload(
                "people.json",
                "application/json",
                br#"[{"name":"ada"}]"#,
            )])
            .unwrap();
        session.convert_all().await.unwrap();

        assert_eq!(session.state(), SessionState::Completed);
        let item = session.item(ids[0]).unwrap();
        assert_eq!(item.status(), ItemStatus::Completed);
        assert_eq!(item.progress(), 100.0);
        let result = item.result().unwrap();
        assert_eq!(result.mime_type(), "text/plain");
        assert_eq!(result.as_bytes(), b"name\n\"ada\"");
        assert_eq!(item.suggested_filename(), "people.csv");
    }
}
