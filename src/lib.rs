//! # fileforge
//!
//! A client-side file-conversion engine: the batch pipeline behind a
//! catalog of converter tools (image, PDF, document, audio, video, data).
//! Everything runs in-process against in-memory file handles supplied by
//! the host; there are no network round-trips and no persisted state.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Intake    assign ids, derive labels, capture raster previews
//!  ├─ 2. Select    (category, MIME, extension, target) → TransformKind
//!  ├─ 3. Convert   one concurrent task per item:
//!  │                 reduce | raster | data | markdown | simulate
//!  ├─ 4. Resolve   per-item completed/error, progress events to the host
//!  └─ 5. Package   optional: bundle completed artifacts into one zip
//! ```
//!
//! Per-item failures are isolated: one undecodable file ends up in the
//! error state with its message recorded, while its siblings convert and
//! the session still completes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fileforge::{BatchSession, FileUpload, SessionConfig, ToolCategory, ToolDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tool = ToolDescriptor::new(
//!         "data-converter",
//!         ToolCategory::Text,
//!         ["json", "xml", "csv", "txt"],
//!         ["json", "csv", "txt"],
//!     );
//!     let mut session = BatchSession::new(tool, SessionConfig::default());
//!     session.add_files(vec![FileUpload::new(
//!         "users.json",
//!         "application/json",
//!         br#"[{"name":"ada"}]"#.to_vec(),
//!     )])?;
//!     session.set_target_format("csv")?;
//!     session.convert_all().await?;
//!
//!     for item in session.items() {
//!         if let Some(artifact) = item.result() {
//!             println!("{}: {} bytes", item.suggested_filename(), artifact.len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Honest fidelity
//!
//! Only the structured-data, Markdown, raster, and size-reduction paths do
//! real work. Every other (category, MIME) pairing runs a progress
//! simulator that resolves to the unmodified source bytes. The
//! size-reduction path applies a deterministic estimate formula and then
//! truncates, which does not preserve document validity. These contracts
//! are part of the public behaviour; swap in real codecs behind
//! [`transform::TransformKind`] without changing them silently.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod archive;
pub mod catalog;
pub mod config;
pub mod error;
pub mod item;
pub mod progress;
pub mod session;
pub mod transform;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use archive::ArchivePackager;
pub use catalog::{ToolCategory, ToolDescriptor};
pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{ConvertError, ItemError};
pub use item::{Artifact, FileUpload, ItemId, ItemStatus, ProcessingItem};
pub use progress::{ConversionProgress, ItemEvent, ItemEventStream, NoopProgress, ProgressHandle};
pub use session::{BatchSession, SessionState};
pub use transform::TransformKind;
