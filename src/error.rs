//! Error types for the fileforge library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] is **session-level**: an operation on the batch itself
//!   could not proceed (wrong session state, bad configuration, packaging
//!   conflict). Returned as `Err(ConvertError)` from [`crate::session`] and
//!   [`crate::archive`] entry points.
//!
//! * [`ItemError`] is **per-item**: a single file's transform failed
//!   (undecodable source, unsupported target encoding) but all other items
//!   in the batch are fine. Recorded on the owning
//!   [`crate::item::ProcessingItem`] so callers can inspect partial success
//!   rather than losing the whole batch to one bad file.
//!
//! No error in this crate is fatal to the process; the worst outcome is a
//! batch with some items in the error state, fully inspectable and
//! resettable by the caller.

use crate::item::ItemId;
use thiserror::Error;

/// All session-level errors returned by the fileforge library.
///
/// Per-item transform failures use [`ItemError`] and are recorded on the
/// item rather than propagated here.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Session state errors ──────────────────────────────────────────────
    /// The requested operation is not valid in the session's current state.
    #[error("Cannot {action} while the session is {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    /// No item with the given id exists in the session.
    #[error("No item with id {id} in this session")]
    UnknownItem { id: ItemId },

    /// The item exists but is past the point where it may be removed.
    #[error("Item {id} is no longer pending and cannot be removed")]
    ItemNotRemovable { id: ItemId },

    /// The requested target format is not offered by the active tool.
    #[error("Target format '{format}' is not supported by tool '{tool}'")]
    UnsupportedTarget { format: String, tool: String },

    // ── Packaging errors ──────────────────────────────────────────────────
    /// A packaging operation is already in flight; at most one archive may
    /// be built at a time.
    #[error("An archive is already being built; retry once it completes")]
    PackagingBusy,

    /// Building the archive failed. Item statuses are untouched and the
    /// operation may be retried.
    #[error("Archive packaging failed: {detail}")]
    Packaging { detail: String },

    /// The zip writer reported an error.
    #[error("Archive packaging failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single item's transform.
///
/// Stored on the owning [`crate::item::ProcessingItem`] when its transform
/// fails. The overall batch always runs to completion regardless of how
/// many items fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ItemError {
    /// The source bytes could not be read as their claimed type.
    #[error("Source could not be decoded: {detail}")]
    Decode { detail: String },

    /// Structured-data input was malformed for its declared source format.
    #[error("Malformed {format} input: {detail}")]
    Parse { format: String, detail: String },

    /// The target surface or format is unsupported or failed to encode.
    #[error("Could not encode to '{format}': {detail}")]
    Encode { format: String, detail: String },

    /// A worker or drawing surface could not be allocated for the transform.
    #[error("Conversion resources unavailable: {detail}")]
    ResourceUnavailable { detail: String },
}
