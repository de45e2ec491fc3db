//! Tool descriptors supplied by the hosting catalog.
//!
//! The catalog (menu rendering, routing, marketing copy) lives outside this
//! crate. It hands the core a [`ToolDescriptor`] per converter: an id, a
//! [`ToolCategory`], and the accepted input/output extensions. Descriptors
//! are immutable for the lifetime of the process and read-only here; the
//! core uses them only to drive transform selection and to offer a default
//! target format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The broad family of files a tool operates on.
///
/// Selection of the per-item transform keys on this category together with
/// the source MIME type (see [`crate::transform::select`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Image,
    Pdf,
    Document,
    Audio,
    Video,
    Text,
}

impl ToolCategory {
    /// Lower-case name as used in catalog records and slugs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Image => "image",
            ToolCategory::Pdf => "pdf",
            ToolCategory::Document => "document",
            ToolCategory::Audio => "audio",
            ToolCategory::Video => "video",
            ToolCategory::Text => "text",
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One converter as presented to the user: a category plus the extensions
/// it accepts on each side.
///
/// `output_extensions` is an ordered sequence; the first entry is the
/// default target format for a fresh session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub id: String,
    pub category: ToolCategory,
    pub input_extensions: Vec<String>,
    pub output_extensions: Vec<String>,
}

impl ToolDescriptor {
    /// Build a descriptor, lower-casing all extensions.
    pub fn new<I, O>(id: impl Into<String>, category: ToolCategory, inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        let norm = |it: String| it.trim_start_matches('.').to_ascii_lowercase();
        Self {
            id: id.into(),
            category,
            input_extensions: inputs.into_iter().map(|e| norm(e.into())).collect(),
            output_extensions: outputs.into_iter().map(|e| norm(e.into())).collect(),
        }
    }

    /// Whether the tool accepts files with the given extension.
    pub fn accepts_input(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.input_extensions.iter().any(|e| *e == ext)
    }

    /// Whether the tool can produce the given target format.
    pub fn offers_output(&self, format: &str) -> bool {
        let fmt = format.trim_start_matches('.').to_ascii_lowercase();
        self.output_extensions.iter().any(|e| *e == fmt)
    }

    /// The first offered output extension, if any.
    pub fn default_output(&self) -> Option<&str> {
        self.output_extensions.first().map(String::as_str)
    }
}
