//! Transform stages for the batch conversion pipeline.
//!
//! Each submodule implements exactly one kind of transform. Keeping stages
//! separate makes each independently testable and lets one be swapped for a
//! real codec later without touching the others.
//!
//! ## Dispatch
//!
//! ```text
//! item ──▶ select ──▶ reduce     (pdf self-format size reduction)
//!                 ├─▶ raster     (image category, image/* source)
//!                 ├─▶ markdown   (document/text, md source → html target)
//!                 ├─▶ data       (document/text, everything else)
//!                 └─▶ simulate   (no matching transform)
//! ```
//!
//! Selection is a pure function over `(category, MIME, extension, target)`
//! returning an explicit [`TransformKind`], so the rule stays exhaustive
//! and testable independent of any UI framework.

pub mod data;
pub mod markdown;
pub mod raster;
pub mod reduce;
pub mod simulate;

use crate::catalog::ToolCategory;

/// The transform chosen for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// Metadata scrub plus truncation-based size reduction ([`reduce`]).
    SizeReduction,
    /// Decode and re-encode a raster image ([`raster`]).
    Raster,
    /// Markdown source rendered to HTML ([`markdown`]).
    Markdown,
    /// Structured-data format conversion or pass-through ([`data`]).
    StructuredData,
    /// Synthetic progress with a pass-through result ([`simulate`]).
    Simulated,
}

/// Pick the transform for an item, in priority order:
///
/// 1. a pdf-category tool targeting `pdf` runs the size reducer;
/// 2. an image-category tool with an `image/*` source re-encodes;
/// 3. document/text categories run the structured-data transcoder, with
///    Markdown sources routed to the HTML renderer when the target is
///    `html`;
/// 4. everything else falls back to the progress simulator.
pub fn select(
    category: ToolCategory,
    source_mime: &str,
    source_extension: &str,
    target_format: &str,
) -> TransformKind {
    if category == ToolCategory::Pdf && target_format.eq_ignore_ascii_case("pdf") {
        return TransformKind::SizeReduction;
    }
    if category == ToolCategory::Image && source_mime.starts_with("image/") {
        return TransformKind::Raster;
    }
    if matches!(category, ToolCategory::Document | ToolCategory::Text) {
        if source_extension.eq_ignore_ascii_case("md") && target_format.eq_ignore_ascii_case("html")
        {
            return TransformKind::Markdown;
        }
        return TransformKind::StructuredData;
    }
    TransformKind::Simulated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_self_format_takes_priority() {
        assert_eq!(
            select(ToolCategory::Pdf, "application/pdf", "pdf", "pdf"),
            TransformKind::SizeReduction
        );
        // Other targets on the pdf tool are not a size reduction.
        assert_eq!(
            select(ToolCategory::Pdf, "application/pdf", "pdf", "docx"),
            TransformKind::Simulated
        );
    }

    #[test]
    fn image_category_requires_image_mime() {
        assert_eq!(
            select(ToolCategory::Image, "image/png", "png", "jpg"),
            TransformKind::Raster
        );
        assert_eq!(
            select(ToolCategory::Image, "application/octet-stream", "png", "jpg"),
            TransformKind::Simulated
        );
    }

    #[test]
    fn markdown_routes_only_md_to_html() {
        assert_eq!(
            select(ToolCategory::Document, "text/markdown", "md", "html"),
            TransformKind::Markdown
        );
        assert_eq!(
            select(ToolCategory::Document, "text/markdown", "md", "pdf"),
            TransformKind::StructuredData
        );
        assert_eq!(
            select(ToolCategory::Text, "application/json", "json", "csv"),
            TransformKind::StructuredData
        );
    }

    #[test]
    fn unmatched_categories_fall_back_to_simulation() {
        assert_eq!(
            select(ToolCategory::Video, "video/mp4", "mp4", "webm"),
            TransformKind::Simulated
        );
        assert_eq!(
            select(ToolCategory::Audio, "audio/mpeg", "mp3", "wav"),
            TransformKind::Simulated
        );
    }
}
