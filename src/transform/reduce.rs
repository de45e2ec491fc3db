//! Size reduction for self-format document compression.
//!
//! One deterministic formula drives both the user-facing estimate and the
//! actual byte transform:
//!
//! ```text
//! factor = 0.95 - (level / 100) * 0.65        level in [1, 100]
//! ```
//!
//! The byte transform blanks the six document-information fields (Title,
//! Author, Subject, Keywords, Producer, Creator) in the raw byte stream,
//! then truncates to `max(1024, floor(len * factor))` bytes. Truncation is
//! a crude size-reduction stand-in: the output is NOT guaranteed to remain
//! a structurally valid document. Swapping in a real compressor must keep
//! the estimate formula observable.

use crate::error::ItemError;
use tracing::debug;

/// Truncation never goes below this many bytes.
pub const MIN_REDUCED_BYTES: usize = 1024;

const INFO_KEYS: [&[u8]; 6] = [
    b"/Title",
    b"/Author",
    b"/Subject",
    b"/Keywords",
    b"/Producer",
    b"/Creator",
];

/// Size factor for a compression level, clamped to `[1, 100]`.
pub fn reduction_factor(level: u8) -> f64 {
    let level = level.clamp(1, 100);
    0.95 - (level as f64 / 100.0) * 0.65
}

/// Estimated output size in bytes for the given original size and level.
pub fn estimated_size(original_size: u64, level: u8) -> u64 {
    (original_size as f64 * reduction_factor(level)).round() as u64
}

/// Estimated reduction as a whole percentage.
pub fn reduction_percent(level: u8) -> u32 {
    ((1.0 - reduction_factor(level)) * 100.0).round() as u32
}

/// Apply the size reduction to a document byte stream.
///
/// # Errors
/// [`ItemError::Decode`] when the bytes do not carry the `%PDF` magic.
pub fn reduce(bytes: &[u8], level: u8) -> Result<Vec<u8>, ItemError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(ItemError::Decode {
            detail: "missing %PDF header".to_string(),
        });
    }

    let scrubbed = scrub_info_fields(bytes);
    let factor = reduction_factor(level);
    let target = ((scrubbed.len() as f64 * factor).floor() as usize)
        .max(MIN_REDUCED_BYTES)
        .min(scrubbed.len());
    debug!(
        "Reducing {} bytes to {} (level {}, factor {:.3})",
        bytes.len(),
        target,
        level,
        factor
    );
    Ok(scrubbed[..target].to_vec())
}

/// Blank the literal-string values of the document-information keys.
///
/// Handles escaped and nested parentheses inside the string value. Values
/// in other encodings (hex strings, indirect references) are left alone.
fn scrub_info_fields(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match info_key_at(bytes, i) {
            Some(key_len) => {
                out.extend_from_slice(&bytes[i..i + key_len]);
                i += key_len;
                // Copy whitespace between the key and its value.
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    out.push(bytes[i]);
                    i += 1;
                }
                if i < bytes.len() && bytes[i] == b'(' {
                    out.push(b'(');
                    i += 1;
                    i = skip_literal_string(bytes, i);
                    out.push(b')');
                    if i < bytes.len() {
                        i += 1; // past the closing paren
                    }
                }
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    out
}

/// Length of an info key starting at `i`, if one starts there.
fn info_key_at(bytes: &[u8], i: usize) -> Option<usize> {
    for key in INFO_KEYS {
        if bytes[i..].starts_with(key) {
            // Reject longer names sharing the prefix (e.g. /Titles).
            let next = bytes.get(i + key.len());
            if !matches!(next, Some(c) if c.is_ascii_alphanumeric()) {
                return Some(key.len());
            }
        }
    }
    None
}

/// Advance past a literal string's content, returning the index of its
/// closing parenthesis (or the end of input when unterminated).
fn skip_literal_string(bytes: &[u8], mut i: usize) -> usize {
    let mut depth = 1usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1, // skip the escaped byte
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_at_midpoint_level() {
        assert!((reduction_factor(50) - 0.625).abs() < 1e-9);
        assert_eq!(estimated_size(1_000_000, 50), 625_000);
        assert_eq!(reduction_percent(50), 38);
    }

    #[test]
    fn level_is_clamped() {
        assert_eq!(reduction_factor(0), reduction_factor(1));
        assert!((reduction_factor(100) - 0.30).abs() < 1e-9);
    }

    fn pdf_of_len(len: usize) -> Vec<u8> {
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.resize(len, b'x');
        bytes
    }

    #[test]
    fn truncation_respects_floor() {
        // Any input shorter than 1024 / 0.30 stays at or above the floor.
        let bytes = pdf_of_len(3000);
        let out = reduce(&bytes, 100).unwrap();
        assert_eq!(out.len(), MIN_REDUCED_BYTES);
    }

    #[test]
    fn inputs_below_floor_come_back_whole() {
        let bytes = pdf_of_len(500);
        let out = reduce(&bytes, 100).unwrap();
        assert_eq!(out.len(), 500);
    }

    #[test]
    fn truncation_applies_factor_above_floor() {
        let bytes = pdf_of_len(100_000);
        let out = reduce(&bytes, 100).unwrap();
        let expected = (100_000f64 * reduction_factor(100)).floor() as usize;
        assert_eq!(out.len(), expected);
        assert!(out.len() > MIN_REDUCED_BYTES);
        assert!(out.len() < 100_000 / 3);
    }

    #[test]
    fn non_pdf_bytes_are_a_decode_error() {
        let err = reduce(b"plain text", 50).unwrap_err();
        assert!(matches!(err, ItemError::Decode { .. }));
    }

    #[test]
    fn info_fields_are_blanked() {
        let src = b"%PDF-1.4 /Title (Annual Report (final)) /Author(Jo \\(ed.\\)) /Count 3";
        let out = scrub_info_fields(src);
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("/Title ()"), "got: {text}");
        assert!(text.contains("/Author()"), "got: {text}");
        assert!(text.contains("/Count 3"), "got: {text}");
        assert!(!text.contains("Annual"));
    }

    #[test]
    fn similar_key_names_are_untouched() {
        let src = b"%PDF /Titles (keep me)";
        let out = scrub_info_fields(src);
        assert_eq!(out.as_slice(), src.as_slice());
    }
}
