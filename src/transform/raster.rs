//! Raster re-encoding: decode a source image and encode it to the target
//! format at a given quality, optionally resizing.
//!
//! Decode and encode are CPU-bound, so the work runs under
//! `tokio::task::spawn_blocking` to keep the async workers free while a
//! large image is processed.
//!
//! Scaling is a single uniform stretch to the requested bounds, not an
//! aspect-preserving crop. No colour-space or EXIF handling.

use crate::error::ItemError;
use crate::item::Artifact;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ImageFormat;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Re-encode `bytes` to `target_format`.
///
/// `quality` is in `(0, 1]` and applies to lossy targets. When `resize` is
/// given the output surface is exactly `width x height`; otherwise the
/// source's native dimensions are kept. The `jpg` target maps to the
/// `jpeg` MIME alias.
///
/// # Errors
/// * [`ItemError::Decode`] - the source bytes are not a readable image
/// * [`ItemError::Encode`] - the target format is unsupported or failed
/// * [`ItemError::ResourceUnavailable`] - no worker could run the encode
pub async fn reencode(
    bytes: Arc<[u8]>,
    target_format: &str,
    quality: f32,
    resize: Option<(u32, u32)>,
) -> Result<Artifact, ItemError> {
    let target = target_format.to_ascii_lowercase();
    tokio::task::spawn_blocking(move || reencode_blocking(&bytes, &target, quality, resize))
        .await
        .map_err(|e| ItemError::ResourceUnavailable {
            detail: format!("encoder worker failed: {e}"),
        })?
}

fn reencode_blocking(
    bytes: &[u8],
    target: &str,
    quality: f32,
    resize: Option<(u32, u32)>,
) -> Result<Artifact, ItemError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| ItemError::Decode {
        detail: e.to_string(),
    })?;
    debug!(
        "Decoded {}x{} source for '{}' target",
        decoded.width(),
        decoded.height(),
        target
    );

    let surface = match resize {
        Some((width, height)) => decoded.resize_exact(width, height, FilterType::Triangle),
        None => decoded,
    };

    let (format, mime) = output_format(target)?;
    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel; flatten before encoding.
            let q = (quality.clamp(0.0, 1.0) * 100.0).round() as u8;
            let mut cursor = Cursor::new(&mut buf);
            let encoder = JpegEncoder::new_with_quality(&mut cursor, q);
            surface
                .to_rgb8()
                .write_with_encoder(encoder)
                .map_err(|e| encode_error(target, e))?;
        }
        _ => {
            surface
                .write_to(&mut Cursor::new(&mut buf), format)
                .map_err(|e| encode_error(target, e))?;
        }
    }
    debug!("Encoded {} bytes of {}", buf.len(), mime);
    Ok(Artifact::new(buf, mime))
}

fn encode_error(target: &str, e: image::ImageError) -> ItemError {
    ItemError::Encode {
        format: target.to_string(),
        detail: e.to_string(),
    }
}

/// Map a target extension to an encoder and MIME type.
fn output_format(target: &str) -> Result<(ImageFormat, String), ItemError> {
    let (format, alias) = match target {
        "jpg" | "jpeg" => (ImageFormat::Jpeg, "jpeg"),
        "png" => (ImageFormat::Png, "png"),
        "webp" => (ImageFormat::WebP, "webp"),
        "bmp" => (ImageFormat::Bmp, "bmp"),
        "gif" => (ImageFormat::Gif, "gif"),
        "tif" | "tiff" => (ImageFormat::Tiff, "tiff"),
        other => {
            return Err(ItemError::Encode {
                format: other.to_string(),
                detail: "no encoder for this format".to_string(),
            })
        }
    };
    Ok((format, format!("image/{alias}")))
}
