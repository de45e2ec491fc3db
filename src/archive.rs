//! Archive packaging: bundle completed artifacts into one zip.
//!
//! At most one packaging operation may be active at a time; the busy gate
//! is the only process-wide shared resource in this crate. A failure while
//! collecting any single artifact fails the whole operation once rather
//! than producing a silently incomplete archive, and leaves item statuses
//! untouched so the caller can retry.

use crate::error::ConvertError;
use crate::item::{Artifact, ItemStatus, ProcessingItem};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Builds download archives from completed items.
///
/// Cheap to construct; hold one per session (or per process) so concurrent
/// packaging attempts contend on the same gate.
#[derive(Default)]
pub struct ArchivePackager {
    busy: AtomicBool,
}

impl ArchivePackager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a packaging operation is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Bundle every completed item's artifact into one deflate-compressed
    /// zip, one entry per item named `<output_label or "converted">.<target>`.
    ///
    /// # Errors
    /// * [`ConvertError::PackagingBusy`] - another packaging is in flight
    /// * [`ConvertError::Packaging`] - an artifact could not be collected
    /// * [`ConvertError::Archive`] - the zip writer failed
    pub async fn package_all(&self, items: &[ProcessingItem]) -> Result<Vec<u8>, ConvertError> {
        let _gate = self.acquire()?;

        let mut entries: Vec<(String, Artifact)> = Vec::new();
        for item in items.iter().filter(|i| i.status() == ItemStatus::Completed) {
            let artifact = item.result().cloned().ok_or_else(|| ConvertError::Packaging {
                detail: format!("no artifact for completed item {}", item.id()),
            })?;
            entries.push((item.suggested_filename(), artifact));
        }
        info!("Packaging {} artifacts", entries.len());

        let bytes = tokio::task::spawn_blocking(move || build_zip(&entries))
            .await
            .map_err(|e| ConvertError::Internal(format!("packaging worker failed: {e}")))??;
        debug!("Archive built: {} bytes", bytes.len());
        Ok(bytes)
    }

    /// Suggested archive filename, qualified with the current Unix
    /// timestamp in milliseconds.
    pub fn default_archive_name() -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        format!("converted_files_{millis}.zip")
    }

    /// Claim the busy gate, failing when packaging is already in flight.
    fn acquire(&self) -> Result<BusyGate<'_>, ConvertError> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ConvertError::PackagingBusy)?;
        Ok(BusyGate { flag: &self.busy })
    }
}

/// Releases the busy flag on drop, including on early error returns.
struct BusyGate<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGate<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

fn build_zip(entries: &[(String, Artifact)]) -> Result<Vec<u8>, ConvertError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, artifact) in entries {
        writer.start_file(name.as_str(), options)?;
        writer
            .write_all(artifact.as_bytes())
            .map_err(|e| ConvertError::Packaging {
                detail: format!("writing '{name}': {e}"),
            })?;
    }
    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_gate_is_exclusive_and_released_on_drop() {
        let packager = ArchivePackager::new();
        assert!(!packager.is_busy());

        let gate = packager.acquire().unwrap();
        assert!(packager.is_busy());
        assert!(matches!(
            packager.acquire().map(|_| ()),
            Err(ConvertError::PackagingBusy)
        ));

        drop(gate);
        assert!(!packager.is_busy());
        assert!(packager.acquire().is_ok());
    }

    #[tokio::test]
    async fn second_request_while_busy_is_rejected() {
        let packager = ArchivePackager::new();
        let gate = packager.acquire().unwrap();
        let err = packager.package_all(&[]).await.unwrap_err();
        assert!(matches!(err, ConvertError::PackagingBusy));
        drop(gate);
        // Retry after release succeeds.
        assert!(packager.package_all(&[]).await.is_ok());
    }

    #[tokio::test]
    async fn empty_item_set_builds_an_empty_archive() {
        let packager = ArchivePackager::new();
        let bytes = packager.package_all(&[]).await.unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
        assert!(!packager.is_busy());
    }

    #[test]
    fn default_archive_name_is_timestamped() {
        let name = ArchivePackager::default_archive_name();
        assert!(name.starts_with("converted_files_"));
        assert!(name.ends_with(".zip"));
    }
}
