//! Partial-download artifact cleanup.
//!
//! Cancelling a request asks a cleaner to discard whatever partial state
//! the transfer left behind. Discarding is background and best-effort:
//! failures are logged, never surfaced to the request's listeners, and
//! discarding for a request that never wrote anything is a no-op.

use std::path::{Path, PathBuf};

use crate::types::DownloadId;

/// In-progress transfers write next to the final path with this suffix.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(".part");
    PathBuf::from(o)
}

/// Discards partial-download artifacts for a cancelled request.
pub trait ArtifactCleaner: Send + Sync {
    fn discard(&self, temp_path: &Path, id: DownloadId);
}

/// Deletes the `.part` file on a background thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct TempFileCleaner;

impl ArtifactCleaner for TempFileCleaner {
    fn discard(&self, temp_path: &Path, id: DownloadId) {
        let path = temp_path.to_path_buf();
        std::thread::spawn(move || match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(id, path = %path.display(), "discarded partial download")
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::debug!(id, path = %path.display(), "discard failed: {}", e),
        });
    }
}
