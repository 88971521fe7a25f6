//! Deterministic download identity.
//!
//! Two requests for the same (url, destination dir, file name) are the same
//! logical download and must deduplicate in the queue, so the id is a pure
//! function of those three inputs and stable across processes.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::types::DownloadId;

/// Derives the download id for (url, dir_path, file_name).
///
/// The inputs are hashed with a separator so that shifting characters
/// between fields cannot produce the same id.
pub fn download_id(url: &str, dir_path: &Path, file_name: &str) -> DownloadId {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update([0x1f]);
    hasher.update(dir_path.to_string_lossy().as_bytes());
    hasher.update([0x1f]);
    hasher.update(file_name.as_bytes());
    let digest = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_id() {
        let a = download_id("http://host/f.bin", Path::new("/tmp"), "f.bin");
        let b = download_id("http://host/f.bin", Path::new("/tmp"), "f.bin");
        assert_eq!(a, b);
    }

    #[test]
    fn any_input_changes_the_id() {
        let base = download_id("http://host/f.bin", Path::new("/tmp"), "f.bin");
        assert_ne!(
            base,
            download_id("http://host/g.bin", Path::new("/tmp"), "f.bin")
        );
        assert_ne!(
            base,
            download_id("http://host/f.bin", Path::new("/var"), "f.bin")
        );
        assert_ne!(
            base,
            download_id("http://host/f.bin", Path::new("/tmp"), "g.bin")
        );
    }

    #[test]
    fn field_boundaries_are_not_ambiguous() {
        let a = download_id("http://host/ab", Path::new("c"), "d");
        let b = download_id("http://host/a", Path::new("bc"), "d");
        assert_ne!(a, b);
    }
}
