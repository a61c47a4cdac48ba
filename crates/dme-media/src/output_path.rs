//! Collision-free output path allocation.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Pick an output path in `folder` that does not exist yet.
///
/// Tries `base.ext`, then `base (1).ext`, `base (2).ext`, ... and returns
/// the first free slot.
///
/// # Known limitation
///
/// The slot is not reserved. Another process creating the same name
/// between this check and the transcoder opening the file will have its
/// file overwritten, since the transcoder runs with `-y`.
pub fn allocate_output_path(folder: &Path, base_name: &str, ext: &str) -> PathBuf {
    let ext = ext.trim_start_matches('.');
    let candidate = folder.join(format!("{}.{}", base_name, ext));
    if !candidate.exists() {
        return candidate;
    }

    let mut counter: u32 = 1;
    loop {
        let candidate = folder.join(format!("{} ({}).{}", base_name, counter, ext));
        if !candidate.exists() {
            debug!(
                path = %candidate.display(),
                skipped = counter,
                "Output name taken, using numbered suffix"
            );
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_free_name_is_used_as_is() {
        let dir = TempDir::new().unwrap();
        let path = allocate_output_path(dir.path(), "clip_G0.50_S0.020", "mp4");
        assert_eq!(path, dir.path().join("clip_G0.50_S0.020.mp4"));
    }

    #[test]
    fn test_numbered_suffix_after_existing_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("clip.mkv"), b"").unwrap();
        std::fs::write(dir.path().join("clip (1).mkv"), b"").unwrap();
        std::fs::write(dir.path().join("clip (2).mkv"), b"").unwrap();

        let path = allocate_output_path(dir.path(), "clip", "mkv");
        assert_eq!(path, dir.path().join("clip (3).mkv"));
        assert!(!path.exists());
    }

    #[test]
    fn test_gap_in_suffixes_is_reused() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("clip.ts"), b"").unwrap();
        std::fs::write(dir.path().join("clip (2).ts"), b"").unwrap();

        let path = allocate_output_path(dir.path(), "clip", ".ts");
        assert_eq!(path, dir.path().join("clip (1).ts"));
    }

    #[test]
    fn test_other_extensions_do_not_collide() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"").unwrap();

        let path = allocate_output_path(dir.path(), "clip", "mkv");
        assert_eq!(path, dir.path().join("clip.mkv"));
    }
}
