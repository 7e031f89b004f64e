//! Atomic file writes.
//!
//! Content is written to a uniquely named temp file in the destination's
//! directory, synced, and renamed over the destination. Readers see either
//! the old file or the new one, never a partial write.

use crate::utils::fs::dirs::ensure_dir;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Atomically replace `path` with `content`, creating parent directories.
///
/// # Errors
///
/// Fails if the parent directory cannot be created or the temp file cannot be
/// written, synced, or renamed into place. The temp file is removed on failure.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_dir(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;

    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
    temp.as_file().sync_all().context("Failed to sync file to disk")?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Restrict a file to owner read/write (no-op off Unix).
pub fn set_private_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp = tempdir().unwrap();
        let file_path = temp.path().join(".apm").join("metadata.json");

        atomic_write(&file_path, b"{}").unwrap();

        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "{}");
    }

    #[test]
    fn test_atomic_write_overwrites_without_leftovers() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("record.json");

        atomic_write(&file, b"initial").unwrap();
        atomic_write(&file, b"updated").unwrap();

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "updated");
        let entries: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "temp file left behind");
    }

    #[cfg(unix)]
    #[test]
    fn test_set_private_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let file = temp.path().join("config.toml");
        atomic_write(&file, b"").unwrap();
        set_private_permissions(&file).unwrap();

        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
