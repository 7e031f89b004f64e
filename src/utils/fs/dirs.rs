//! Directory creation, copying, moving and removal.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Create `path` and its parents if missing.
///
/// # Errors
///
/// Fails if the directory cannot be created or `path` exists as a file.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Recursively copy a directory. Symlinks and special files are skipped.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    ensure_dir(dst)?;

    for entry in
        fs::read_dir(src).with_context(|| format!("Failed to read directory: {}", src.display()))?
    {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            fs::copy(&src_path, &dst_path).with_context(|| {
                format!("Failed to copy file from {} to {}", src_path.display(), dst_path.display())
            })?;
        }
    }

    Ok(())
}

/// Remove a file or directory tree; a missing path is not an error.
pub fn remove_path(path: &Path) -> Result<()> {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return Ok(());
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    } else {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove file: {}", path.display()))?;
    }
    Ok(())
}

/// Move `src` to `dst`, creating `dst`'s parent.
///
/// Tries a rename first and falls back to copy-then-delete when the rename
/// fails, for example across filesystem boundaries.
pub fn move_path(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }

    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!("Rename {} -> {} failed ({e}); copying instead", src.display(), dst.display());
            if src.is_dir() {
                copy_dir(src, dst)?;
            } else {
                fs::copy(src, dst).with_context(|| {
                    format!("Failed to copy {} to {}", src.display(), dst.display())
                })?;
            }
            remove_path(src)
        }
    }
}

/// Remove `path` if it is an empty directory. Returns whether it was removed.
pub fn remove_dir_if_empty(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    let is_empty = fs::read_dir(path)
        .with_context(|| format!("Failed to read directory: {}", path.display()))?
        .next()
        .is_none();
    if is_empty {
        fs::remove_dir(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    }
    Ok(is_empty)
}
