//! Record of every filesystem change made while extracting bundles.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::utils::fs::remove_dir_if_empty;

#[derive(Debug, Default)]
struct Entries {
    created_dirs: Vec<PathBuf>,
    created_files: Vec<PathBuf>,
    overwritten: Vec<(PathBuf, Vec<u8>)>,
}

/// Files and directories touched by one install run.
///
/// Reverting undoes the changes in reverse order: overwritten files get
/// their original bytes back, created files are deleted and created
/// directories are removed once empty.
///
/// Clones share one record, so a copy handed to a blocking extraction task
/// keeps every write visible to the caller even if that task dies.
#[derive(Debug, Clone, Default)]
pub struct InstallJournal {
    entries: Arc<Mutex<Entries>>,
}

impl InstallJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A panicking writer leaves the record consistent up to its last write.
    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_empty(&self) -> bool {
        let entries = self.entries();
        entries.created_dirs.is_empty()
            && entries.created_files.is_empty()
            && entries.overwritten.is_empty()
    }

    /// Number of distinct files written so far.
    pub fn files_touched(&self) -> usize {
        let entries = self.entries();
        entries.created_files.len() + entries.overwritten.len()
    }

    fn ensure_parent(entries: &mut Entries, path: &Path) -> Result<()> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };

        let mut missing = Vec::new();
        let mut current = Some(parent);
        while let Some(dir) = current
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            missing.push(dir.to_path_buf());
            current = dir.parent();
        }

        for dir in missing.into_iter().rev() {
            fs::create_dir(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            entries.created_dirs.push(dir);
        }
        Ok(())
    }

    /// Write `content` to `path`, remembering what was there before.
    pub fn write_file(&self, path: &Path, content: &[u8]) -> Result<()> {
        let mut entries = self.entries();
        Self::ensure_parent(&mut entries, path)?;

        let recorded = entries.created_files.iter().any(|p| p == path)
            || entries.overwritten.iter().any(|(p, _)| p == path);
        if !recorded {
            if path.is_file() {
                let original = fs::read(path)
                    .with_context(|| format!("Failed to read existing file: {}", path.display()))?;
                entries.overwritten.push((path.to_path_buf(), original));
            } else {
                entries.created_files.push(path.to_path_buf());
            }
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write file: {}", path.display()))
    }

    /// Undo every recorded change. Stops at the first failure.
    pub fn revert(&self) -> Result<()> {
        let mut entries = self.entries();

        for (path, original) in entries.overwritten.drain(..).rev() {
            fs::write(&path, &original)
                .with_context(|| format!("Failed to restore file: {}", path.display()))?;
        }

        for path in entries.created_files.drain(..).rev() {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to remove file: {}", path.display()));
                }
            }
        }

        for dir in entries.created_dirs.drain(..).rev() {
            if dir.exists() && !remove_dir_if_empty(&dir)? {
                debug!("Leaving non-empty directory {}", dir.display());
            }
        }
        Ok(())
    }
}
