use crate::constants::{APM_DIR, BACKUP_DIR_PREFIX};
use crate::core::ApmError;
use crate::upgrade::config::BackupPolicy;
use crate::utils::fs::{move_path, remove_dir_if_empty, remove_path};
use anyhow::{Context, Result};
use chrono::Utc;
use std::fs::File;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// State moved out of the way before an update mutates the project.
///
/// `moved_paths` is the exact list needed to undo the snapshot. Paths listed in
/// `absent_paths` did not exist when the snapshot was taken; restoring removes
/// them again if a failed attempt created them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSnapshot {
    /// Holding directory containing the moved paths under their relative names
    pub backup_dir: PathBuf,
    /// Zip of the holding directory, when one could be written
    pub archive_path: Option<PathBuf>,
    /// Project-relative paths moved into `backup_dir`
    pub moved_paths: Vec<String>,
    /// Project-relative paths that were not present
    pub absent_paths: Vec<String>,
    created_apm_dir: bool,
}

impl BackupSnapshot {
    /// Whether any managed path existed at snapshot time.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moved_paths.is_empty()
    }
}

/// Moves managed directories into a holding area and puts them back.
///
/// The relocate phase is all-or-nothing: if any path cannot be moved, the
/// ones already moved are returned and [`ApmError::BackupFailed`] is reported.
/// The archive phase is best effort; the holding directory remains the
/// authoritative copy whether or not the zip could be written.
///
/// ```rust,no_run
/// use apm_cli::upgrade::backup::BackupManager;
/// use apm_cli::upgrade::config::BackupPolicy;
///
/// # async fn example() -> Result<(), apm_cli::core::ApmError> {
/// let manager = BackupManager::new(".", BackupPolicy::default());
/// let managed = vec![".claude/commands".to_string(), ".apm/guides".to_string()];
/// let snapshot = manager.snapshot(&managed, "v1.0.0+templates.3").await?;
///
/// // ... extract new bundles ...
/// # let update_failed = false;
/// if update_failed {
///     manager.restore(&snapshot).await?;
/// } else {
///     manager.discard(snapshot).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BackupManager {
    project_dir: PathBuf,
    policy: BackupPolicy,
}

/// Replace characters that are unsafe in a directory name.
fn sanitize_tag(tag: &str) -> String {
    tag.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Whether `relative` names a path strictly below the project root.
fn stays_in_project(relative: &str) -> bool {
    let path = Path::new(relative);
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}

fn archive_path_for(holding: &Path) -> PathBuf {
    let mut name = holding.file_name().unwrap_or_default().to_os_string();
    name.push(".zip");
    holding.with_file_name(name)
}

impl BackupManager {
    pub fn new(project_dir: impl Into<PathBuf>, policy: BackupPolicy) -> Self {
        Self {
            project_dir: project_dir.into(),
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &BackupPolicy {
        &self.policy
    }

    /// Fresh holding directory path for `tag` under `.apm/`.
    fn holding_dir(&self, tag: &str) -> PathBuf {
        let base = self.project_dir.join(APM_DIR);
        let name = format!("{BACKUP_DIR_PREFIX}{}", sanitize_tag(tag));
        let candidate = base.join(&name);
        if !candidate.exists() && !archive_path_for(&candidate).exists() {
            return candidate;
        }
        base.join(format!("{name}-{}", Utc::now().format("%Y%m%dT%H%M%S%3fZ")))
    }

    /// Move every present path in `managed_paths` into a new holding directory.
    ///
    /// # Errors
    ///
    /// [`ApmError::BackupFailed`] if a path cannot be relocated, or if any path
    /// is absolute or leaves the project. Paths moved before the failure are
    /// put back first.
    pub async fn snapshot(
        &self,
        managed_paths: &[String],
        template_version: &str,
    ) -> Result<BackupSnapshot, ApmError> {
        let manager = self.clone();
        let paths = managed_paths.to_vec();
        let tag = template_version.to_string();

        tokio::task::spawn_blocking(move || manager.snapshot_blocking(&paths, &tag))
            .await
            .map_err(|e| ApmError::BackupFailed {
                path: self.project_dir.display().to_string(),
                reason: format!("backup task failed: {e}"),
            })?
    }

    fn snapshot_blocking(
        &self,
        managed_paths: &[String],
        tag: &str,
    ) -> Result<BackupSnapshot, ApmError> {
        if let Some(outside) = managed_paths.iter().find(|p| !stays_in_project(p)) {
            return Err(ApmError::BackupFailed {
                path: outside.clone(),
                reason: "refusing to back up a path outside the project".to_string(),
            });
        }

        let apm_dir = self.project_dir.join(APM_DIR);
        let created_apm_dir = !apm_dir.exists();
        let backup_dir = self.holding_dir(tag);

        std::fs::create_dir_all(&backup_dir).map_err(|e| ApmError::BackupFailed {
            path: backup_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut snapshot = BackupSnapshot {
            backup_dir,
            archive_path: None,
            moved_paths: Vec::new(),
            absent_paths: Vec::new(),
            created_apm_dir,
        };

        for relative in managed_paths {
            let source = self.project_dir.join(relative);
            if !source.exists() {
                warn!("Skipping backup of {relative}: not present");
                snapshot.absent_paths.push(relative.clone());
                continue;
            }

            let dest = snapshot.backup_dir.join(relative);
            if let Err(e) = move_path(&source, &dest) {
                let reason = format!("{e:#}");
                if let Err(undo) = self.put_back(&snapshot) {
                    warn!("Could not undo partial backup: {undo:#}");
                }
                return Err(ApmError::BackupFailed {
                    path: relative.clone(),
                    reason,
                });
            }
            debug!("Moved {relative} into {}", snapshot.backup_dir.display());
            snapshot.moved_paths.push(relative.clone());
        }

        if self.policy.create_archive && !snapshot.moved_paths.is_empty() {
            let archive = archive_path_for(&snapshot.backup_dir);
            snapshot.archive_path = archive_or_warn(&snapshot.backup_dir, &archive);
        }

        info!(
            "Backed up {} path(s) to {}",
            snapshot.moved_paths.len(),
            snapshot.backup_dir.display()
        );
        Ok(snapshot)
    }

    /// Undo a partial relocation.
    fn put_back(&self, snapshot: &BackupSnapshot) -> Result<()> {
        for relative in snapshot.moved_paths.iter().rev() {
            move_path(&snapshot.backup_dir.join(relative), &self.project_dir.join(relative))?;
        }
        self.remove_holding(snapshot, true)
    }

    fn remove_holding(&self, snapshot: &BackupSnapshot, remove_archive: bool) -> Result<()> {
        remove_path(&snapshot.backup_dir)?;
        if remove_archive && let Some(archive) = &snapshot.archive_path {
            remove_path(archive)?;
        }
        if snapshot.created_apm_dir {
            remove_dir_if_empty(&self.project_dir.join(APM_DIR))?;
        }
        Ok(())
    }

    /// Put the project back to its state at snapshot time.
    ///
    /// Anything now occupying a backed-up path is removed before the backup is
    /// moved back. On success the holding directory and its archive are gone.
    ///
    /// # Errors
    ///
    /// [`ApmError::BackupFailed`] naming the holding directory; whatever was
    /// not yet restored is still inside it.
    pub async fn restore(&self, snapshot: &BackupSnapshot) -> Result<(), ApmError> {
        let manager = self.clone();
        let owned = snapshot.clone();
        let backup_dir = snapshot.backup_dir.display().to_string();

        tokio::task::spawn_blocking(move || manager.restore_blocking(&owned))
            .await
            .map_err(|e| ApmError::BackupFailed {
                path: backup_dir.clone(),
                reason: format!("restore task failed: {e}"),
            })?
            .map_err(|e| ApmError::BackupFailed {
                path: backup_dir,
                reason: format!("{e:#}"),
            })
    }

    fn restore_blocking(&self, snapshot: &BackupSnapshot) -> Result<()> {
        for relative in &snapshot.moved_paths {
            let dest = self.project_dir.join(relative);
            remove_path(&dest)
                .with_context(|| format!("Failed to clear {relative} before restoring it"))?;
            move_path(&snapshot.backup_dir.join(relative), &dest)
                .with_context(|| format!("Failed to restore {relative}"))?;
            debug!("Restored {relative}");
        }

        for relative in &snapshot.absent_paths {
            let path = self.project_dir.join(relative);
            if path.exists() {
                remove_path(&path)
                    .with_context(|| format!("Failed to remove {relative} created by the update"))?;
                debug!("Removed {relative}, which did not exist before the update");
            }
        }

        self.remove_holding(snapshot, true)?;
        info!("Restored project from {}", snapshot.backup_dir.display());
        Ok(())
    }

    /// Drop the holding directory after a successful update.
    ///
    /// Returns the archive path when the policy keeps it.
    pub async fn discard(&self, snapshot: BackupSnapshot) -> Result<Option<PathBuf>, ApmError> {
        let manager = self.clone();
        let keep = self.policy.keep_archive;
        let backup_dir = snapshot.backup_dir.display().to_string();

        tokio::task::spawn_blocking(move || {
            manager.remove_holding(&snapshot, !keep)?;
            Ok::<_, anyhow::Error>(if keep { snapshot.archive_path } else { None })
        })
        .await
        .map_err(|e| ApmError::BackupFailed {
            path: backup_dir.clone(),
            reason: format!("cleanup task failed: {e}"),
        })?
        .map_err(|e| ApmError::BackupFailed {
            path: backup_dir,
            reason: format!("{e:#}"),
        })
    }
}

/// Best-effort archive of `dir`; a failure is logged and leaves no partial file.
fn archive_or_warn(dir: &Path, archive: &Path) -> Option<PathBuf> {
    match write_archive(dir, archive) {
        Ok(count) => {
            debug!("Archived {count} files to {}", archive.display());
            Some(archive.to_path_buf())
        }
        Err(e) => {
            warn!("Could not archive backup (the moved files are still kept): {e:#}");
            if let Err(e) = remove_path(archive) {
                warn!("Could not remove partial archive {}: {e:#}", archive.display());
            }
            None
        }
    }
}

/// Zip every file under `dir`, storing names relative to it.
fn write_archive(dir: &Path, archive: &Path) -> Result<usize> {
    let file = File::create(archive)
        .with_context(|| format!("Failed to create archive {}", archive.display()))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    let mut count = 0;
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(dir)?.to_string_lossy().replace('\\', "/");
        if entry.file_type().is_dir() {
            writer.add_directory(format!("{relative}/"), options)?;
        } else if entry.file_type().is_file() {
            writer.start_file(relative, options)?;
            let content = std::fs::read(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;
            writer.write_all(&content)?;
            count += 1;
        }
    }

    writer.finish()?;
    Ok(count)
}
