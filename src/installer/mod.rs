//! Bundle download and extraction.
//!
//! Each assistant's bundle is a zip archive whose entries are paths relative
//! to the project root. Two kinds of entries exist:
//!
//! - assistant files (for example `.claude/commands/apm-1-initiate-setup.md`),
//!   always written;
//! - shared scaffold files under `.apm/`, identical across the bundles of one
//!   release. They are written at most once per run and never overwrite a
//!   file that already exists, so user-authored documents in `.apm/` survive.
//!
//! Extraction is a single pass straight into the project directory. Safety
//! comes from the update orchestrator, which moves the previous managed
//! directories into a backup before calling the installer, and from the
//! [`InstallJournal`] that records every write so a failed run can be undone.

mod journal;

pub use journal::InstallJournal;

use crate::constants::SCAFFOLD_PREFIX;
use crate::core::ApmError;
use crate::release::{Asset, ReleaseClient, Transport};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

/// Per-target extraction switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Skip entries under the shared scaffold prefix entirely.
    pub skip_shared_scaffold: bool,
}

/// What one extraction wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Files written, scaffold files included
    pub files_written: usize,
    pub scaffold_written: usize,
    /// Scaffold entries not written, either skipped by option or already present
    pub scaffold_skipped: usize,
}

/// Downloads bundle assets through a [`ReleaseClient`] and extracts them.
pub struct BundleInstaller<'a, T> {
    client: &'a ReleaseClient<T>,
}

impl<'a, T: Transport> BundleInstaller<'a, T> {
    pub const fn new(client: &'a ReleaseClient<T>) -> Self {
        Self {
            client,
        }
    }

    /// Download `asset` and extract it under `dest_root`.
    ///
    /// # Errors
    ///
    /// - [`ApmError::DownloadFailed`] / [`ApmError::NetworkError`] from the download
    /// - [`ApmError::ExtractionFailed`] for a corrupt archive, an entry that
    ///   escapes `dest_root`, or a write failure
    pub async fn install_target(
        &self,
        asset: &Asset,
        dest_root: &Path,
        options: ExtractOptions,
        journal: &InstallJournal,
    ) -> Result<InstallReport, ApmError> {
        let bytes = self.client.download_asset(asset).await?;

        let name = asset.name.clone();
        let dest = dest_root.to_path_buf();
        let shared = journal.clone();
        let report = tokio::task::spawn_blocking(move || {
            extract_bundle(&bytes, &name, &dest, options, &shared)
        })
        .await
        .map_err(|e| ApmError::ExtractionFailed {
            file: asset.name.clone(),
            reason: format!("extraction task failed: {e}"),
        })??;

        info!(
            "Installed {} ({} files, scaffold {} written / {} skipped)",
            asset.name, report.files_written, report.scaffold_written, report.scaffold_skipped
        );
        Ok(report)
    }
}

fn is_scaffold(relative: &str) -> bool {
    relative.starts_with(SCAFFOLD_PREFIX)
}

/// Extract an in-memory zip archive into `dest_root`.
///
/// Directory entries are ignored; parents are created as files are written.
/// `archive_name` is used in error messages.
///
/// # Errors
///
/// [`ApmError::ExtractionFailed`] naming the archive or the failing entry.
pub fn extract_bundle(
    bytes: &[u8],
    archive_name: &str,
    dest_root: &Path,
    options: ExtractOptions,
    journal: &InstallJournal,
) -> Result<InstallReport, ApmError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ApmError::ExtractionFailed {
            file: archive_name.to_string(),
            reason: format!("not a readable zip archive: {e}"),
        })?;

    let mut report = InstallReport::default();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| ApmError::ExtractionFailed {
            file: archive_name.to_string(),
            reason: format!("entry {index}: {e}"),
        })?;
        if entry.is_dir() {
            continue;
        }

        let entry_name = entry.name().to_string();
        let relative: PathBuf = entry.enclosed_name().ok_or_else(|| ApmError::ExtractionFailed {
            file: entry_name.clone(),
            reason: format!("entry in {archive_name} escapes the destination directory"),
        })?;
        let relative_str = relative.to_string_lossy().replace('\\', "/");
        let target = dest_root.join(&relative);

        let scaffold = is_scaffold(&relative_str);
        if scaffold && options.skip_shared_scaffold {
            report.scaffold_skipped += 1;
            continue;
        }
        if scaffold && target.exists() {
            debug!("Keeping existing scaffold file {relative_str}");
            report.scaffold_skipped += 1;
            continue;
        }

        let mut content = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
        entry.read_to_end(&mut content).map_err(|e| ApmError::ExtractionFailed {
            file: entry_name.clone(),
            reason: e.to_string(),
        })?;

        journal.write_file(&target, &content).map_err(|e| ApmError::ExtractionFailed {
            file: entry_name,
            reason: format!("{e:#}"),
        })?;

        report.files_written += 1;
        if scaffold {
            report.scaffold_written += 1;
        }
    }

    Ok(report)
}
