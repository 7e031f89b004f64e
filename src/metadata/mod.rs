//! Installation record (`.apm/metadata.json`).
//!
//! The record says which release is installed in a project, from which
//! repository, and for which assistants. It is created by the first
//! successful install, rewritten in place by every successful update, and
//! never deleted by the tool.
//!
//! ```json
//! {
//!   "cliVersion": "1.0.0",
//!   "templateVersion": "v1.0.0+templates.3",
//!   "assistants": ["claude", "cursor"],
//!   "installedAt": "2025-01-12T09:30:00Z",
//!   "lastUpdatedAt": "2025-02-01T17:04:11Z",
//!   "source": "official",
//!   "repository": "sdi2200262/agentic-project-management"
//! }
//! ```
//!
//! Records written by early releases of the tool used a single-assistant
//! shape (`{"version": ..., "assistant": ...}`); [`MetadataStore::read`]
//! migrates those on the fly (see [`migration`]).

pub mod migration;

use crate::config::AssistantDirectories;
use crate::constants::{METADATA_FILE, OFFICIAL_REPOSITORY};
use crate::core::ApmError;
use crate::utils::fs::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the installed release came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Official,
    Custom,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Official => f.write_str("official"),
            Self::Custom => f.write_str("custom"),
        }
    }
}

fn official_repository() -> String {
    OFFICIAL_REPOSITORY.to_string()
}

/// Persisted installation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationMetadata {
    /// Version of the tool that last wrote the record
    pub cli_version: String,

    /// Installed release tag
    #[serde(alias = "releaseVersion")]
    pub template_version: String,

    /// Installed assistant ids, in install order
    pub assistants: Vec<String>,

    pub installed_at: DateTime<Utc>,

    #[serde(alias = "lastUpdated")]
    pub last_updated_at: DateTime<Utc>,

    #[serde(default)]
    pub source: Source,

    /// `owner/repo` the release was fetched from
    #[serde(default = "official_repository")]
    pub repository: String,
}

/// Inputs for [`InstallationMetadata::create_initial`].
#[derive(Debug, Clone)]
pub struct NewInstallation {
    pub source: Source,
    pub repository: String,
    pub template_version: String,
    pub assistants: Vec<String>,
    pub cli_version: String,
}

impl InstallationMetadata {
    /// Fresh record stamped `installedAt = lastUpdatedAt = now`.
    #[must_use]
    pub fn create_initial(new: NewInstallation) -> Self {
        let now = Utc::now();
        Self {
            cli_version: new.cli_version,
            template_version: new.template_version,
            assistants: new.assistants,
            installed_at: now,
            last_updated_at: now,
            source: new.source,
            repository: new.repository,
        }
    }
}

/// Order-preserving union of two assistant lists without duplicates.
///
/// ```rust
/// use apm_cli::metadata::merge_assistants;
///
/// let existing = vec!["a".to_string(), "b".to_string()];
/// let incoming = vec!["b".to_string(), "c".to_string()];
/// let merged = merge_assistants(&existing, &incoming);
/// assert_eq!(merged, vec!["a", "b", "c"]);
/// ```
#[must_use]
pub fn merge_assistants(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + incoming.len());
    for id in existing.iter().chain(incoming) {
        if !merged.contains(id) {
            merged.push(id.clone());
        }
    }
    merged
}

/// Reads and writes the installation record of one project directory.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    project_dir: PathBuf,
    directories: AssistantDirectories,
    cli_version: String,
}

impl MetadataStore {
    pub fn new(project_dir: impl Into<PathBuf>, directories: AssistantDirectories) -> Self {
        Self {
            project_dir: project_dir.into(),
            directories,
            cli_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the tool version recorded in migrated and written records.
    #[must_use]
    pub fn with_cli_version(mut self, version: impl Into<String>) -> Self {
        self.cli_version = version.into();
        self
    }

    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    #[must_use]
    pub fn cli_version(&self) -> &str {
        &self.cli_version
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.project_dir.join(METADATA_FILE)
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.path().is_file()
    }

    fn metadata_error(&self, reason: impl Into<String>) -> ApmError {
        ApmError::MetadataError {
            path: self.path().display().to_string(),
            reason: reason.into(),
        }
    }

    /// Read the record, migrating a legacy one in place.
    ///
    /// Returns `Ok(None)` when the project has no record.
    ///
    /// # Errors
    ///
    /// [`ApmError::MetadataError`] if the file exists but cannot be read or
    /// parsed, or a migrated record cannot be written back.
    pub async fn read(&self) -> Result<Option<InstallationMetadata>, ApmError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let bytes = tokio::fs::read(&path).await.map_err(|e| self.metadata_error(e.to_string()))?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| self.metadata_error(format!("invalid JSON: {e}")))?;

        if migration::is_legacy(&value) {
            let legacy = migration::LegacyMetadata::from_value(value)
                .map_err(|e| self.metadata_error(format!("unreadable legacy record: {e}")))?;
            let mut migrated = migration::migrate(
                legacy,
                &self.directories,
                &self.project_dir,
                &self.cli_version,
            );
            info!(
                "Migrated legacy installation record to assistants [{}]",
                migrated.assistants.join(", ")
            );
            self.write(&mut migrated).await?;
            return Ok(Some(migrated));
        }

        let metadata = serde_json::from_value(value)
            .map_err(|e| self.metadata_error(format!("invalid record: {e}")))?;
        Ok(Some(metadata))
    }

    /// Persist `metadata`, stamping `lastUpdatedAt = now`.
    ///
    /// Creates `.apm/` if needed and replaces the file atomically.
    pub async fn write(&self, metadata: &mut InstallationMetadata) -> Result<(), ApmError> {
        metadata.last_updated_at = Utc::now();
        let content = serde_json::to_vec_pretty(metadata)
            .map_err(|e| self.metadata_error(format!("serialization failed: {e}")))?;

        let path = self.path();
        let write_path = path.clone();
        tokio::task::spawn_blocking(move || atomic_write(&write_path, &content))
            .await
            .map_err(|e| self.metadata_error(e.to_string()))?
            .map_err(|e| self.metadata_error(format!("{e:#}")))?;

        debug!("Wrote installation record to {}", path.display());
        Ok(())
    }
}
