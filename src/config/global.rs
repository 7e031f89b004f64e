//! User-wide settings stored in `~/.apm/config.toml`.
//!
//! The file holds the list of trusted custom repositories and the backup
//! policy. It is independent of any single project's installation record.
//! Set `APM_CONFIG_PATH` to use a different file.
//!
//! ```toml
//! [[custom_repos]]
//! repo = "octo-org/apm-templates"
//! skip_disclaimer = true
//! added_at = "2025-01-12T09:30:00Z"
//!
//! [backup]
//! create_archive = true
//! keep_archive = true
//! ```

use crate::constants::CONFIG_PATH_ENV;
use crate::core::ApmError;
use crate::upgrade::config::BackupPolicy;
use crate::utils::fs::{atomic_write, set_private_permissions};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Trust flags for one custom repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTrustSetting {
    /// `owner/repo`
    pub repo: String,

    /// Skip the security disclaimer when installing from this repository
    #[serde(default)]
    pub skip_disclaimer: bool,

    pub added_at: DateTime<Utc>,
}

/// Global configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_repos: Vec<RepoTrustSetting>,

    #[serde(default)]
    pub backup: BackupPolicy,
}

impl GlobalConfig {
    /// Load from `path` if given, otherwise from [`Self::default_path`].
    ///
    /// A missing file yields defaults.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No global config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            ApmError::ConfigError {
                message: format!("{} is not valid: {e}", path.display()),
            }
            .into()
        })
    }

    /// Save to `path` if given, otherwise to [`Self::default_path`].
    pub async fn save_with_optional(&self, path: Option<PathBuf>) -> Result<()> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        self.save_to(&path).await
    }

    /// Write as TOML with owner-only permissions.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize global config")?;
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            atomic_write(&path, content.as_bytes())
                .with_context(|| format!("Failed to write global config to {}", path.display()))?;
            set_private_permissions(&path)
        })
        .await
        .context("Config write task panicked")?
    }

    /// `~/.apm/config.toml`, or the value of `APM_CONFIG_PATH` when set.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?;
        Ok(home.join(".apm").join("config.toml"))
    }

    #[must_use]
    pub fn repo_settings(&self, repo: &str) -> Option<&RepoTrustSetting> {
        self.custom_repos.iter().find(|r| r.repo == repo)
    }

    /// Whether the disclaimer should be shown for `repo`.
    #[must_use]
    pub fn requires_disclaimer(&self, repo: &str) -> bool {
        !self.repo_settings(repo).is_some_and(|r| r.skip_disclaimer)
    }

    /// Save `repo` with the disclaimer enabled. Returns false if already saved.
    pub fn add_custom_repo(&mut self, repo: &str) -> bool {
        if self.repo_settings(repo).is_some() {
            return false;
        }
        self.custom_repos.push(RepoTrustSetting {
            repo: repo.to_string(),
            skip_disclaimer: false,
            added_at: Utc::now(),
        });
        true
    }

    /// Set the disclaimer flag. Returns false if the repository is not saved.
    pub fn set_skip_disclaimer(&mut self, repo: &str, skip: bool) -> bool {
        match self.custom_repos.iter_mut().find(|r| r.repo == repo) {
            Some(setting) => {
                setting.skip_disclaimer = skip;
                true
            }
            None => false,
        }
    }

    /// Returns whether the repository was saved.
    pub fn remove_custom_repo(&mut self, repo: &str) -> bool {
        let before = self.custom_repos.len();
        self.custom_repos.retain(|r| r.repo != repo);
        self.custom_repos.len() != before
    }

    /// Forget every saved repository, returning how many were removed.
    pub fn clear_custom_repos(&mut self) -> usize {
        std::mem::take(&mut self.custom_repos).len()
    }
}
