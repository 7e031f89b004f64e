//! Error handling for APM
//!
//! Two types make up the error system:
//! - [`ApmError`] enumerates every failure the install/update engine can report,
//!   carrying enough context (repository, tag, file) to diagnose it.
//! - [`ErrorContext`] wraps an error with a suggestion and details for CLI display.
//!
//! # Error Categories
//!
//! - **Release resolution**: [`ApmError::NetworkError`], [`ApmError::ReleaseNotFound`],
//!   [`ApmError::IncompatibleRelease`]
//! - **Manifest**: [`ApmError::ManifestMissing`], [`ApmError::ManifestInvalid`],
//!   [`ApmError::BundleNotFound`], [`ApmError::AssistantNotFound`]
//! - **Installation**: [`ApmError::DownloadFailed`], [`ApmError::ExtractionFailed`]
//! - **Project state**: [`ApmError::NotInitialized`], [`ApmError::MetadataError`]
//! - **Backup**: [`ApmError::BackupFailed`], [`ApmError::RollbackFailed`]
//!
//! [`ApmError::RollbackFailed`] is the most severe kind: the engine could not put the
//! project back the way it was and the user has to recover from the backup by hand.
//!
//! # Examples
//!
//! ```rust,no_run
//! use apm_cli::core::{ApmError, user_friendly_error};
//!
//! let err = ApmError::NotInitialized {
//!     path: "/tmp/project".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(err));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for APM operations
///
/// Every variant names the thing that failed. Variants that come from a
/// validation step (for example [`ApmError::ManifestInvalid`]) carry the full
/// list of problems rather than the first one found.
#[derive(Error, Debug)]
pub enum ApmError {
    /// A GitHub API request failed at the transport or HTTP level
    #[error("Network request to {target} failed: {reason}")]
    NetworkError {
        /// URL or repository the request targeted
        target: String,
        /// Transport-level cause, including any HTTP status hint
        reason: String,
    },

    /// No release matches the requested repository or tag
    #[error("Release '{tag}' not found in {repo}")]
    ReleaseNotFound {
        /// Repository that was searched (`owner/repo`)
        repo: String,
        /// Requested tag, or a description such as "latest"
        tag: String,
    },

    /// The release exists but cannot be installed by this version of the tool
    #[error("Release '{tag}' is not compatible with this version of apm: {reason}")]
    IncompatibleRelease {
        /// Tag of the rejected release
        tag: String,
        /// Why the release was rejected
        reason: String,
    },

    /// The release carries no manifest asset
    #[error("Release '{tag}' has no manifest asset")]
    ManifestMissing {
        /// Tag of the release
        tag: String,
    },

    /// The manifest asset could not be decoded or failed validation
    #[error("Manifest invalid for release '{tag}': {}", .errors.join("; "))]
    ManifestInvalid {
        /// Tag of the release
        tag: String,
        /// Every problem found, in document order
        errors: Vec<String>,
    },

    /// A manifest entry points at a bundle asset the release does not contain
    #[error("Bundle '{bundle}' not found in release '{tag}'")]
    BundleNotFound {
        /// Asset file name named by the manifest
        bundle: String,
        /// Tag of the release
        tag: String,
    },

    /// The requested assistant is not offered by the release
    #[error("Assistant '{id}' is not available in this release (available: {})", .available.join(", "))]
    AssistantNotFound {
        /// Requested assistant id
        id: String,
        /// Ids the manifest does offer
        available: Vec<String>,
    },

    /// An asset download failed or returned unexpected content
    #[error("Failed to download {url}: {reason}")]
    DownloadFailed {
        /// URL of the asset
        url: String,
        /// Cause of the failure
        reason: String,
    },

    /// A bundle archive could not be opened or one of its entries could not be written
    #[error("Failed to extract {file}: {reason}")]
    ExtractionFailed {
        /// Archive or entry name
        file: String,
        /// Cause of the failure
        reason: String,
    },

    /// Update requested in a directory without an installation record
    #[error("No APM installation found in {path}")]
    NotInitialized {
        /// Project directory that was inspected
        path: String,
    },

    /// The installation record could not be read or written
    #[error("Installation metadata error at {path}: {reason}")]
    MetadataError {
        /// Path of the metadata file
        path: String,
        /// Cause of the failure
        reason: String,
    },

    /// Moving managed directories into the backup area failed
    ///
    /// Raised before any destructive write, so the project is unchanged.
    #[error("Failed to back up {path}: {reason}")]
    BackupFailed {
        /// Path that could not be relocated
        path: String,
        /// Cause of the failure
        reason: String,
    },

    /// An update failed and restoring the backup failed too
    #[error(
        "Rollback failed, backup preserved at {backup_dir}: {reason} (update error: {original})"
    )]
    RollbackFailed {
        /// Holding directory that still contains the previous state
        backup_dir: String,
        /// Why the restore did not complete
        reason: String,
        /// The error that triggered the rollback
        original: Box<ApmError>,
    },

    /// A repository string is not of the form `owner/repo`
    #[error("Invalid repository '{repo}': {reason}")]
    InvalidRepository {
        /// The string that was supplied
        repo: String,
        /// What is wrong with it
        reason: String,
    },

    /// A confirmation or selection could not be obtained from the user
    #[error("Prompt failed: {reason}")]
    PromptFailed {
        /// Why the prompt could not be shown or answered
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error for cases not covered by specific variants
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl ApmError {
    /// Whether this error means the project could not be restored automatically.
    #[must_use]
    pub const fn is_rollback_failure(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. })
    }
}

impl Clone for ApmError {
    fn clone(&self) -> Self {
        match self {
            Self::NetworkError {
                target,
                reason,
            } => Self::NetworkError {
                target: target.clone(),
                reason: reason.clone(),
            },
            Self::ReleaseNotFound {
                repo,
                tag,
            } => Self::ReleaseNotFound {
                repo: repo.clone(),
                tag: tag.clone(),
            },
            Self::IncompatibleRelease {
                tag,
                reason,
            } => Self::IncompatibleRelease {
                tag: tag.clone(),
                reason: reason.clone(),
            },
            Self::ManifestMissing {
                tag,
            } => Self::ManifestMissing {
                tag: tag.clone(),
            },
            Self::ManifestInvalid {
                tag,
                errors,
            } => Self::ManifestInvalid {
                tag: tag.clone(),
                errors: errors.clone(),
            },
            Self::BundleNotFound {
                bundle,
                tag,
            } => Self::BundleNotFound {
                bundle: bundle.clone(),
                tag: tag.clone(),
            },
            Self::AssistantNotFound {
                id,
                available,
            } => Self::AssistantNotFound {
                id: id.clone(),
                available: available.clone(),
            },
            Self::DownloadFailed {
                url,
                reason,
            } => Self::DownloadFailed {
                url: url.clone(),
                reason: reason.clone(),
            },
            Self::ExtractionFailed {
                file,
                reason,
            } => Self::ExtractionFailed {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::NotInitialized {
                path,
            } => Self::NotInitialized {
                path: path.clone(),
            },
            Self::MetadataError {
                path,
                reason,
            } => Self::MetadataError {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::BackupFailed {
                path,
                reason,
            } => Self::BackupFailed {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::RollbackFailed {
                backup_dir,
                reason,
                original,
            } => Self::RollbackFailed {
                backup_dir: backup_dir.clone(),
                reason: reason.clone(),
                original: original.clone(),
            },
            Self::InvalidRepository {
                repo,
                reason,
            } => Self::InvalidRepository {
                repo: repo.clone(),
                reason: reason.clone(),
            },
            Self::PromptFailed {
                reason,
            } => Self::PromptFailed {
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            // io::Error is not Clone; keep kind and message
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error wrapper carrying a suggestion and details for terminal display
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ApmError,
    /// Actionable next step, printed in green
    pub suggestion: Option<String>,
    /// Background information, printed in yellow
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    #[must_use]
    pub const fn new(error: ApmError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add background details about the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`ApmError`] anywhere in the chain and falls back to a generic
/// context carrying the full `anyhow` chain otherwise.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(apm_error) = cause.downcast_ref::<ApmError>() {
            return create_error_context(apm_error.clone());
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return ErrorContext::new(ApmError::Other {
                message: io_error.to_string(),
            })
            .with_suggestion("Check ownership and permissions of the project directory");
        }
    }

    ErrorContext::new(ApmError::Other {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: ApmError) -> ErrorContext {
    match &error {
        ApmError::NetworkError {
            reason,
            ..
        } => {
            let suggestion = if reason.contains("rate limit") {
                "Wait for the rate limit to reset, or set GITHUB_TOKEN to raise it"
            } else if reason.contains("401") {
                "Your GitHub token is invalid or expired. Refresh GITHUB_TOKEN or run 'gh auth login'"
            } else if reason.contains("404") {
                "Check the repository name. Private repositories need GITHUB_TOKEN or 'gh auth login'"
            } else {
                "Check your internet connection and try again"
            };
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        ApmError::ReleaseNotFound {
            repo,
            ..
        } => {
            let suggestion = format!(
                "List available releases at https://github.com/{repo}/releases and pass an existing tag"
            );
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        ApmError::IncompatibleRelease {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Upgrade apm to a version matching the release's major version"),
        ApmError::ManifestMissing {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("The release was not published with a manifest. Pick a newer release")
            .with_details(format!(
                "Releases must include a '{}' asset",
                crate::constants::MANIFEST_ASSET_NAME
            )),
        ApmError::ManifestInvalid {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Report the problem to the release publisher, or pick another release"),
        ApmError::BundleNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("The release is incomplete. Pick another release"),
        ApmError::AssistantNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Choose one of the available assistants with --assistant"),
        ApmError::DownloadFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check your internet connection and try again")
            .with_details("Your project was restored to its previous state"),
        ApmError::ExtractionFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("The bundle may be corrupt. Try again or pick another release")
            .with_details("Your project was restored to its previous state"),
        ApmError::NotInitialized {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run 'apm init' to install the templates first"),
        ApmError::MetadataError {
            path,
            ..
        } => {
            let suggestion = format!("Inspect or remove {path} and run 'apm init' again");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        ApmError::BackupFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check disk space and permissions in the .apm directory")
            .with_details("No files were changed"),
        ApmError::RollbackFailed {
            backup_dir,
            ..
        } => {
            let details = format!(
                "Your previous files are in {backup_dir}. Move its contents back into the project root to recover"
            );
            ErrorContext::new(error)
                .with_suggestion("Restore manually before running apm again")
                .with_details(details)
        }
        ApmError::InvalidRepository {
            ..
        } => ErrorContext::new(error).with_suggestion("Use the form owner/repo"),
        ApmError::PromptFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass --yes to accept prompts in non-interactive sessions"),
        ApmError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the global config file, or remove it to start fresh"),
        ApmError::IoError(_)
        | ApmError::Other {
            ..
        } => ErrorContext::new(error),
    }
}
