//! Install and update entry points.
//!
//! Both operations resolve a release first, with no side effects, and then run
//! the same transaction:
//!
//! 1. preflight: every assistant to install exists in the manifest and its
//!    bundle exists in the release
//! 2. snapshot: assistant directories and the managed scaffold move into a
//!    backup holding directory
//! 3. install: bundles extract one after another; the shared scaffold is only
//!    written by the first
//! 4. record: the installation record is written
//! 5. discard the snapshot
//!
//! A failure in steps 3 or 4 reverts the install journal and restores the
//! snapshot before the original error is returned. If the restore fails the
//! error becomes [`ApmError::RollbackFailed`], naming the backup directory.
//!
//! Crossing to a different base version, installing an older build, or
//! replacing an installation whose tag cannot be parsed always needs its own
//! explicit confirmation.

use crate::config::{AssistantDirectories, GlobalConfig};
use crate::constants::MANAGED_SCAFFOLD_DIR;
use crate::core::ApmError;
use crate::core::prompt::{Choice, Prompter};
use crate::installer::{BundleInstaller, ExtractOptions, InstallJournal};
use crate::manifest::ReleaseManifest;
use crate::metadata::{
    InstallationMetadata, MetadataStore, NewInstallation, Source, merge_assistants,
};
use crate::release::{Asset, Release, ReleaseClient, Repository, Transport};
use crate::upgrade::backup::BackupManager;
use crate::upgrade::state::{UpdatePhase, UpdateTracker};
use crate::version::{
    compare_base_version, parse_tag, select_latest_compatible, select_latest_overall,
    select_latest_stable,
};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Shown before installing from a repository the user has not marked as trusted.
pub const CUSTOM_REPO_DISCLAIMER: &str = "\
Custom repositories are not reviewed by the APM maintainers. Their templates \
become instructions for your AI assistants and may contain malicious prompts. \
Only continue if you trust this repository.";

/// Where a release is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallSource {
    Official,
    Custom(Repository),
}

impl InstallSource {
    fn repository(&self) -> Repository {
        match self {
            Self::Official => Repository::official(),
            Self::Custom(repo) => repo.clone(),
        }
    }

    const fn kind(&self) -> Source {
        match self {
            Self::Official => Source::Official,
            Self::Custom(_) => Source::Custom,
        }
    }
}

/// Options for [`UpdateOrchestrator::resolve_and_install`].
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub source: InstallSource,
    /// Exact release tag; otherwise the latest stable (official) or a prompt (custom)
    pub tag: Option<String>,
    /// Assistant id or display name; otherwise prompted
    pub assistant: Option<String>,
    /// Reinstall over an existing installation without asking
    pub force: bool,
}

/// Options for [`UpdateOrchestrator::resolve_and_update`].
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Source to update from; a custom installation prompts when unset
    pub source: Option<InstallSource>,
}

/// How an install or update ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Installed { tag: String, assistants: Vec<String> },
    Updated { from: String, to: String, assistants: Vec<String> },
    UpToDate { tag: String },
    /// The user declined a confirmation; nothing was changed
    Cancelled,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed {
                tag,
                assistants,
            } => write!(f, "Installed {tag} for {}", assistants.join(", ")),
            Self::Updated {
                from,
                to,
                assistants,
            } => write!(f, "Updated {from} -> {to} for {}", assistants.join(", ")),
            Self::UpToDate {
                tag,
            } => write!(f, "Already up to date ({tag})"),
            Self::Cancelled => f.write_str("Cancelled; no changes were made"),
        }
    }
}

/// Result of a completed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReport {
    pub outcome: Outcome,
    /// Informational messages, such as a newer base version being available
    pub notices: Vec<String>,
    /// Backup archive kept after a successful transaction
    pub backup_archive: Option<PathBuf>,
}

impl OperationReport {
    fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            notices: Vec::new(),
            backup_archive: None,
        }
    }
}

/// Relation between the installed tag and a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Upgrade,
    Same,
    Downgrade,
    CrossBase,
    /// One of the tags is not a template tag
    Incomparable,
}

fn classify(installed: &str, target: &str) -> Direction {
    if installed == target {
        return Direction::Same;
    }
    let (Some(from), Some(to)) = (parse_tag(installed), parse_tag(target)) else {
        return Direction::Incomparable;
    };
    match to.compare_build(&from) {
        Some(Ordering::Greater) => Direction::Upgrade,
        Some(Ordering::Equal) => Direction::Same,
        Some(Ordering::Less) => Direction::Downgrade,
        None => Direction::CrossBase,
    }
}

/// Notice when `releases` contain a base version above `target`'s.
fn newer_base_notice(releases: &[Release], target: &str) -> Option<String> {
    let latest = select_latest_overall(releases)?;
    let target = parse_tag(target)?;
    (compare_base_version(&latest.base_version, &target.base_version) == Ordering::Greater).then(
        || {
            format!(
                "A newer base version is available ({latest}). Switching base versions is never \
                 automatic; install it explicitly with --tag {latest}."
            )
        },
    )
}

/// One bundle to extract.
struct Target {
    id: String,
    asset: Asset,
}

/// Everything the transaction needs, resolved up front.
struct Plan<'a> {
    release: &'a Release,
    directories: AssistantDirectories,
    assistants: Vec<String>,
    source: Source,
    repository: String,
    previous: Option<InstallationMetadata>,
}

/// Drives installs and updates for one project directory.
pub struct UpdateOrchestrator<T, P> {
    client: ReleaseClient<T>,
    prompter: P,
    directories: AssistantDirectories,
    project_dir: PathBuf,
    config: GlobalConfig,
    config_path: Option<PathBuf>,
    cli_version: String,
}

impl<T: Transport, P: Prompter> UpdateOrchestrator<T, P> {
    pub fn new(client: ReleaseClient<T>, prompter: P, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            prompter,
            directories: AssistantDirectories::default(),
            project_dir: project_dir.into(),
            config: GlobalConfig::default(),
            config_path: None,
            cli_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Global config to consult, and where to save it (`None` = default location).
    #[must_use]
    pub fn with_config(mut self, config: GlobalConfig, path: Option<PathBuf>) -> Self {
        self.config = config;
        self.config_path = path;
        self
    }

    #[must_use]
    pub fn with_cli_version(mut self, version: impl Into<String>) -> Self {
        self.cli_version = version.into();
        self
    }

    pub const fn prompter(&self) -> &P {
        &self.prompter
    }

    pub const fn config(&self) -> &GlobalConfig {
        &self.config
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    fn store(&self, directories: &AssistantDirectories) -> MetadataStore {
        MetadataStore::new(&self.project_dir, directories.clone())
            .with_cli_version(&self.cli_version)
    }

    /// Install a release into the project.
    ///
    /// In an already initialized project the previously installed assistants
    /// are reinstalled at the same release as the new one.
    ///
    /// # Errors
    ///
    /// Any [`ApmError`]; failures after the backup are rolled back first.
    pub async fn resolve_and_install(
        &mut self,
        options: InstallOptions,
    ) -> Result<OperationReport, ApmError> {
        let mut tracker = UpdateTracker::new();
        tracker.advance(UpdatePhase::Resolving)?;

        let existing = self.store(&self.directories).read().await?;
        if let Some(existing) = &existing
            && !options.force
        {
            let message = format!(
                "APM is already initialized here ({}, assistants: {}). Reinstall?",
                existing.template_version,
                existing.assistants.join(", ")
            );
            if !self.prompter.confirm(&message, false).await? {
                return Ok(OperationReport::new(Outcome::Cancelled));
            }
        }

        let repo = options.source.repository();
        if !self.accept_disclaimer(&options.source).await? {
            return Ok(OperationReport::new(Outcome::Cancelled));
        }

        let mut notices = Vec::new();
        let release = match &options.tag {
            Some(tag) => self.release_by_tag(&options.source, tag).await?,
            None => {
                let releases = self.list_for(&options.source).await?;
                let release = match &options.source {
                    InstallSource::Official => select_latest_stable(&releases).cloned().ok_or_else(
                        || ApmError::ReleaseNotFound {
                            repo: repo.to_string(),
                            tag: "latest stable".to_string(),
                        },
                    )?,
                    InstallSource::Custom(_) => self.choose_release(&repo, &releases).await?,
                };
                notices.extend(newer_base_notice(&releases, &release.tag_name));
                release
            }
        };

        if let Some(existing) = &existing
            && !self.confirm_direction(&existing.template_version, &release.tag_name).await?
        {
            return Ok(OperationReport::new(Outcome::Cancelled));
        }

        let manifest = self.client.fetch_manifest(&release).await?;
        let directories = self.directories.with_manifest(&manifest);
        let chosen = match &options.assistant {
            Some(requested) => resolve_assistant(&manifest, &directories, requested)?,
            None => self.choose_assistant(&manifest).await?,
        };

        let assistants = match &existing {
            Some(existing) => merge_assistants(&existing.assistants, &[chosen]),
            None => vec![chosen],
        };

        let plan = Plan {
            release: &release,
            directories,
            assistants: assistants.clone(),
            source: options.source.kind(),
            repository: repo.to_string(),
            previous: existing,
        };
        let backup_archive = self.transact(plan, &manifest, &mut tracker).await?;

        if let InstallSource::Custom(repo) = &options.source {
            self.offer_trust(repo).await;
        }

        for notice in &notices {
            info!("{notice}");
        }
        Ok(OperationReport {
            outcome: Outcome::Installed {
                tag: release.tag_name.clone(),
                assistants,
            },
            notices,
            backup_archive,
        })
    }

    /// Update every installed assistant to a newer release.
    ///
    /// Official installations move to the newest build of their base
    /// version. A custom installation updates from its repository (the user
    /// picks the release) or switches to the official latest stable.
    ///
    /// # Errors
    ///
    /// [`ApmError::NotInitialized`] without an installation record, or any
    /// other [`ApmError`]; failures after the backup are rolled back first.
    pub async fn resolve_and_update(
        &mut self,
        options: UpdateOptions,
    ) -> Result<OperationReport, ApmError> {
        let mut tracker = UpdateTracker::new();
        tracker.advance(UpdatePhase::Resolving)?;

        let installed = self.store(&self.directories).read().await?.ok_or_else(|| {
            ApmError::NotInitialized {
                path: self.project_dir.display().to_string(),
            }
        })?;
        let from = installed.template_version.clone();

        let source = match options.source {
            Some(source) => source,
            None => self.choose_update_source(&installed).await?,
        };
        if !self.accept_disclaimer(&source).await? {
            return Ok(OperationReport::new(Outcome::Cancelled));
        }
        let repo = source.repository();
        let releases = self.list_for(&source).await?;
        let switching = source.kind() != installed.source || repo.to_string() != installed.repository;

        let mut notices = Vec::new();
        let official = matches!(source, InstallSource::Official);
        let release = if official && !switching {
            let Some(tag) = parse_tag(&from) else {
                warn!("Installed version '{from}' is not a template tag");
                let Some(latest) = select_latest_stable(&releases).cloned() else {
                    return Err(ApmError::ReleaseNotFound {
                        repo: repo.to_string(),
                        tag: "latest stable".to_string(),
                    });
                };
                return self.finish_update(installed, latest, source, tracker, notices).await;
            };

            notices.extend(newer_base_notice(&releases, &from));
            match select_latest_compatible(&releases, &tag.base_version) {
                Some(candidate) if classify(&from, &candidate.tag_name) == Direction::Upgrade => {
                    candidate.clone()
                }
                _ => {
                    for notice in &notices {
                        info!("{notice}");
                    }
                    return Ok(OperationReport {
                        outcome: Outcome::UpToDate {
                            tag: from,
                        },
                        notices,
                        backup_archive: None,
                    });
                }
            }
        } else if official {
            select_latest_stable(&releases).cloned().ok_or_else(|| ApmError::ReleaseNotFound {
                repo: repo.to_string(),
                tag: "latest stable".to_string(),
            })?
        } else {
            let release = self.choose_release(&repo, &releases).await?;
            notices.extend(newer_base_notice(&releases, &release.tag_name));
            release
        };

        if !switching && classify(&from, &release.tag_name) == Direction::Same {
            return Ok(OperationReport {
                outcome: Outcome::UpToDate {
                    tag: from,
                },
                notices,
                backup_archive: None,
            });
        }

        self.finish_update(installed, release, source, tracker, notices).await
    }

    async fn finish_update(
        &mut self,
        installed: InstallationMetadata,
        release: Release,
        source: InstallSource,
        mut tracker: UpdateTracker,
        notices: Vec<String>,
    ) -> Result<OperationReport, ApmError> {
        let from = installed.template_version.clone();
        if !self.confirm_direction(&from, &release.tag_name).await? {
            return Ok(OperationReport::new(Outcome::Cancelled));
        }
        let question = format!(
            "Update {} from {from} to {}?",
            installed.assistants.join(", "),
            release.tag_name
        );
        if !self.prompter.confirm(&question, true).await? {
            return Ok(OperationReport::new(Outcome::Cancelled));
        }

        let manifest = self.client.fetch_manifest(&release).await?;
        let assistants = installed.assistants.clone();
        let plan = Plan {
            release: &release,
            directories: self.directories.with_manifest(&manifest),
            assistants: assistants.clone(),
            source: source.kind(),
            repository: source.repository().to_string(),
            previous: Some(installed),
        };
        let backup_archive = self.transact(plan, &manifest, &mut tracker).await?;

        for notice in &notices {
            info!("{notice}");
        }
        Ok(OperationReport {
            outcome: Outcome::Updated {
                from,
                to: release.tag_name.clone(),
                assistants,
            },
            notices,
            backup_archive,
        })
    }

    async fn list_for(&self, source: &InstallSource) -> Result<Vec<Release>, ApmError> {
        match source {
            InstallSource::Official => self.client.official_releases().await,
            InstallSource::Custom(repo) => self.client.custom_releases(repo).await,
        }
    }

    async fn release_by_tag(&self, source: &InstallSource, tag: &str) -> Result<Release, ApmError> {
        let repo = source.repository();
        if matches!(source, InstallSource::Official) {
            let parsed = parse_tag(tag).ok_or_else(|| ApmError::IncompatibleRelease {
                tag: tag.to_string(),
                reason: "not a template release tag (expected vX.Y.Z+templates.N)".to_string(),
            })?;
            if parsed.base_version.major != self.client.major_version() {
                return Err(ApmError::IncompatibleRelease {
                    tag: tag.to_string(),
                    reason: format!(
                        "official releases for major version {} require apm {}.x",
                        parsed.base_version.major, parsed.base_version.major
                    ),
                });
            }
        }
        self.client.fetch_release(&repo, tag).await
    }

    async fn choose_release(
        &self,
        repo: &Repository,
        releases: &[Release],
    ) -> Result<Release, ApmError> {
        if releases.is_empty() {
            return Err(ApmError::ReleaseNotFound {
                repo: repo.to_string(),
                tag: "any release".to_string(),
            });
        }

        let choices: Vec<Choice> = releases
            .iter()
            .map(|r| {
                let label = if r.prerelease {
                    format!("{} (pre-release)", r.tag_name)
                } else {
                    r.tag_name.clone()
                };
                Choice::new(label, &r.tag_name)
            })
            .collect();
        let picked = self.prompter.select_one(&format!("Select a release of {repo}"), &choices).await?;

        releases.iter().find(|r| r.tag_name == picked).cloned().ok_or_else(|| {
            ApmError::ReleaseNotFound {
                repo: repo.to_string(),
                tag: picked,
            }
        })
    }

    async fn choose_assistant(&self, manifest: &ReleaseManifest) -> Result<String, ApmError> {
        let choices: Vec<Choice> = manifest
            .assistants
            .iter()
            .map(|a| match &a.description {
                Some(description) => Choice::new(format!("{} - {description}", a.display_name), &a.id),
                None => Choice::new(&a.display_name, &a.id),
            })
            .collect();
        self.prompter.select_one("Select an AI assistant", &choices).await
    }

    async fn choose_update_source(
        &self,
        installed: &InstallationMetadata,
    ) -> Result<InstallSource, ApmError> {
        if installed.source == Source::Official {
            return Ok(InstallSource::Official);
        }

        let repo: Repository = installed.repository.parse()?;
        let choices = [
            Choice::new(format!("Custom repository ({repo})"), "custom"),
            Choice::new("Official releases", "official"),
        ];
        let picked = self.prompter.select_one("Update from", &choices).await?;
        Ok(if picked == "official" {
            InstallSource::Official
        } else {
            InstallSource::Custom(repo)
        })
    }

    async fn accept_disclaimer(&self, source: &InstallSource) -> Result<bool, ApmError> {
        let InstallSource::Custom(repo) = source else {
            return Ok(true);
        };
        if !self.config.requires_disclaimer(&repo.to_string()) {
            debug!("Disclaimer skipped for trusted repository {repo}");
            return Ok(true);
        }
        let message = format!("{CUSTOM_REPO_DISCLAIMER}\nInstall from {repo}?");
        self.prompter.confirm(&message, false).await
    }

    /// Separate confirmation for anything other than a same-base upgrade.
    async fn confirm_direction(&self, installed: &str, target: &str) -> Result<bool, ApmError> {
        let message = match classify(installed, target) {
            Direction::Upgrade | Direction::Same => return Ok(true),
            Direction::Downgrade => {
                format!("{target} is older than the installed {installed}. Downgrade?")
            }
            Direction::CrossBase => format!(
                "{target} has a different base version than the installed {installed}; \
                 its templates are not an upgrade of yours. Switch anyway?"
            ),
            Direction::Incomparable => format!(
                "Cannot compare the installed '{installed}' with '{target}'. Replace the \
                 installation anyway?"
            ),
        };
        self.prompter.confirm(&message, false).await
    }

    /// After a custom install, offer to remember the repository.
    ///
    /// Only asked of a person: automatic answers never change trust settings.
    async fn offer_trust(&mut self, repo: &Repository) {
        let name = repo.to_string();
        if self.config.repo_settings(&name).is_some() {
            return;
        }
        if !self.prompter.is_interactive() {
            debug!("Not saving {name}: prompts are answered automatically");
            return;
        }

        let save = self
            .prompter
            .confirm(&format!("Save {name} to your custom repositories?"), true)
            .await
            .unwrap_or(false);
        if !save {
            return;
        }
        self.config.add_custom_repo(&name);

        let skip = self
            .prompter
            .confirm(&format!("Skip the security disclaimer for {name} from now on?"), false)
            .await
            .unwrap_or(false);
        self.config.set_skip_disclaimer(&name, skip);

        if let Err(e) = self.config.save_with_optional(self.config_path.clone()).await {
            warn!("Could not save global config: {e:#}");
        }
    }

    /// Steps 1 to 5 of the module docs.
    async fn transact(
        &self,
        plan: Plan<'_>,
        manifest: &ReleaseManifest,
        tracker: &mut UpdateTracker,
    ) -> Result<Option<PathBuf>, ApmError> {
        let targets = preflight(&plan, manifest)?;

        let mut managed: Vec<String> = Vec::new();
        let dirs = targets.iter().filter_map(|t| plan.directories.dir_for(&t.id));
        for dir in dirs.chain([MANAGED_SCAFFOLD_DIR]) {
            if !managed.iter().any(|m| m == dir) {
                managed.push(dir.to_string());
            }
        }

        let label = plan
            .previous
            .as_ref()
            .map_or(plan.release.tag_name.as_str(), |p| p.template_version.as_str());
        let backups = BackupManager::new(&self.project_dir, self.config.backup.clone());
        let snapshot = backups.snapshot(&managed, label).await?;
        tracker.snapshot_taken();

        let journal = InstallJournal::new();
        let result = self.apply(&plan, &targets, &journal, tracker).await;

        match result {
            Ok(()) => {
                tracker.advance(UpdatePhase::Done)?;
                match backups.discard(snapshot).await {
                    Ok(kept) => Ok(kept),
                    Err(e) => {
                        warn!("Update succeeded but the backup could not be cleaned up: {e}");
                        Ok(None)
                    }
                }
            }
            Err(original) => {
                error!("Install failed, rolling back: {original}");
                note(tracker, UpdatePhase::Failed);
                note(tracker, UpdatePhase::RollingBack);

                let mut problems = Vec::new();
                if let Err(e) = journal.revert() {
                    problems.push(format!("could not undo files written by the update: {e:#}"));
                }
                if let Err(e) = backups.restore(&snapshot).await {
                    problems.push(e.to_string());
                }

                if problems.is_empty() {
                    note(tracker, UpdatePhase::RolledBack);
                    info!("Rolled back; the project is unchanged");
                    Err(original)
                } else {
                    note(tracker, UpdatePhase::RollbackFailed);
                    error!("Rollback failed; backup kept at {}", snapshot.backup_dir.display());
                    Err(ApmError::RollbackFailed {
                        backup_dir: snapshot.backup_dir.display().to_string(),
                        reason: problems.join("; "),
                        original: Box::new(original),
                    })
                }
            }
        }
    }

    async fn apply(
        &self,
        plan: &Plan<'_>,
        targets: &[Target],
        journal: &InstallJournal,
        tracker: &mut UpdateTracker,
    ) -> Result<(), ApmError> {
        tracker.advance(UpdatePhase::BackedUp)?;
        tracker.advance(UpdatePhase::Installing)?;

        let installer = BundleInstaller::new(&self.client);
        for (index, target) in targets.iter().enumerate() {
            let options = ExtractOptions {
                skip_shared_scaffold: index > 0,
            };
            debug!("Installing {} from {}", target.id, target.asset.name);
            installer.install_target(&target.asset, &self.project_dir, options, journal).await?;
        }

        let mut metadata = match &plan.previous {
            Some(previous) => InstallationMetadata {
                cli_version: self.cli_version.clone(),
                template_version: plan.release.tag_name.clone(),
                assistants: plan.assistants.clone(),
                source: plan.source,
                repository: plan.repository.clone(),
                ..previous.clone()
            },
            None => InstallationMetadata::create_initial(NewInstallation {
                source: plan.source,
                repository: plan.repository.clone(),
                template_version: plan.release.tag_name.clone(),
                assistants: plan.assistants.clone(),
                cli_version: self.cli_version.clone(),
            }),
        };
        self.store(&plan.directories).write(&mut metadata).await?;
        tracker.advance(UpdatePhase::MetadataWritten)?;
        Ok(())
    }
}

fn note(tracker: &mut UpdateTracker, phase: UpdatePhase) {
    if let Err(e) = tracker.advance(phase) {
        warn!("{e}");
    }
}

/// Match a user-supplied id or display name against the manifest.
fn resolve_assistant(
    manifest: &ReleaseManifest,
    directories: &AssistantDirectories,
    requested: &str,
) -> Result<String, ApmError> {
    if manifest.find_assistant(requested).is_some() {
        return Ok(requested.to_string());
    }
    if let Some(descriptor) =
        manifest.assistants.iter().find(|a| a.display_name.eq_ignore_ascii_case(requested))
    {
        return Ok(descriptor.id.clone());
    }
    if let Some(id) = directories.resolve_id(requested)
        && manifest.find_assistant(id).is_some()
    {
        return Ok(id.to_string());
    }
    Err(ApmError::AssistantNotFound {
        id: requested.to_string(),
        available: manifest.assistant_ids(),
    })
}

/// Resolve every assistant to its bundle before anything is touched.
fn preflight(plan: &Plan<'_>, manifest: &ReleaseManifest) -> Result<Vec<Target>, ApmError> {
    let tag = &plan.release.tag_name;
    plan.assistants
        .iter()
        .map(|id| {
            let descriptor =
                manifest.find_assistant(id).ok_or_else(|| ApmError::AssistantNotFound {
                    id: id.clone(),
                    available: manifest.assistant_ids(),
                })?;
            if plan.directories.dir_for(id).is_none() {
                return Err(ApmError::IncompatibleRelease {
                    tag: tag.clone(),
                    reason: format!(
                        "assistant '{id}' has no configDir and is unknown to this version of apm"
                    ),
                });
            }
            let asset = plan.release.find_asset(&descriptor.bundle_asset_name).ok_or_else(|| {
                ApmError::BundleNotFound {
                    bundle: descriptor.bundle_asset_name.clone(),
                    tag: tag.clone(),
                }
            })?;
            Ok(Target {
                id: id.clone(),
                asset: asset.clone(),
            })
        })
        .collect()
}
