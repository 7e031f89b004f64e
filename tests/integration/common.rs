//! Shared setup for integration tests.

use apm_cli::config::GlobalConfig;
use apm_cli::constants::OFFICIAL_REPOSITORY;
use apm_cli::core::ApmError;
use apm_cli::metadata::{InstallationMetadata, MetadataStore};
use apm_cli::release::ReleaseClient;
use apm_cli::test_utils::{FakeTransport, ScriptedPrompter, TemplateRelease};
use apm_cli::upgrade::{InstallOptions, InstallSource, OperationReport, UpdateOrchestrator};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub type TestOrchestrator = UpdateOrchestrator<FakeTransport, ScriptedPrompter>;

/// A release offering Claude Code and Cursor bundles.
pub fn two_assistant_release(tag: &str) -> TemplateRelease {
    TemplateRelease::new(tag)
        .assistant("claude", "Claude Code", ".claude/commands")
        .assistant("cursor", "Cursor", ".cursor/commands")
}

/// Official transport serving `releases`, added oldest first.
pub fn official(releases: impl IntoIterator<Item = TemplateRelease>) -> FakeTransport {
    releases
        .into_iter()
        .fold(FakeTransport::new(), |transport, release| release.publish(transport, OFFICIAL_REPOSITORY))
}

/// A project directory with its own global config file beside it.
pub struct TestProject {
    _temp: TempDir,
    project: PathBuf,
    config_path: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        let config_path = temp.path().join("config.toml");
        Self {
            _temp: temp,
            project,
            config_path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.project
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn orchestrator(
        &self,
        transport: &FakeTransport,
        prompter: ScriptedPrompter,
    ) -> TestOrchestrator {
        self.orchestrator_with_config(transport, prompter, GlobalConfig::default())
    }

    pub fn orchestrator_with_config(
        &self,
        transport: &FakeTransport,
        prompter: ScriptedPrompter,
        config: GlobalConfig,
    ) -> TestOrchestrator {
        UpdateOrchestrator::new(ReleaseClient::new(transport.clone()), prompter, &self.project)
            .with_config(config, Some(self.config_path.clone()))
            .with_cli_version("1.0.0")
    }

    /// Install `assistant` from official releases without any prompts.
    pub async fn install(
        &self,
        transport: &FakeTransport,
        assistant: &str,
        tag: Option<&str>,
    ) -> Result<OperationReport, ApmError> {
        let mut orchestrator = self.orchestrator(transport, ScriptedPrompter::silent());
        orchestrator
            .resolve_and_install(InstallOptions {
                source: InstallSource::Official,
                tag: tag.map(str::to_string),
                assistant: Some(assistant.to_string()),
                force: true,
            })
            .await
    }

    pub async fn metadata(&self) -> InstallationMetadata {
        MetadataStore::new(&self.project, Default::default())
            .read()
            .await
            .unwrap()
            .expect("project is initialized")
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.project.join(relative)).unwrap()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.project.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}
