use crate::common::{TestProject, official, two_assistant_release};
use apm_cli::config::AssistantDirectories;
use apm_cli::constants::OFFICIAL_REPOSITORY;
use apm_cli::core::ApmError;
use apm_cli::metadata::{InstallationMetadata, MetadataStore, NewInstallation, Source};
use apm_cli::test_utils::{Answer, FakeTransport, ScriptedPrompter, snapshot_tree};
use apm_cli::upgrade::{Outcome, UpdateOptions};
use chrono::{TimeZone, Utc};

async fn install_both(project: &TestProject, transport: &FakeTransport, tag: &str) {
    project.install(transport, "claude", Some(tag)).await.unwrap();
    project.install(transport, "cursor", Some(tag)).await.unwrap();
}

#[tokio::test]
async fn test_update_moves_every_assistant_to_latest_build() {
    let transport = official([
        two_assistant_release("v1.0.0+templates.1"),
        two_assistant_release("v1.0.0+templates.2"),
    ]);
    let project = TestProject::new();
    install_both(&project, &transport, "v1.0.0+templates.1").await;
    let installed_at = project.metadata().await.installed_at;

    let prompter = ScriptedPrompter::new([Answer::Confirm(true)]);
    let mut orchestrator = project.orchestrator(&transport, prompter);
    let report = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap();

    assert_eq!(
        report.outcome,
        Outcome::Updated {
            from: "v1.0.0+templates.1".to_string(),
            to: "v1.0.0+templates.2".to_string(),
            assistants: vec!["claude".to_string(), "cursor".to_string()],
        }
    );
    assert!(report.notices.is_empty());
    assert_eq!(
        orchestrator.prompter().asked(),
        vec!["Update claude, cursor from v1.0.0+templates.1 to v1.0.0+templates.2?".to_string()]
    );
    assert_eq!(project.read(".claude/commands/apm-1-initiate-setup.md"), "claude v1.0.0+templates.2");
    assert_eq!(project.read(".cursor/commands/apm-1-initiate-setup.md"), "cursor v1.0.0+templates.2");

    let metadata = project.metadata().await;
    assert_eq!(metadata.template_version, "v1.0.0+templates.2");
    assert_eq!(metadata.installed_at, installed_at);
    assert!(metadata.last_updated_at >= installed_at);
}

#[tokio::test]
async fn test_update_keeps_backup_archive() {
    let transport = official([
        two_assistant_release("v1.0.0+templates.1"),
        two_assistant_release("v1.0.0+templates.2"),
    ]);
    let project = TestProject::new();
    project.install(&transport, "claude", Some("v1.0.0+templates.1")).await.unwrap();

    let prompter = ScriptedPrompter::new([Answer::Confirm(true)]);
    let mut orchestrator = project.orchestrator(&transport, prompter);
    let report = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap();

    let archive = report.backup_archive.expect("archive kept by default");
    assert!(archive.starts_with(project.path().join(".apm")));
    assert!(archive.is_file());
    assert!(!archive.with_extension("").exists(), "holding directory is removed");
}

#[tokio::test]
async fn test_update_never_crosses_base_version() {
    let transport = official([
        two_assistant_release("v1.0.0+templates.1"),
        two_assistant_release("v1.0.0+templates.2"),
        two_assistant_release("v1.1.0+templates.1"),
    ]);
    let project = TestProject::new();
    project.install(&transport, "claude", Some("v1.0.0+templates.1")).await.unwrap();

    let prompter = ScriptedPrompter::new([Answer::Confirm(true)]);
    let mut orchestrator = project.orchestrator(&transport, prompter);
    let report = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap();

    assert!(matches!(
        &report.outcome,
        Outcome::Updated { to, .. } if to == "v1.0.0+templates.2"
    ));
    assert_eq!(report.notices.len(), 1);
    assert!(report.notices[0].contains("v1.1.0+templates.1"));
}

#[tokio::test]
async fn test_update_when_up_to_date_asks_nothing() {
    let transport = official([
        two_assistant_release("v1.0.0+templates.1"),
        two_assistant_release("v1.1.0+templates.1"),
    ]);
    let project = TestProject::new();
    project.install(&transport, "claude", Some("v1.0.0+templates.1")).await.unwrap();
    let before = snapshot_tree(project.path());

    let mut orchestrator = project.orchestrator(&transport, ScriptedPrompter::silent());
    let report = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap();

    assert_eq!(
        report.outcome,
        Outcome::UpToDate {
            tag: "v1.0.0+templates.1".to_string(),
        }
    );
    // The newer base version is only reported
    assert_eq!(report.notices.len(), 1);
    assert!(orchestrator.prompter().asked().is_empty());
    assert_eq!(snapshot_tree(project.path()), before);
}

#[tokio::test]
async fn test_update_declined_changes_nothing() {
    let transport = official([
        two_assistant_release("v1.0.0+templates.1"),
        two_assistant_release("v1.0.0+templates.2"),
    ]);
    let project = TestProject::new();
    project.install(&transport, "claude", Some("v1.0.0+templates.1")).await.unwrap();
    let before = snapshot_tree(project.path());

    let prompter = ScriptedPrompter::new([Answer::Confirm(false)]);
    let mut orchestrator = project.orchestrator(&transport, prompter);
    let report = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap();

    assert_eq!(report.outcome, Outcome::Cancelled);
    assert_eq!(snapshot_tree(project.path()), before);
}

#[tokio::test]
async fn test_update_requires_installation() {
    let transport = official([two_assistant_release("v1.0.0+templates.1")]);
    let project = TestProject::new();

    let mut orchestrator = project.orchestrator(&transport, ScriptedPrompter::silent());
    let err = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap_err();

    assert!(matches!(err, ApmError::NotInitialized { .. }), "got {err}");
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_legacy_record_is_migrated_then_updated() {
    let transport = official([
        two_assistant_release("v1.0.0+templates.1"),
        two_assistant_release("v1.0.0+templates.2"),
    ]);
    let project = TestProject::new();
    project.write(
        ".apm/metadata.json",
        r#"{"version": "v1.0.0+templates.1", "assistant": "Claude Code", "installedAt": "2024-05-01T10:00:00Z"}"#,
    );
    project.write(".claude/commands/apm-1-initiate-setup.md", "old claude");
    project.write(".cursor/commands/apm-1-initiate-setup.md", "old cursor");

    let prompter = ScriptedPrompter::new([Answer::Confirm(true)]);
    let mut orchestrator = project.orchestrator(&transport, prompter);
    let report = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap();

    assert!(matches!(
        &report.outcome,
        Outcome::Updated { assistants, .. } if assistants == &["claude", "cursor"]
    ));
    let metadata = project.metadata().await;
    assert_eq!(metadata.assistants, vec!["claude", "cursor"]);
    assert_eq!(metadata.installed_at, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    assert_eq!(metadata.repository, OFFICIAL_REPOSITORY);
    assert_eq!(project.read(".cursor/commands/apm-1-initiate-setup.md"), "cursor v1.0.0+templates.2");
}

#[tokio::test]
async fn test_unparseable_installed_version_needs_extra_confirmation() {
    let transport = official([two_assistant_release("v1.0.0+templates.3")]);
    let project = TestProject::new();
    let mut record = InstallationMetadata::create_initial(NewInstallation {
        source: Source::Official,
        repository: OFFICIAL_REPOSITORY.to_string(),
        template_version: "0.4.2".to_string(),
        assistants: vec!["claude".to_string()],
        cli_version: "0.4.2".to_string(),
    });
    MetadataStore::new(project.path(), AssistantDirectories::default())
        .write(&mut record)
        .await
        .unwrap();

    let prompter = ScriptedPrompter::new([Answer::Confirm(true), Answer::Confirm(true)]);
    let mut orchestrator = project.orchestrator(&transport, prompter);
    let report = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap();

    assert!(matches!(report.outcome, Outcome::Updated { .. }));
    let asked = orchestrator.prompter().asked();
    assert_eq!(asked.len(), 2);
    assert!(asked[0].contains("Cannot compare"));
    assert_eq!(project.metadata().await.template_version, "v1.0.0+templates.3");
}

#[tokio::test]
async fn test_unparseable_installed_version_declined() {
    let transport = official([two_assistant_release("v1.0.0+templates.3")]);
    let project = TestProject::new();
    let mut record = InstallationMetadata::create_initial(NewInstallation {
        source: Source::Official,
        repository: OFFICIAL_REPOSITORY.to_string(),
        template_version: "0.4.2".to_string(),
        assistants: vec!["claude".to_string()],
        cli_version: "0.4.2".to_string(),
    });
    MetadataStore::new(project.path(), AssistantDirectories::default())
        .write(&mut record)
        .await
        .unwrap();

    let prompter = ScriptedPrompter::new([Answer::Confirm(false)]);
    let mut orchestrator = project.orchestrator(&transport, prompter);
    let report = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap();

    assert_eq!(report.outcome, Outcome::Cancelled);
    assert_eq!(project.metadata().await.template_version, "0.4.2");
}
