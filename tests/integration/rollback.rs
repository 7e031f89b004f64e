use crate::common::{TestProject, official, two_assistant_release};
use apm_cli::constants::{MANIFEST_ASSET_NAME, OFFICIAL_REPOSITORY};
use apm_cli::core::ApmError;
use apm_cli::release::{Asset, Release};
use apm_cli::test_utils::{Answer, ScriptedPrompter, build_zip, init_test_logging, snapshot_tree};
use apm_cli::upgrade::UpdateOptions;

#[tokio::test]
async fn test_failed_update_leaves_project_byte_identical() {
    init_test_logging(None);
    let transport = official([
        two_assistant_release("v1.0.0+templates.1"),
        two_assistant_release("v1.0.0+templates.2").corrupt_bundle("cursor"),
    ]);
    let project = TestProject::new();
    project.install(&transport, "claude", Some("v1.0.0+templates.1")).await.unwrap();
    project.install(&transport, "cursor", Some("v1.0.0+templates.1")).await.unwrap();
    project.write(".claude/commands/my-own-prompt.md", "keep me");
    project.write(".apm/Memory/Phase_01/Task_1.md", "progress");
    let before = snapshot_tree(project.path());

    let prompter = ScriptedPrompter::new([Answer::Confirm(true)]);
    let mut orchestrator = project.orchestrator(&transport, prompter);
    let err = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap_err();

    match &err {
        ApmError::ExtractionFailed {
            file,
            ..
        } => assert_eq!(file, "apm-cursor.zip"),
        other => panic!("expected the original extraction error, got {other}"),
    }
    assert_eq!(snapshot_tree(project.path()), before);
    assert_eq!(project.metadata().await.template_version, "v1.0.0+templates.1");
}

#[tokio::test]
async fn test_failed_install_of_new_assistant_restores_existing_one() {
    let transport = official([
        two_assistant_release("v1.0.0+templates.1"),
        two_assistant_release("v1.0.0+templates.2").corrupt_bundle("cursor"),
    ]);
    let project = TestProject::new();
    project.install(&transport, "claude", Some("v1.0.0+templates.1")).await.unwrap();
    let before = snapshot_tree(project.path());

    let err = project.install(&transport, "cursor", None).await.unwrap_err();

    assert!(matches!(err, ApmError::ExtractionFailed { .. }), "got {err}");
    assert_eq!(snapshot_tree(project.path()), before);
    assert!(!project.path().join(".cursor").exists());
}

#[tokio::test]
async fn test_failed_first_install_leaves_empty_project() {
    let transport = official([two_assistant_release("v1.0.0+templates.1").corrupt_bundle("claude")]);
    let project = TestProject::new();

    let err = project.install(&transport, "claude", None).await.unwrap_err();

    assert!(matches!(err, ApmError::ExtractionFailed { .. }), "got {err}");
    assert!(snapshot_tree(project.path()).is_empty());
}

#[tokio::test]
async fn test_download_failure_mid_install_rolls_back() {
    let tag = "v1.0.0+templates.2";
    let base = format!("https://github.com/{OFFICIAL_REPOSITORY}/releases/download/{tag}");
    let manifest = serde_json::to_vec(&two_assistant_release(tag).manifest_json()).unwrap();
    let manifest_asset = Asset::new(
        MANIFEST_ASSET_NAME,
        format!("{base}/{MANIFEST_ASSET_NAME}"),
        manifest.len() as u64,
    );
    let claude_zip = build_zip(&[
        (".claude/commands/apm-1-initiate-setup.md", Some("claude v2")),
        (".apm/guides/Implementation_Plan_Guide.md", Some("guide v2")),
    ]);
    let claude_asset =
        Asset::new("apm-claude.zip", format!("{base}/apm-claude.zip"), claude_zip.len() as u64);
    // Listed in the release, never served
    let cursor_asset = Asset::new("apm-cursor.zip", format!("{base}/apm-cursor.zip"), 0);

    let transport = official([two_assistant_release("v1.0.0+templates.1")])
        .with_asset_bytes(&manifest_asset, manifest)
        .with_asset_bytes(&claude_asset, claude_zip)
        .with_release(
            OFFICIAL_REPOSITORY,
            Release::new(tag).with_asset(manifest_asset).with_asset(claude_asset).with_asset(cursor_asset),
        );
    let project = TestProject::new();
    project.install(&transport, "claude", Some("v1.0.0+templates.1")).await.unwrap();
    project.install(&transport, "cursor", Some("v1.0.0+templates.1")).await.unwrap();
    let before = snapshot_tree(project.path());

    let prompter = ScriptedPrompter::new([Answer::Confirm(true)]);
    let mut orchestrator = project.orchestrator(&transport, prompter);
    let err = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap_err();

    assert!(matches!(err, ApmError::DownloadFailed { .. }), "got {err}");
    assert_eq!(snapshot_tree(project.path()), before);
}

#[tokio::test]
async fn test_failed_restore_reports_backup_location() {
    let transport = official([
        two_assistant_release("v1.0.0+templates.1"),
        two_assistant_release("v1.0.0+templates.2").corrupt_bundle("cursor"),
    ]);
    let project = TestProject::new();
    project.install(&transport, "claude", Some("v1.0.0+templates.1")).await.unwrap();
    project.install(&transport, "cursor", Some("v1.0.0+templates.1")).await.unwrap();

    // A file where .claude/ used to be blocks putting .claude/commands back
    let claude_dir = project.path().join(".claude");
    let transport = transport.on_download("apm-cursor.zip", move || {
        std::fs::remove_dir_all(&claude_dir).unwrap();
        std::fs::write(&claude_dir, "not a directory").unwrap();
    });

    let prompter = ScriptedPrompter::new([Answer::Confirm(true)]);
    let mut orchestrator = project.orchestrator(&transport, prompter);
    let err = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap_err();

    let ApmError::RollbackFailed {
        backup_dir,
        original,
        ..
    } = &err
    else {
        panic!("expected RollbackFailed, got {err}");
    };
    assert!(
        matches!(original.as_ref(), ApmError::ExtractionFailed { file, .. } if file == "apm-cursor.zip"),
        "original error was {original}"
    );
    assert!(err.is_rollback_failure());

    let backup_dir = std::path::Path::new(backup_dir);
    assert!(backup_dir.starts_with(project.path().join(".apm")));
    assert_eq!(
        std::fs::read_to_string(backup_dir.join(".claude/commands/apm-1-initiate-setup.md")).unwrap(),
        "claude v1.0.0+templates.1"
    );
    assert_eq!(
        std::fs::read_to_string(backup_dir.join(".cursor/commands/apm-1-initiate-setup.md")).unwrap(),
        "cursor v1.0.0+templates.1"
    );
    assert_eq!(project.metadata().await.template_version, "v1.0.0+templates.1");
}
