use crate::common::{TestProject, official, two_assistant_release};
use apm_cli::core::ApmError;
use apm_cli::metadata::Source;
use apm_cli::test_utils::{Answer, ScriptedPrompter, TemplateRelease, init_test_logging, snapshot_tree};
use apm_cli::upgrade::{InstallOptions, InstallSource, Outcome};

#[tokio::test]
async fn test_init_installs_latest_stable_release() {
    init_test_logging(None);
    let transport = official([
        two_assistant_release("v1.0.0+templates.1"),
        two_assistant_release("v1.0.0+templates.2"),
        two_assistant_release("v1.1.0-beta.1+templates.1"),
    ]);
    let project = TestProject::new();

    let report = project.install(&transport, "claude", None).await.unwrap();

    assert_eq!(
        report.outcome,
        Outcome::Installed {
            tag: "v1.0.0+templates.2".to_string(),
            assistants: vec!["claude".to_string()],
        }
    );
    assert_eq!(project.read(".claude/commands/apm-1-initiate-setup.md"), "claude v1.0.0+templates.2");
    assert_eq!(
        project.read(".apm/guides/Implementation_Plan_Guide.md"),
        "implementation plan guide v1.0.0+templates.2"
    );
    assert_eq!(project.read(".apm/Memory/Memory_Root.md"), "memory root template");
    assert!(!project.path().join(".cursor").exists());

    let metadata = project.metadata().await;
    assert_eq!(metadata.template_version, "v1.0.0+templates.2");
    assert_eq!(metadata.assistants, vec!["claude"]);
    assert_eq!(metadata.source, Source::Official);
    assert_eq!(metadata.cli_version, "1.0.0");
}

#[tokio::test]
async fn test_init_selects_assistant_by_prompt() {
    let transport = official([two_assistant_release("v1.0.0+templates.1")]);
    let project = TestProject::new();
    let prompter = ScriptedPrompter::new([Answer::select("cursor")]);
    let mut orchestrator = project.orchestrator(&transport, prompter);

    let report = orchestrator
        .resolve_and_install(InstallOptions {
            source: InstallSource::Official,
            tag: None,
            assistant: None,
            force: false,
        })
        .await
        .unwrap();

    assert!(matches!(report.outcome, Outcome::Installed { .. }));
    assert_eq!(orchestrator.prompter().asked(), vec!["Select an AI assistant".to_string()]);
    assert_eq!(project.read(".cursor/commands/apm-1-initiate-setup.md"), "cursor v1.0.0+templates.1");
}

#[tokio::test]
async fn test_assistant_display_name_is_accepted() {
    let transport = official([two_assistant_release("v1.0.0+templates.1")]);
    let project = TestProject::new();

    project.install(&transport, "Claude Code", None).await.unwrap();

    assert_eq!(project.metadata().await.assistants, vec!["claude"]);
}

#[tokio::test]
async fn test_adding_assistant_reinstalls_existing_at_same_release() {
    let transport = official([
        two_assistant_release("v1.0.0+templates.1"),
        two_assistant_release("v1.0.0+templates.2"),
    ]);
    let project = TestProject::new();
    project.install(&transport, "claude", Some("v1.0.0+templates.1")).await.unwrap();
    project.write(".apm/Memory/Memory_Root.md", "my project notes");

    let report = project.install(&transport, "cursor", None).await.unwrap();

    assert_eq!(
        report.outcome,
        Outcome::Installed {
            tag: "v1.0.0+templates.2".to_string(),
            assistants: vec!["claude".to_string(), "cursor".to_string()],
        }
    );
    assert_eq!(project.read(".claude/commands/apm-1-initiate-setup.md"), "claude v1.0.0+templates.2");
    assert_eq!(project.read(".cursor/commands/apm-1-initiate-setup.md"), "cursor v1.0.0+templates.2");
    // Managed guides follow the release; project memory is never overwritten
    assert_eq!(
        project.read(".apm/guides/Implementation_Plan_Guide.md"),
        "implementation plan guide v1.0.0+templates.2"
    );
    assert_eq!(project.read(".apm/Memory/Memory_Root.md"), "my project notes");
}

#[tokio::test]
async fn test_managed_guides_replaced_on_reinstall() {
    let transport = official([two_assistant_release("v1.0.0+templates.1")
        .scaffold(&[(".apm/guides/Task_Assignment_Guide.md", "assign")])]);
    let project = TestProject::new();
    project.install(&transport, "claude", None).await.unwrap();

    project.write(".apm/guides/Task_Assignment_Guide.md", "edited");
    project.install(&transport, "cursor", None).await.unwrap();

    assert_eq!(project.read(".apm/guides/Task_Assignment_Guide.md"), "assign");
    let guides: Vec<_> = std::fs::read_dir(project.path().join(".apm/guides")).unwrap().collect();
    assert_eq!(guides.len(), 1);
}

#[tokio::test]
async fn test_reinstall_declined_changes_nothing() {
    let transport = official([two_assistant_release("v1.0.0+templates.1")]);
    let project = TestProject::new();
    project.install(&transport, "claude", None).await.unwrap();
    let before = snapshot_tree(project.path());

    let prompter = ScriptedPrompter::new([Answer::Confirm(false)]);
    let mut orchestrator = project.orchestrator(&transport, prompter);
    let report = orchestrator
        .resolve_and_install(InstallOptions {
            source: InstallSource::Official,
            tag: None,
            assistant: Some("cursor".to_string()),
            force: false,
        })
        .await
        .unwrap();

    assert_eq!(report.outcome, Outcome::Cancelled);
    assert_eq!(snapshot_tree(project.path()), before);
}

#[tokio::test]
async fn test_unknown_assistant_is_rejected_before_any_write() {
    let transport = official([two_assistant_release("v1.0.0+templates.1")]);
    let project = TestProject::new();

    let err = project.install(&transport, "zed", None).await.unwrap_err();

    match err {
        ApmError::AssistantNotFound {
            id,
            available,
        } => {
            assert_eq!(id, "zed");
            assert_eq!(available, vec!["claude", "cursor"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(snapshot_tree(project.path()).is_empty());
}

#[tokio::test]
async fn test_missing_bundle_fails_preflight() {
    let transport = official([two_assistant_release("v1.0.0+templates.1").without_bundle("cursor")]);
    let project = TestProject::new();

    let err = project.install(&transport, "cursor", None).await.unwrap_err();

    assert!(matches!(err, ApmError::BundleNotFound { .. }), "got {err}");
    assert!(snapshot_tree(project.path()).is_empty());
}

#[tokio::test]
async fn test_release_without_manifest() {
    let transport = official([two_assistant_release("v1.0.0+templates.1").without_manifest()]);
    let project = TestProject::new();

    let err = project.install(&transport, "claude", None).await.unwrap_err();

    assert!(matches!(err, ApmError::ManifestMissing { .. }), "got {err}");
}

#[tokio::test]
async fn test_official_tag_must_match_tool_major_version() {
    let transport = official([
        two_assistant_release("v1.0.0+templates.1"),
        two_assistant_release("v2.0.0+templates.1"),
    ]);
    let project = TestProject::new();

    let err = project.install(&transport, "claude", Some("v2.0.0+templates.1")).await.unwrap_err();
    assert!(matches!(err, ApmError::IncompatibleRelease { .. }), "got {err}");

    let err = project.install(&transport, "claude", Some("nightly")).await.unwrap_err();
    assert!(matches!(err, ApmError::IncompatibleRelease { .. }), "got {err}");
}

#[tokio::test]
async fn test_unknown_tag_is_release_not_found() {
    let transport = official([two_assistant_release("v1.0.0+templates.1")]);
    let project = TestProject::new();

    let err = project.install(&transport, "claude", Some("v1.0.0+templates.9")).await.unwrap_err();

    assert!(matches!(err, ApmError::ReleaseNotFound { .. }), "got {err}");
}

#[tokio::test]
async fn test_latest_stable_ignores_other_major_versions() {
    let transport = official([
        two_assistant_release("v1.0.0+templates.4"),
        TemplateRelease::new("v2.0.0+templates.1").assistant("claude", "Claude Code", ".claude/commands"),
    ]);
    let project = TestProject::new();

    project.install(&transport, "claude", None).await.unwrap();

    assert_eq!(project.metadata().await.template_version, "v1.0.0+templates.4");
}

#[tokio::test]
async fn test_config_dir_outside_project_is_rejected() {
    let transport = official([TemplateRelease::new("v1.0.0+templates.1").assistant(
        "claude",
        "Claude Code",
        "../outside",
    )]);
    let project = TestProject::new();
    let outside = project.path().parent().unwrap().join("outside");
    std::fs::create_dir_all(&outside).unwrap();
    std::fs::write(outside.join("precious.txt"), "keep me").unwrap();

    let err = project.install(&transport, "claude", None).await.unwrap_err();

    match err {
        ApmError::ManifestInvalid {
            errors,
            ..
        } => assert!(errors[0].starts_with("assistants[0].configDir '../outside'"), "{errors:?}"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(std::fs::read_to_string(outside.join("precious.txt")).unwrap(), "keep me");
    assert!(snapshot_tree(project.path()).is_empty());
}

#[tokio::test]
async fn test_scaffold_comes_from_first_bundle_only() {
    let transport = official([two_assistant_release("v1.0.0+templates.1").bundle_scaffold(
        "cursor",
        &[
            (".apm/guides/Implementation_Plan_Guide.md", "stale guide"),
            (".apm/guides/Stale_Only_Guide.md", "stale"),
            (".apm/Stale_Notes.md", "stale"),
        ],
    )]);
    let project = TestProject::new();
    project.install(&transport, "claude", None).await.unwrap();

    // Reinstalls claude then cursor in one run
    project.install(&transport, "cursor", None).await.unwrap();

    assert_eq!(
        project.read(".apm/guides/Implementation_Plan_Guide.md"),
        "implementation plan guide v1.0.0+templates.1"
    );
    assert!(!project.path().join(".apm/guides/Stale_Only_Guide.md").exists());
    assert!(!project.path().join(".apm/Stale_Notes.md").exists());
    assert_eq!(project.read(".cursor/commands/apm-1-initiate-setup.md"), "cursor v1.0.0+templates.1");
}
