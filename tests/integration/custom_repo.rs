use crate::common::{TestProject, official, two_assistant_release};
use apm_cli::config::GlobalConfig;
use apm_cli::constants::OFFICIAL_REPOSITORY;
use apm_cli::core::ApmError;
use apm_cli::metadata::Source;
use apm_cli::release::Repository;
use apm_cli::test_utils::{Answer, FakeTransport, ScriptedPrompter, snapshot_tree};
use apm_cli::upgrade::{InstallOptions, InstallSource, Outcome, UpdateOptions};

const REPO: &str = "octo/templates";

fn custom_options(assistant: &str) -> InstallOptions {
    InstallOptions {
        source: InstallSource::Custom(REPO.parse::<Repository>().unwrap()),
        tag: None,
        assistant: Some(assistant.to_string()),
        force: false,
    }
}

fn trusted_config() -> GlobalConfig {
    let mut config = GlobalConfig::default();
    config.add_custom_repo(REPO);
    config.set_skip_disclaimer(REPO, true);
    config
}

/// Official releases plus two custom ones with non-template tags.
fn transport() -> FakeTransport {
    let transport = official([two_assistant_release("v1.0.0+templates.2")]);
    let transport = two_assistant_release("team-2025.05").publish(transport, REPO);
    two_assistant_release("team-2025.06").publish(transport, REPO)
}

#[tokio::test]
async fn test_custom_install_shows_disclaimer_and_saves_trust() {
    let transport = transport();
    let project = TestProject::new();
    let prompter = ScriptedPrompter::new([
        Answer::Confirm(true),
        Answer::select("team-2025.05"),
        Answer::Confirm(true),
        Answer::Confirm(true),
    ]);
    let mut orchestrator = project.orchestrator(&transport, prompter);

    let report = orchestrator.resolve_and_install(custom_options("claude")).await.unwrap();

    assert!(matches!(&report.outcome, Outcome::Installed { tag, .. } if tag == "team-2025.05"));
    let asked = orchestrator.prompter().asked();
    assert!(asked[0].contains("not reviewed"));
    assert_eq!(asked[1], "Select a release of octo/templates");
    assert_eq!(orchestrator.prompter().remaining(), 0);

    let metadata = project.metadata().await;
    assert_eq!(metadata.source, Source::Custom);
    assert_eq!(metadata.repository, REPO);

    let saved = GlobalConfig::load_from(project.config_path()).await.unwrap();
    assert!(!saved.requires_disclaimer(REPO));
}

#[tokio::test]
async fn test_unattended_install_does_not_save_trust() {
    let transport = transport();
    let project = TestProject::new();
    let prompter =
        ScriptedPrompter::new([Answer::Confirm(true), Answer::select("team-2025.05")]).unattended();
    let mut orchestrator = project.orchestrator(&transport, prompter);

    let report = orchestrator.resolve_and_install(custom_options("claude")).await.unwrap();

    assert!(matches!(report.outcome, Outcome::Installed { .. }));
    assert_eq!(orchestrator.prompter().asked().len(), 2);
    assert_eq!(orchestrator.prompter().remaining(), 0);
    assert!(!project.config_path().exists());
}

#[tokio::test]
async fn test_declined_disclaimer_contacts_nothing() {
    let transport = transport();
    let project = TestProject::new();
    let prompter = ScriptedPrompter::new([Answer::Confirm(false)]);
    let mut orchestrator = project.orchestrator(&transport, prompter);

    let report = orchestrator.resolve_and_install(custom_options("claude")).await.unwrap();

    assert_eq!(report.outcome, Outcome::Cancelled);
    assert!(transport.requests().is_empty());
    assert!(snapshot_tree(project.path()).is_empty());
    assert!(!project.config_path().exists());
}

#[tokio::test]
async fn test_trusted_repository_skips_disclaimer() {
    let transport = transport();
    let project = TestProject::new();
    let prompter = ScriptedPrompter::new([Answer::select("team-2025.06")]);
    let mut orchestrator = project.orchestrator_with_config(&transport, prompter, trusted_config());

    orchestrator.resolve_and_install(custom_options("cursor")).await.unwrap();

    assert_eq!(
        orchestrator.prompter().asked(),
        vec!["Select a release of octo/templates".to_string()]
    );
    assert_eq!(project.read(".cursor/commands/apm-1-initiate-setup.md"), "cursor team-2025.06");
}

#[tokio::test]
async fn test_custom_update_stays_on_repository() {
    let transport = transport();
    let project = TestProject::new();
    let mut orchestrator = project.orchestrator_with_config(
        &transport,
        ScriptedPrompter::new([Answer::select("team-2025.05")]),
        trusted_config(),
    );
    orchestrator.resolve_and_install(custom_options("claude")).await.unwrap();

    let prompter = ScriptedPrompter::new([
        Answer::select("custom"),
        Answer::select("team-2025.06"),
        // Custom tags are not comparable, so the replacement is confirmed separately
        Answer::Confirm(true),
        Answer::Confirm(true),
    ]);
    let mut orchestrator = project.orchestrator_with_config(&transport, prompter, trusted_config());
    let report = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap();

    assert_eq!(
        report.outcome,
        Outcome::Updated {
            from: "team-2025.05".to_string(),
            to: "team-2025.06".to_string(),
            assistants: vec!["claude".to_string()],
        }
    );
    assert_eq!(project.metadata().await.source, Source::Custom);
}

#[tokio::test]
async fn test_custom_update_same_release_is_up_to_date() {
    let transport = transport();
    let project = TestProject::new();
    let mut orchestrator = project.orchestrator_with_config(
        &transport,
        ScriptedPrompter::new([Answer::select("team-2025.06")]),
        trusted_config(),
    );
    orchestrator.resolve_and_install(custom_options("claude")).await.unwrap();

    let prompter =
        ScriptedPrompter::new([Answer::select("custom"), Answer::select("team-2025.06")]);
    let mut orchestrator = project.orchestrator_with_config(&transport, prompter, trusted_config());
    let report = orchestrator.resolve_and_update(UpdateOptions::default()).await.unwrap();

    assert!(matches!(report.outcome, Outcome::UpToDate { .. }));
}

#[tokio::test]
async fn test_custom_installation_switches_to_official() {
    let transport = transport();
    let project = TestProject::new();
    let mut orchestrator = project.orchestrator_with_config(
        &transport,
        ScriptedPrompter::new([Answer::select("team-2025.05")]),
        trusted_config(),
    );
    orchestrator.resolve_and_install(custom_options("claude")).await.unwrap();

    let prompter = ScriptedPrompter::new([Answer::Confirm(true), Answer::Confirm(true)]);
    let mut orchestrator = project.orchestrator(&transport, prompter);
    let report = orchestrator
        .resolve_and_update(UpdateOptions {
            source: Some(InstallSource::Official),
        })
        .await
        .unwrap();

    assert!(matches!(&report.outcome, Outcome::Updated { to, .. } if to == "v1.0.0+templates.2"));
    let metadata = project.metadata().await;
    assert_eq!(metadata.source, Source::Official);
    assert_eq!(metadata.repository, OFFICIAL_REPOSITORY);
    assert_eq!(project.read(".claude/commands/apm-1-initiate-setup.md"), "claude v1.0.0+templates.2");
}

#[tokio::test]
async fn test_missing_custom_repository() {
    let transport = transport();
    let project = TestProject::new();
    let mut orchestrator =
        project.orchestrator(&transport, ScriptedPrompter::new([Answer::Confirm(true)]));

    let options = InstallOptions {
        source: InstallSource::Custom("octo/missing".parse().unwrap()),
        ..custom_options("claude")
    };
    let err = orchestrator.resolve_and_install(options).await.unwrap_err();

    match err {
        ApmError::NetworkError {
            reason,
            ..
        } => assert!(reason.contains("GITHUB_TOKEN")),
        other => panic!("unexpected error: {other}"),
    }
}
