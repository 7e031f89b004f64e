use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn apm(config: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("apm").unwrap();
    cmd.env("APM_CONFIG_PATH", config).env("GITHUB_TOKEN", "test-token").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    apm(&temp.path().join("config.toml"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("custom"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_path_honours_environment() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("apm-config.toml");
    apm(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("apm-config.toml"));
}

#[test]
fn test_config_flag_overrides_environment() {
    let temp = TempDir::new().unwrap();
    let flag = temp.path().join("flag.toml");
    apm(&temp.path().join("env.toml"))
        .arg("--config")
        .arg(&flag)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flag.toml"));
}

#[test]
fn test_config_add_then_list() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");

    apm(&config).args(["config", "add", "octo/templates", "--trust"]).assert().success();
    assert!(config.exists());

    apm(&config)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("octo/templates"))
        .stdout(predicate::str::contains("trusted"));
}

#[test]
fn test_config_add_rejects_malformed_repository() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");

    apm(&config)
        .args(["config", "add", "not-a-repo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not-a-repo"));
    assert!(!config.exists());
}

#[test]
fn test_update_outside_project_fails() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    std::fs::create_dir_all(&project).unwrap();

    apm(&temp.path().join("config.toml"))
        .current_dir(&project)
        .arg("update")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No APM installation found"));
}

#[test]
fn test_custom_tag_requires_repo() {
    let temp = TempDir::new().unwrap();
    apm(&temp.path().join("config.toml"))
        .args(["custom", "--tag", "v1.0.0+templates.1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--repo"));
}
