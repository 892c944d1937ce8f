//! Basic CLI tests for the lgbridge command-line interface.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MANIFEST: &str = r#"{
    "install_locations": [
        { "version": "2.4.0", "path": "/opt/bridge-2.4.0" },
        { "version": "2.6.2", "path": "/opt/bridge-2.6.2" },
        { "version": "3.0.0", "path": "/opt/bridge-3.0.0" }
    ]
}"#;

fn lgbridge() -> Command {
    let mut cmd = Command::cargo_bin("lgbridge").unwrap();
    cmd.env_remove("LGBRIDGE_SETTINGS_PATH")
        .env_remove("LGBRIDGE_LOG_JSON")
        .env_remove("RUST_LOG");
    cmd
}

fn manifest(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("settings.json");
    std::fs::write(&path, MANIFEST).unwrap();
    path
}

/// Test that the CLI binary exists and shows help.
#[test]
fn test_cli_help() {
    lgbridge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("platform"))
        .stdout(predicate::str::contains("installs"))
        .stdout(predicate::str::contains("locate"))
        .stdout(predicate::str::contains("probe"));
}

#[test]
fn test_cli_version() {
    lgbridge()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lgbridge"));
}

/// Clap exits with code 2 when the subcommand is missing.
#[test]
fn test_no_subcommand_shows_error() {
    lgbridge().assert().failure().code(2);
}

#[test]
fn test_platform_reports_library_name() {
    lgbridge()
        .arg("platform")
        .assert()
        .success()
        .stdout(predicate::str::contains("bridge_inproc"));
}

#[test]
fn test_locate_exact_version() {
    let dir = TempDir::new().unwrap();
    let settings = manifest(&dir);

    lgbridge()
        .args(["locate", "--bridge-version", "2.4.0", "--settings"])
        .arg(&settings)
        .assert()
        .success()
        .stdout(predicate::str::contains("/opt/bridge-2.4.0"));
}

#[test]
fn test_locate_falls_back_within_major() {
    let dir = TempDir::new().unwrap();
    let settings = manifest(&dir);

    lgbridge()
        .args(["locate", "--bridge-version", "2.5.1", "--settings"])
        .arg(&settings)
        .assert()
        .success()
        .stdout(predicate::str::contains("/opt/bridge-2.6.2"));
}

#[test]
fn test_locate_settings_from_environment() {
    let dir = TempDir::new().unwrap();
    let settings = manifest(&dir);

    lgbridge()
        .env("LGBRIDGE_SETTINGS_PATH", &settings)
        .args(["locate", "--bridge-version", "3.0.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/opt/bridge-3.0.0"));
}

#[test]
fn test_locate_without_match_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let settings = manifest(&dir);

    lgbridge()
        .args(["locate", "--bridge-version", "4.0.0", "--settings"])
        .arg(&settings)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No Bridge install matches version 4.0.0"));
}

#[test]
fn test_locate_min_version_filters_installs() {
    let dir = TempDir::new().unwrap();
    let settings = manifest(&dir);

    lgbridge()
        .args(["locate", "--bridge-version", "2.4.0", "--min-version", "2.5.0", "--settings"])
        .arg(&settings)
        .assert()
        .success()
        .stdout(predicate::str::contains("/opt/bridge-2.6.2"));
}

#[test]
fn test_installs_json() {
    let dir = TempDir::new().unwrap();
    let settings = manifest(&dir);

    let output = lgbridge()
        .args(["installs", "--json", "--settings"])
        .arg(&settings)
        .output()
        .unwrap();
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["version"], "2.4.0");
    assert_eq!(entries[2]["path"], "/opt/bridge-3.0.0");
}

#[test]
fn test_installs_with_missing_manifest() {
    let dir = TempDir::new().unwrap();

    lgbridge()
        .args(["installs", "--settings"])
        .arg(dir.path().join("settings.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No Bridge installs found."));
}

#[test]
fn test_probe_without_install_fails() {
    let dir = TempDir::new().unwrap();

    lgbridge()
        .args(["probe", "--settings"])
        .arg(dir.path().join("settings.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to initialize Bridge"));
}

#[test]
fn test_probe_rejects_path_and_version_together() {
    lgbridge()
        .args(["probe", "--install-path", "/opt/bridge", "--bridge-version", "2.5.1"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_locate_with_directory_as_settings_is_no_match() {
    let dir = TempDir::new().unwrap();

    lgbridge()
        .args(["locate", "--settings"])
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No Bridge install matches"));
}
