//! End-to-end tests of the `runtime_bundler` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bundler() -> Command {
    let mut cmd = Command::cargo_bin("runtime_bundler").unwrap();
    cmd.env_remove("RUNTIME_BUNDLER_TYPE");
    cmd
}

#[test]
fn test_list_shows_registry() {
    bundler()
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("deb"))
        .stdout(predicate::str::contains("linux.app"))
        .stdout(predicate::str::contains("windows.service"));
}

#[test]
fn test_malformed_define_fails() {
    bundler()
        .args(["-D", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ID=VALUE"));
}

#[test]
fn test_nothing_requested_succeeds() {
    bundler().args(["--type", "none"]).assert().success();
}

#[test]
fn test_config_file_request() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bundle.toml");
    std::fs::write(
        &config,
        "[bundle]\ntype = \"none\"\n\n[params]\n\"application.name\" = \"Demo\"\n",
    )
    .unwrap();
    bundler().arg("--config").arg(&config).assert().success();
}

#[test]
fn test_missing_config_file() {
    bundler()
        .args(["--config", "does-not-exist.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_broken_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bundle.toml");
    std::fs::write(&config, "[bundle\n").unwrap();
    bundler()
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Check the syntax"));
}

#[cfg(not(target_os = "macos"))]
#[test]
fn test_foreign_bundler_skipped_in_report() {
    let dir = TempDir::new().unwrap();
    let report = dir.path().join("report.json");
    bundler()
        .args(["--type", "mac.daemon", "-D", "identifier=com.example.demo"])
        .arg("--output")
        .arg(dir.path().join("out"))
        .arg("--report")
        .arg(&report)
        .assert()
        .code(1);
    let json = std::fs::read_to_string(&report).unwrap();
    assert!(json.contains("\"mac.daemon\""));
    assert!(json.contains("\"skipped\""));
}
