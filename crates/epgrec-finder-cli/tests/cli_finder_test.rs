#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use std::path::PathBuf;

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::{PredicateBooleanExt, predicate};

fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_help_lists_flags() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("epgrec-program-finder");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--since"));
}

#[test]
fn test_version_flag() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("epgrec-program-finder");
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("epgrec-program-finder"))
        .stdout(predicate::str::contains("rev:"));
}

#[test]
fn test_missing_config_flag() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("epgrec-program-finder");
    cmd.assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--config"));
}

#[test]
fn test_unknown_flag_exits_with_one() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("epgrec-program-finder");
    cmd.args(["-c", "x.toml", "--bogus"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--bogus"));
}

#[test]
fn test_nonexistent_config_file() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("epgrec-program-finder");
    cmd.arg("--config")
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn test_malformed_config_file() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[database\nusername = ");

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("epgrec-program-finder");
    cmd.arg("-c")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse"));
}

#[test]
fn test_invalid_since() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[database]\nusername = \"u\"\ndbname = \"d\"\n");

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("epgrec-program-finder");
    cmd.arg("-c")
        .arg(&path)
        .args(["-s", "next week"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid --since datetime"));
}

#[test]
fn test_unsupported_driver() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "[database]\ndriver = \"postgres\"\nusername = \"u\"\npassword = \"hunter2\"\ndbname = \"d\"\n",
    );

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("epgrec-program-finder");
    cmd.arg("-c")
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unsupported database driver: postgres"))
        .stderr(predicate::str::contains("hunter2").not());
}
