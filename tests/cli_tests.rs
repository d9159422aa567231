//! CLI integration tests

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// The binary with config and data isolated under `home`
fn pocket_recorder(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pocket-recorder").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("POCKET_RECORDER_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn write_recording(dir: &Path, name: &str, bytes: usize) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), vec![0u8; bytes]).unwrap();
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    pocket_recorder(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("record"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("rename"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("daemon"))
        .stdout(predicate::str::contains("--dir"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    pocket_recorder(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pocket-recorder"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_subcommand_is_usage_error() {
    let home = TempDir::new().unwrap();
    pocket_recorder(home.path()).assert().code(2);
}

#[test]
fn config_path_command() {
    let home = TempDir::new().unwrap();
    pocket_recorder(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pocket-recorder"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();
    pocket_recorder(home.path())
        .args(["config", "set", "quality", "low"])
        .assert()
        .success();

    pocket_recorder(home.path())
        .args(["config", "get", "quality"])
        .assert()
        .success()
        .stdout("low\n");
}

#[test]
fn config_init_twice_fails() {
    let home = TempDir::new().unwrap();
    pocket_recorder(home.path())
        .args(["config", "init"])
        .assert()
        .success();

    pocket_recorder(home.path())
        .args(["config", "init"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn list_empty_directory_creates_it() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("audio");

    pocket_recorder(home.path())
        .args(["list", "--dir"])
        .arg(&dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("No recordings yet"));

    assert!(dir.is_dir());
}

#[test]
fn list_shows_newest_first() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("audio");
    write_recording(&dir, "recording-1700000000000.wav", 100);
    write_recording(&dir, "recording-1700000500000.wav", 2048);
    write_recording(&dir, "notes.txt", 10);

    let output = pocket_recorder(home.path())
        .args(["list", "--dir"])
        .arg(&dir)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "unexpected listing: {}", stdout);
    assert!(lines[0].ends_with("recording-1700000500000.wav"));
    assert!(lines[0].contains("2.0 KB"));
    assert!(lines[1].ends_with("recording-1700000000000.wav"));
    assert!(!stdout.contains("notes.txt"));
}

#[test]
fn env_dir_is_used() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("from-env");
    write_recording(&dir, "background-recording-1700000000000.wav", 10);

    pocket_recorder(home.path())
        .arg("list")
        .env("POCKET_RECORDER_DIR", &dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("(background)"));
}

#[test]
fn rename_persists_title() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("audio");
    write_recording(&dir, "recording-1700000000000.wav", 10);

    pocket_recorder(home.path())
        .args(["rename", "recording-1700000000000.wav", "Team sync", "--dir"])
        .arg(&dir)
        .assert()
        .success();

    pocket_recorder(home.path())
        .args(["list", "--dir"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Team sync"));

    assert!(dir.join("titles.json").is_file());
    assert!(dir.join("recording-1700000000000.wav").is_file());
}

#[test]
fn rename_blank_title_fails() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("audio");
    write_recording(&dir, "recording-1700000000000.wav", 10);

    pocket_recorder(home.path())
        .args(["rename", "recording-1700000000000.wav", "   ", "--dir"])
        .arg(&dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn delete_removes_file() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("audio");
    write_recording(&dir, "recording-1700000000000.wav", 10);

    pocket_recorder(home.path())
        .args(["delete", "recording-1700000000000.wav", "--dir"])
        .arg(&dir)
        .assert()
        .success();

    assert!(!dir.join("recording-1700000000000.wav").exists());
}

#[test]
fn delete_unknown_recording_fails() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("audio");

    pocket_recorder(home.path())
        .args(["delete", "recording-1.wav", "--dir"])
        .arg(&dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No recording named"));
}
