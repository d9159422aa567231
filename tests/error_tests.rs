//! Error scenario integration tests

use std::process::Command;

fn pocket_recorder_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pocket-recorder"));
    cmd.env("HOME", "/nonexistent")
        .env("XDG_CONFIG_HOME", "/nonexistent")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn config_get_unknown_key() {
    let output = pocket_recorder_bin()
        .args(["config", "get", "unknown_key"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unknown key") && stderr.contains("Valid keys"),
        "Expected error about unknown key, got: {}",
        stderr
    );
}

#[test]
fn config_set_invalid_tick() {
    let output = pocket_recorder_bin()
        .args(["config", "set", "tick", "5s"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("tick"),
        "Expected error about tick, got: {}",
        stderr
    );
}

#[test]
fn config_set_invalid_boolean() {
    let output = pocket_recorder_bin()
        .args(["config", "set", "background.enabled", "maybe"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("true") || stderr.contains("false"),
        "Expected error about invalid boolean, got: {}",
        stderr
    );
}

#[test]
fn config_set_invalid_permission() {
    let output = pocket_recorder_bin()
        .args(["config", "set", "permissions.location", "always"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("foreground"), "got: {}", stderr);
}

#[test]
fn config_list_with_no_file() {
    let output = pocket_recorder_bin()
        .args(["config", "list"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("recordings_dir: (not set)"));
    assert!(stdout.contains("permissions.location"));
}

#[test]
fn record_invalid_tick_is_usage_error() {
    let output = pocket_recorder_bin()
        .args(["record", "--tick", "5s"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid tick"), "got: {}", stderr);
}

#[test]
fn record_invalid_quality_is_usage_error() {
    let output = pocket_recorder_bin()
        .args(["record", "--quality", "medium"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn record_with_denied_microphone_fails() {
    let home = tempfile::tempdir().unwrap();
    let set = Command::new(env!("CARGO_BIN_EXE_pocket-recorder"))
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .args(["config", "set", "permissions.microphone", "denied"])
        .output()
        .expect("Failed to execute command");
    assert!(set.status.success());

    let output = Command::new(env!("CARGO_BIN_EXE_pocket-recorder"))
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env("NO_COLOR", "1")
        .args(["record", "--dir"])
        .arg(home.path().join("audio"))
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("permission denied"), "got: {}", stderr);
}
