// LogSlice - tests/e2e_cli.rs
//
// Exit codes of the logslice binary for rejected input.

use std::path::Path;
use std::process::{Command, Output};

fn logslice(input: &Path, from: &str, to: &str) -> Output {
    let config = tempfile::tempdir().unwrap();
    Command::new(env!("CARGO_BIN_EXE_logslice"))
        .args(["-f", from, "-t", to, "-i"])
        .arg(input)
        .arg("--config")
        .arg(write_config(config.path()))
        .output()
        .unwrap()
}

/// An empty config file so the user's own config is never read.
fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, "").unwrap();
    path
}

#[test]
fn test_input_file_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("LogFile-1.log");
    std::fs::write(&file, "2020-08-22T21:40:10.000Z,INFO,x\n").unwrap();

    let out = logslice(&file, "2020-08-22T21:40:10.000Z", "2020-08-22T21:40:11.000Z");
    assert_eq!(out.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("not a directory"), "stdout: {stdout}");
}

#[test]
fn test_missing_input_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = logslice(
        &dir.path().join("gone"),
        "2020-08-22T21:40:10.000Z",
        "2020-08-22T21:40:11.000Z",
    );
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn test_inverted_range_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = logslice(dir.path(), "2020-08-22T21:40:11.000Z", "2020-08-22T21:40:10.000Z");
    assert_eq!(out.status.code(), Some(2));
}
