use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[device]
variant = "glove"
tick_hz = 200

[buttons]
long_press_ms = 5000

[protocol]
default = "junxion"
board_id = 3

[channels.distance]
raw_min = 0.0
raw_max = 1300.0
min_std_dev = 5.0
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
fn help_shows_usage() {
    Command::cargo_bin("glove_cli")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[rstest]
fn check_accepts_valid_config() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    Command::cargo_bin("glove_cli")
        .unwrap()
        .args(["--config", cfg.to_str().unwrap(), "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config OK"));
}

#[rstest]
fn check_rejects_bad_board_id() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    fs::write(&path, "[protocol]\nboard_id = 9\n").unwrap();
    Command::cargo_bin("glove_cli")
        .unwrap()
        .args(["--config", path.to_str().unwrap(), "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("board_id"));
}

#[rstest]
fn check_rejects_bad_calibration_headers() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let cal = dir.path().join("cal.csv");
    fs::write(&cal, "name,min,max\nterrible,0,1\n").unwrap();
    Command::cargo_bin("glove_cli")
        .unwrap()
        .args([
            "--config",
            cfg.to_str().unwrap(),
            "--calibration",
            cal.to_str().unwrap(),
            "check",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("headers"));
}

#[rstest]
fn run_emits_telemetry_lines() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let output = Command::cargo_bin("glove_cli")
        .unwrap()
        .args([
            "--config",
            cfg.to_str().unwrap(),
            "run",
            "--ticks",
            "5",
            "--telemetry",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().filter(|l| l.starts_with('{')).collect();
    assert_eq!(lines.len(), 5);
    for (i, line) in lines.iter().enumerate() {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(v["tick"], (i + 1) as u64);
        assert!(v["stack_depth"].as_u64().unwrap() >= 1);
        assert!(v.get("wire_bytes").is_some());
    }
}
