use std::fs;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_swing_cli"))
}

#[test]
fn scan_fixture_succeeds() {
    let output = cli()
        .args(["scan", "--fixture", "full_swing"])
        .output()
        .expect("failed to run swing_cli scan");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("scan report JSON payload");
    assert_eq!(json["fixture"], "full_swing");
    assert_eq!(json["sequences"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["used_fallback"], false);
}

#[test]
fn stdout_carries_only_json() {
    let output = cli()
        .args(["scan", "--fixture", "full_swing"])
        .env("RUST_LOG", "swing_highlights=debug")
        .output()
        .expect("failed to run swing_cli scan");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert!(
        stdout.trim_start().starts_with('{'),
        "log lines leaked into stdout: {stdout}"
    );
    assert!(!stdout.contains("[OfflineScan]"));

    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(
        stderr.contains("[OfflineScan]"),
        "expected scan log on stderr, got {stderr}"
    );
}

#[test]
fn scan_fixture_detects_mismatch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fixture = serde_json::json!({
        "name": "wrong_expectation",
        "duration": 4.0,
        "labels": ["Other", "Ready", "EndSwing", "Other"],
        "expect": { "sequences": [] }
    });
    fs::write(
        dir.path().join("wrong_expectation.json"),
        fixture.to_string(),
    )
    .expect("write fixture");

    let output = cli()
        .arg("--fixtures-dir")
        .arg(dir.path())
        .args(["scan", "--fixture", "wrong_expectation"])
        .output()
        .expect("failed to run mismatch scan");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(
        stderr.contains("\"failures\""),
        "expected diff JSON in stderr, got {stderr}"
    );
}

#[test]
fn replay_fixture_emits_trigger_commands() {
    let output = cli()
        .args(["replay", "--fixture", "full_swing"])
        .output()
        .expect("failed to run replay");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let commands: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("JSON line"))
        .collect();
    let starts: Vec<&Value> = commands
        .iter()
        .filter(|c| c["type"] == "start_clip")
        .collect();
    assert_eq!(starts.len(), 1);
    assert_eq!(starts[0]["timestamp"], 6.125);
    assert_eq!(
        commands.iter().filter(|c| c["type"] == "stop_clip").count(),
        1
    );
}

#[test]
fn plan_filters_by_course() {
    let output = cli()
        .args(["plan", "--course", "Pebble Beach"])
        .output()
        .expect("failed to run plan");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("highlight outcome JSON");
    assert_eq!(json["output_ref"], "memory://highlight-1");
    assert_eq!(json["plan"]["segments"].as_array().map(Vec::len), Some(3));
}

#[test]
fn unknown_fixture_fails() {
    let output = cli()
        .args(["scan", "--fixture", "no_such_fixture"])
        .output()
        .expect("failed to run scan");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn dump_fixtures_lists_assets() {
    let output = cli()
        .arg("dump-fixtures")
        .output()
        .expect("failed to run dump-fixtures");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert!(
        stdout.contains("full_swing"),
        "expected fixture listing, got {stdout}"
    );
}
