//! Basic CLI E2E tests.
//!
//! Each test runs the built binary with HOME pointed at a fresh temporary
//! directory so config and durable store never touch the real user profile.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_companion"))
        .args(args)
        .env("HOME", home)
        .env_remove("COMPANION_ENV")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

#[test]
fn test_catalog_filters_by_mood() {
    let home = TempDir::new().unwrap();
    let out = run_cli_success(home.path(), &["catalog", "--mood", "idle"]);
    assert!(!out.is_empty());
    for line in out.lines() {
        assert!(line.contains("idle"), "unexpected line: {line}");
    }
}

#[test]
fn test_catalog_json() {
    let home = TempDir::new().unwrap();
    let out = run_cli_success(home.path(), &["catalog", "--json", "--break-invites"]);
    let lines: serde_json::Value = serde_json::from_str(&out).unwrap();
    let ids: Vec<&str> = lines
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_str().unwrap())
        .collect();
    assert!(ids.iter().any(|id| id.starts_with("break-")));
    assert!(ids.iter().any(|id| id.starts_with("cel-")));
}

#[test]
fn test_catalog_rejects_unknown_mood() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["catalog", "--mood", "grumpy"]);
    assert_ne!(code, 0);
}

#[test]
fn test_hint_exam_tomorrow() {
    let home = TempDir::new().unwrap();
    let context = home.path().join("context.json");
    std::fs::write(
        &context,
        r#"{
            "courses": [{"name": "Algebra II", "exam_date": "2026-06-02"}],
            "tasks": [],
            "sessions": [],
            "applications": []
        }"#,
    )
    .unwrap();

    let out = run_cli_success(
        home.path(),
        &[
            "hint",
            context.to_str().unwrap(),
            "--now",
            "2026-06-01T09:00:00+02:00",
        ],
    );
    let hint: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(hint["id"], "hint-exam-tomorrow");
    assert_eq!(hint["priority"], "urgent");
}

#[test]
fn test_hint_incomplete_context_is_null() {
    let home = TempDir::new().unwrap();
    let context = home.path().join("context.json");
    std::fs::write(&context, r#"{"courses": []}"#).unwrap();
    let out = run_cli_success(home.path(), &["hint", context.to_str().unwrap()]);
    assert_eq!(out.trim(), "null");
}

#[test]
fn test_config_get_default() {
    let home = TempDir::new().unwrap();
    let out = run_cli_success(home.path(), &["config", "get", "gate.cooldown_mins"]);
    assert_eq!(out.trim(), "8");
}

#[test]
fn test_config_set_then_get() {
    let home = TempDir::new().unwrap();
    run_cli_success(home.path(), &["config", "set", "ambient.interval_mins", "30"]);
    let out = run_cli_success(home.path(), &["config", "get", "ambient.interval_mins"]);
    assert_eq!(out.trim(), "30");
}

#[test]
fn test_config_reset_single_key() {
    let home = TempDir::new().unwrap();
    run_cli_success(home.path(), &["config", "set", "gate.cooldown_mins", "12"]);
    run_cli_success(home.path(), &["config", "set", "ambient.interval_mins", "30"]);

    let out = run_cli_success(home.path(), &["config", "reset", "gate.cooldown_mins"]);
    assert_eq!(out.trim(), "gate.cooldown_mins = 8");

    let list = run_cli_success(home.path(), &["config", "list"]);
    assert!(list.lines().any(|l| l == "gate.cooldown_mins = 8"));
    assert!(list.lines().any(|l| l == "ambient.interval_mins = 30"));
}

#[test]
fn test_config_rejects_out_of_range_probability() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(
        home.path(),
        &["config", "set", "events.focus_start_probability", "2"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("between 0 and 1"), "stderr: {stderr}");
}

#[test]
fn test_config_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "display.nope", "1"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_gate_mute_and_unmute() {
    let home = TempDir::new().unwrap();
    let status = run_cli_success(home.path(), &["gate", "status"]);
    let status: serde_json::Value = serde_json::from_str(&status).unwrap();
    assert_eq!(status["muted"], false);

    run_cli_success(home.path(), &["gate", "mute-today"]);
    let status = run_cli_success(home.path(), &["gate", "status"]);
    let status: serde_json::Value = serde_json::from_str(&status).unwrap();
    assert_eq!(status["muted"], true);
    assert_eq!(status["permanently_muted"], false);

    run_cli_success(home.path(), &["gate", "unmute"]);
    let status = run_cli_success(home.path(), &["gate", "status"]);
    let status: serde_json::Value = serde_json::from_str(&status).unwrap();
    assert_eq!(status["muted"], false);
}

#[test]
fn test_simulate_bubble_lifecycle() {
    let home = TempDir::new().unwrap();
    let script = home.path().join("script.jsonl");
    std::fs::write(
        &script,
        concat!(
            r#"{"at_ms": 0, "input": {"type": "event", "event": {"type": "goal_created"}}}"#,
            "\n",
            r#"{"at_ms": 1000, "input": {"type": "event", "event": {"type": "task_completed"}}}"#,
            "\n",
        ),
    )
    .unwrap();

    let out = run_cli_success(
        home.path(),
        &[
            "simulate",
            script.to_str().unwrap(),
            "--start",
            "2026-03-09T10:00:00+01:00",
            "--seed",
            "5",
            "--tail-ms",
            "10000",
        ],
    );
    let frames: Vec<serde_json::Value> = out
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert!(frames.len() >= 3, "frames: {out}");
    assert_eq!(frames[0]["at_ms"], 0);
    assert_eq!(frames[0]["view"]["visible"], true);
    assert_eq!(frames[0]["view"]["mood"], "motivate");

    // The second event lands inside the cooldown: nothing new is queued.
    assert!(frames.iter().all(|f| f["view"]["queued"] == 0));

    let last = frames.last().unwrap();
    assert_eq!(last["view"]["visible"], false);
    assert_eq!(last["view"]["hiding"], false);
}
