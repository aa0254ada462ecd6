//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with HOME pointed at a temporary directory,
//! so the user's real configuration is never touched.

use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_haptic-timer"))
        .args(args)
        .env("HOME", home)
        .env_remove("HAPTIC_TIMER_ENV")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn event_types(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .filter_map(|v| v["type"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn test_config_get_default_duration() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "timer.duration_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "60");
}

#[test]
fn test_config_set_and_list() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "set", "timer.duration_secs", "90"]);
    assert_eq!(code, 0, "config set failed");
    assert_eq!(stdout.trim(), "timer.duration_secs = 90");

    let (code, stdout, _) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.lines().any(|l| l == "timer.duration_secs = 90"));
    assert!(stdout.lines().any(|l| l == "feedback.sounds_dir = none"));

    let (code, stdout, _) = run_cli(home.path(), &["config", "list", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["timer"]["duration_secs"], 90);
}

#[test]
fn test_config_keys_lists_leaf_keys() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "keys"]);
    assert_eq!(code, 0);
    let keys: Vec<&str> = stdout.lines().collect();
    assert!(keys.contains(&"timer.duration_secs"));
    assert!(keys.contains(&"feedback.haptics"));
    assert!(keys.contains(&"intervals.every_5s"));
    assert!(!keys.contains(&"timer"));
}

#[test]
fn test_config_set_rejects_out_of_range_duration() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["config", "set", "timer.duration_secs", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_get_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["config", "get", "timer.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key: timer.nope"));
    assert!(stderr.contains("timer.duration_secs"));

    // a section is not a settable key
    let (code, _, stderr) = run_cli(home.path(), &["config", "get", "timer"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("valid keys"));
}

#[test]
fn test_config_set_unknown_key_lists_valid_keys() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["config", "set", "feedback.volume", "3"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key: feedback.volume"));
    assert!(stderr.contains("feedback.muted"));
}

#[test]
fn test_intervals_disable_and_list() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["intervals", "disable", "5s"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "every_5s: off");

    let (code, stdout, _) = run_cli(home.path(), &["intervals", "list", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["every_5s"], false);
    assert_eq!(parsed["every_second"], true);
}

#[test]
fn test_intervals_rejects_unknown_tag() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["intervals", "enable", "every_7s"]);
    assert_ne!(code, 0);
}

#[test]
fn test_plan_json() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["plan", "12", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["tier"], "tick_1");
    let fallback = parsed["fallback"].as_array().unwrap();
    // boundaries 11..=1 plus the terminal notification
    assert_eq!(fallback.len(), 12);
    assert_eq!(fallback[11]["body"], "Timer finished!");
}

#[test]
fn test_sounds_writes_wav_files() {
    let home = tempfile::tempdir().unwrap();
    let out = home.path().join("wav");
    let (code, _, _) = run_cli(home.path(), &["sounds", "--dir", out.to_str().unwrap()]);
    assert_eq!(code, 0);
    for name in ["tick_1s.wav", "tick_5s.wav", "tick_10s.wav", "tick_60s.wav", "tick_end.wav"] {
        assert!(out.join(name).is_file(), "{name} missing");
    }
}

#[test]
fn test_run_counts_down_and_exits() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["config", "set", "notifications.enabled", "false"]);

    let (code, stdout, _) = run_cli(home.path(), &["run", "--duration", "2", "--start"]);
    assert_eq!(code, 0);
    let types = event_types(&stdout);
    assert_eq!(types.first().map(String::as_str), Some("timer_started"));
    assert!(types.iter().any(|t| t == "tick"));
    assert!(types.iter().any(|t| t == "timer_finished"));
}

#[test]
fn test_run_without_start_exits_on_eof() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["run", "--duration", "5"]);
    assert_eq!(code, 0);
    assert_eq!(event_types(&stdout), vec!["state_snapshot"]);
}
