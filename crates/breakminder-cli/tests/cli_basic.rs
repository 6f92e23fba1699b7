//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(dir: &TempDir, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_breakminder"))
        .args(args)
        .env("BREAKMINDER_DATA_DIR", dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn list_json(dir: &TempDir) -> Vec<serde_json::Value> {
    let (code, stdout, stderr) = run_cli(dir, &["reminder", "list", "--json"]);
    assert_eq!(code, 0, "list failed: {stderr}");
    serde_json::from_str::<serde_json::Value>(&stdout)
        .expect("list --json prints JSON")
        .as_array()
        .cloned()
        .expect("list --json prints an array")
}

#[test]
fn test_empty_list() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&dir, &["reminder", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("no reminders"));
    assert!(list_json(&dir).is_empty());
}

#[test]
fn test_add_and_list() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, stderr) = run_cli(
        &dir,
        &["reminder", "add", "--title", "Stretch", "--message", "Stand up", "--every", "20m"],
    );
    assert_eq!(code, 0, "add failed: {stderr}");
    assert!(stdout.contains("added reminder 0"));

    let rows = list_json(&dir);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Stretch");
    assert_eq!(rows[0]["message"], "Stand up");
    assert_eq!(rows[0]["state"], "armed");
    assert_eq!(rows[0]["editing"], false);
    let remaining = rows[0]["remaining_ms"].as_i64().unwrap();
    assert!(remaining > 0 && remaining <= 20 * 60 * 1000);

    let (_, stdout, _) = run_cli(&dir, &["reminder", "list"]);
    assert!(stdout.contains("Stretch"));
    assert!(stdout.contains("next in"));
}

#[test]
fn test_pause_and_resume() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["reminder", "add", "--title", "Eyes", "--every", "30m"]);

    let (code, stdout, _) = run_cli(&dir, &["reminder", "pause", "0"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("paused"));
    assert_eq!(list_json(&dir)[0]["state"], "paused");

    // still paused after another load
    let (_, stdout, _) = run_cli(&dir, &["reminder", "pause", "0"]);
    assert!(stdout.contains("nothing to pause"));

    let (code, stdout, _) = run_cli(&dir, &["reminder", "resume", "0"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("resumed"));
    assert_eq!(list_json(&dir)[0]["state"], "armed");
}

#[test]
fn test_remove() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["reminder", "add", "--title", "First"]);
    run_cli(&dir, &["reminder", "add", "--title", "Second"]);

    let (code, stdout, _) = run_cli(&dir, &["reminder", "remove", "0"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("removed 'First'"));

    let rows = list_json(&dir);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Second");
    assert_eq!(rows[0]["index"], 0);
}

#[test]
fn test_bad_index_fails() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&dir, &["reminder", "pause", "3"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("no reminder at index 3"));
}

#[test]
fn test_invalid_interval_fails() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&dir, &["reminder", "add", "--every", "0m"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error"));
    assert!(list_json(&dir).is_empty());
}

#[test]
fn test_out_of_range_spans_fail_cleanly() {
    let dir = TempDir::new().unwrap();
    // Representable, but longer than a reminder may wait.
    let (code, _, stderr) = run_cli(&dir, &["reminder", "add", "--every", "3000000000h"]);
    assert_eq!(code, 1, "stderr: {stderr}");
    assert!(stderr.contains("at most 365 days"), "stderr: {stderr}");

    // Not representable at all: rejected while parsing arguments.
    let (code, _, stderr) = run_cli(&dir, &["reminder", "add", "--every", "99999999999999999h"]);
    assert_eq!(code, 2, "stderr: {stderr}");
    assert!(stderr.contains("out of range"), "stderr: {stderr}");

    assert!(list_json(&dir).is_empty());
}

#[test]
fn test_out_of_range_config_default_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let (code, _, _) = run_cli(
        &dir,
        &["config", "set", "defaults.interval_min", "9000000000000000000"],
    );
    assert_eq!(code, 0);
    let (code, _, stderr) = run_cli(&dir, &["reminder", "add", "--title", "Default"]);
    assert_eq!(code, 1, "stderr: {stderr}");
    assert!(stderr.contains("out of range"), "stderr: {stderr}");
}

#[test]
fn test_cancel_is_not_offered() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["reminder", "add", "--title", "Stay"]);
    let (code, _, _) = run_cli(&dir, &["reminder", "cancel", "0"]);
    assert_ne!(code, 0);
    assert_eq!(list_json(&dir)[0]["state"], "armed");
}

#[test]
fn test_edit_flow() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["reminder", "add", "--title", "Water", "--every", "45m"]);

    let (code, _, _) = run_cli(&dir, &["edit", "start", "0"]);
    assert_eq!(code, 0);
    let rows = list_json(&dir);
    assert_eq!(rows[0]["editing"], true);
    assert_eq!(rows[0]["state"], "idle");

    let (code, stdout, stderr) = run_cli(&dir, &["edit", "finish", "--title", "Drink water"]);
    assert_eq!(code, 0, "finish failed: {stderr}");
    assert!(stdout.contains("saved"));

    let rows = list_json(&dir);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Drink water");
    assert_eq!(rows[0]["editing"], false);
    assert_eq!(rows[0]["state"], "armed");
}

#[test]
fn test_edit_finish_without_start_fails() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["reminder", "add"]);
    let (code, _, stderr) = run_cli(&dir, &["edit", "finish", "--title", "x"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("no reminder is being edited"));
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&dir, &["config", "get", "defaults.interval_min"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "30");

    let (code, _, stderr) = run_cli(&dir, &["config", "set", "defaults.interval_min", "45"]);
    assert_eq!(code, 0, "set failed: {stderr}");
    let (_, stdout, _) = run_cli(&dir, &["config", "get", "defaults.interval_min"]);
    assert_eq!(stdout.trim(), "45");

    let (code, _, _) = run_cli(&dir, &["config", "get", "nope.missing"]);
    assert_ne!(code, 0);
}

#[test]
fn test_watch_delivers_due_reminder() {
    let dir = TempDir::new().unwrap();
    run_cli(
        &dir,
        &[
            "reminder", "add", "--title", "Break", "--message", "Look away", "--every", "1h",
            "--first-after", "1s",
        ],
    );

    let (code, stdout, stderr) = run_cli(&dir, &["watch", "--poll-ms", "200", "--duration-secs", "3"]);
    assert_eq!(code, 0, "watch failed: {stderr}");
    assert_eq!(stdout.matches("Break: Look away").count(), 1, "stdout: {stdout}");

    // the ignored fire is persisted
    let rows = list_json(&dir);
    assert_eq!(rows[0]["ignore_count"], 1);
    assert_eq!(rows[0]["ignored"], true);
}

#[test]
fn test_ack_and_ack_ignored_after_fire() {
    let dir = TempDir::new().unwrap();
    for title in ["Eyes", "Legs"] {
        run_cli(
            &dir,
            &["reminder", "add", "--title", title, "--every", "1h", "--first-after", "1s"],
        );
    }
    let (code, _, stderr) = run_cli(&dir, &["watch", "--poll-ms", "200", "--duration-secs", "3"]);
    assert_eq!(code, 0, "watch failed: {stderr}");
    let rows = list_json(&dir);
    assert!(rows.iter().all(|r| r["ignored"] == true));

    let (code, _, stderr) = run_cli(&dir, &["reminder", "ack", "0"]);
    assert_eq!(code, 0, "ack failed: {stderr}");
    let (code, _, stderr) = run_cli(&dir, &["reminder", "ack-ignored", "1"]);
    assert_eq!(code, 0, "ack-ignored failed: {stderr}");

    // Both back on the full hour instead of the 5 minute penalty.
    for row in list_json(&dir) {
        assert_eq!(row["ignored"], false);
        assert_eq!(row["ignore_count"], 1);
        assert_eq!(row["state"], "armed");
        assert!(row["remaining_ms"].as_i64().unwrap() > 50 * 60 * 1000);
    }
}
