//! CLI integration tests for the `opsboard` binary.
//!
//! Uses `assert_cmd` to spawn the binary and verify exit codes, stdout
//! content, and stderr content. Fixtures live in `tests/fixtures`; tests
//! that write files work on copies in a temporary directory.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> String {
    fixtures().join(name).display().to_string()
}

/// Helper: create a Command for the `opsboard` binary with logging quiet.
fn opsboard() -> Command {
    let mut cmd = cargo_bin_cmd!("opsboard");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).expect("stdout is JSON")
}

fn write_config(dir: &TempDir, body: &str) -> String {
    let path = dir.path().join("opsboard.toml");
    fs::write(&path, body).unwrap();
    path.display().to_string()
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    opsboard()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Opsboard reward and progression engine",
        ));
}

#[test]
fn version_exits_0() {
    opsboard()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("opsboard"));
}

#[test]
fn unknown_subcommand_fails() {
    opsboard().arg("leaderboard").assert().failure();
}

// ──────────────────────────────────────────────
// 2. reward
// ──────────────────────────────────────────────

#[test]
fn reward_beginner_development_medium_is_85() {
    opsboard()
        .args(["reward", &fixture("operation_login.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("op-login: 85 XP"))
        .stdout(predicate::str::contains("no deadline"));
}

#[test]
fn reward_json_includes_breakdown() {
    let json = stdout_json(opsboard().args([
        "reward",
        &fixture("operation_audit.json"),
        "--at",
        "2026-03-01T00:00:00Z",
        "--output",
        "json",
    ]));
    assert_eq!(json["xp"], 364);
    assert_eq!(json["breakdown"]["timeliness"], "early");
    assert_eq!(json["breakdown"]["base_xp"], 200);
    assert_eq!(json["breakdown"]["priority_bonus"], 100);
}

#[test]
fn reward_late_completion_is_penalised() {
    let json = stdout_json(opsboard().args([
        "reward",
        &fixture("operation_audit.json"),
        "--at",
        "2026-03-11T00:00:00Z",
        "--output",
        "json",
    ]));
    // 220 - 22 + 100
    assert_eq!(json["xp"], 298);
    assert_eq!(json["breakdown"]["timeliness"], "late");
}

#[test]
fn reward_unknown_category_fails() {
    opsboard()
        .args(["reward", &fixture("operation_unknown_category.json")])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown category 'astrology'"));
}

#[test]
fn reward_missing_file_fails() {
    opsboard()
        .args(["reward", "does/not/exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("operation file not found"));
}

#[test]
fn reward_bad_timestamp_fails() {
    opsboard()
        .args([
            "reward",
            &fixture("operation_login.json"),
            "--at",
            "yesterday",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --at timestamp"));
}

#[test]
fn reward_error_as_json() {
    let out = opsboard()
        .args([
            "reward",
            "does/not/exist.json",
            "--output",
            "json",
        ])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).expect("stderr is JSON");
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[test]
fn quiet_suppresses_error_output() {
    opsboard()
        .args(["reward", "does/not/exist.json", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::is_empty());
}

// ──────────────────────────────────────────────
// 3. rank
// ──────────────────────────────────────────────

#[test]
fn rank_thresholds() {
    opsboard()
        .args(["rank", "999"])
        .assert()
        .success()
        .stdout(predicate::str::contains("apprentice (99%), 1 XP to journeyman"));
    opsboard()
        .args(["rank", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("journeyman"));
    opsboard()
        .args(["rank", "15000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("master (top rank)"));
}

#[test]
fn rank_json_top_tier_has_no_next() {
    let json = stdout_json(opsboard().args(["rank", "999999", "--output", "json"]));
    assert_eq!(json["progress"]["rank"], "master");
    assert!(json["progress"]["xp_to_next"].is_null());
    assert_eq!(json["progress"]["percent"], 100);
}

#[test]
fn rank_rejects_negative_xp() {
    opsboard().args(["rank", "--", "-5"]).assert().failure();
}

// ──────────────────────────────────────────────
// 4. board
// ──────────────────────────────────────────────

#[test]
fn board_orders_matching_operations_by_urgency() {
    let out = opsboard()
        .args([
            "board",
            &fixture("operations.json"),
            "--skills",
            "rust,sql",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "{text}");
    assert!(lines[0].starts_with("op-schema"));
    assert!(lines[1].starts_with("op-index"));
    assert!(lines[2].starts_with("op-login"));
    assert!(!text.contains("op-logo"));
    assert!(!text.contains("op-done"));
}

#[test]
fn board_without_skills_is_empty() {
    opsboard()
        .args(["board", &fixture("operations.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("no matching operations"));
}

#[test]
fn board_json_with_limit() {
    let json = stdout_json(opsboard().args([
        "board",
        &fixture("operations.json"),
        "--skills",
        "rust,sql,figma",
        "--limit",
        "2",
        "--output",
        "json",
    ]));
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["operation"]["id"], "op-schema");
    assert_eq!(items[1]["operation"]["id"], "op-logo");
    assert!(items[0]["preview_xp"].as_u64().unwrap() >= 10);
}

#[test]
fn board_any_status_includes_completed() {
    let json = stdout_json(opsboard().args([
        "board",
        &fixture("operations.json"),
        "--skills",
        "rust",
        "--status",
        "any",
        "--output",
        "json",
    ]));
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["operation"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["op-done", "op-login"]);
}

#[test]
fn board_category_and_search_filters() {
    let json = stdout_json(opsboard().args([
        "board",
        &fixture("operations.json"),
        "--skills",
        "rust,sql,figma",
        "--category",
        "development",
        "--search",
        "INDEX",
        "--output",
        "json",
    ]));
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["operation"]["id"], "op-index");
}

#[test]
fn board_unknown_status_fails() {
    opsboard()
        .args([
            "board",
            &fixture("operations.json"),
            "--status",
            "stalled",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown status 'stalled'"));
}

// ──────────────────────────────────────────────
// 5. award
// ──────────────────────────────────────────────

fn profile_copy(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("profile.json");
    fs::copy(fixtures().join("profile.json"), &path).unwrap();
    path
}

#[test]
fn award_updates_profile_file() {
    let dir = TempDir::new().unwrap();
    let profile = profile_copy(&dir);

    opsboard()
        .args([
            "award",
            &profile.display().to_string(),
            &fixture("operation_login.json"),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "awarded 85 XP to operator-1 for op-login (total 1035 XP)",
        ))
        .stdout(predicate::str::contains("rank up: apprentice -> journeyman"));

    let updated: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&profile).unwrap()).unwrap();
    assert_eq!(updated["xp"], 1035);
    assert_eq!(updated["active_operations"], 0);
    assert_eq!(updated["completed_operations"], 4);
    assert_eq!(updated["display_name"], "Ada");
    assert!(updated.get("rank").is_none());
}

#[test]
fn award_json_credits_tokens() {
    let dir = TempDir::new().unwrap();
    let profile = profile_copy(&dir);

    let json = stdout_json(opsboard().args([
        "award",
        &profile.display().to_string(),
        &fixture("operation_audit.json"),
        "--at",
        "2026-03-01T00:00:00Z",
        "--output",
        "json",
    ]));
    assert_eq!(json["xp_earned"], 364);
    assert_eq!(json["total_xp"], 1314);
    assert_eq!(json["tokens"], "40");
    assert_eq!(json["currency"], "OPS");
    assert_eq!(json["awarded_at"], "2026-03-01T00:00:00Z");

    let updated: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&profile).unwrap()).unwrap();
    assert_eq!(updated["tokens_earned"], "52.5");
}

#[test]
fn award_dry_run_leaves_profile_untouched() {
    let dir = TempDir::new().unwrap();
    let profile = profile_copy(&dir);
    let before = fs::read_to_string(&profile).unwrap();

    opsboard()
        .args([
            "award",
            &profile.display().to_string(),
            &fixture("operation_login.json"),
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("would award 85 XP"));

    assert_eq!(fs::read_to_string(&profile).unwrap(), before);
}

#[test]
fn award_bad_operation_leaves_profile_untouched() {
    let dir = TempDir::new().unwrap();
    let profile = profile_copy(&dir);
    let before = fs::read_to_string(&profile).unwrap();

    opsboard()
        .args([
            "award",
            &profile.display().to_string(),
            &fixture("operation_unknown_category.json"),
        ])
        .assert()
        .failure();

    assert_eq!(fs::read_to_string(&profile).unwrap(), before);
}

// ──────────────────────────────────────────────
// 6. --config
// ──────────────────────────────────────────────

#[test]
fn config_overrides_minimum_xp() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "minimum_xp = 500\n");

    opsboard()
        .args([
            "reward",
            &fixture("operation_login.json"),
            "--config",
            &config,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("op-login: 500 XP"))
        .stdout(predicate::str::contains("raised to minimum of 500 XP"));
}

#[test]
fn config_custom_ladder_drives_rank() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        r#"
[[rank_ladder]]
rank = "apprentice"
min_xp = 0

[[rank_ladder]]
rank = "master"
min_xp = 100
"#,
    );

    opsboard()
        .args(["rank", "150", "--config", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("master (top rank)"));
}

#[test]
fn config_with_unordered_ladder_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        r#"
[[rank_ladder]]
rank = "apprentice"
min_xp = 0

[[rank_ladder]]
rank = "expert"
min_xp = 5000

[[rank_ladder]]
rank = "journeyman"
min_xp = 1000
"#,
    );

    opsboard()
        .args(["rank", "10", "--config", &config])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid rank ladder"));
}

#[test]
fn missing_config_file_fails() {
    opsboard()
        .args(["rank", "10", "--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading config file"));
}

#[test]
fn verbose_logs_to_stderr() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "minimum_xp = 10\n");

    opsboard()
        .args(["rank", "10", "--verbose", "--config", &config])
        .assert()
        .success()
        .stderr(predicate::str::contains("engine config loaded"));
}
