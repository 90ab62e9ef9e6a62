//! CLI E2E tests for the ptopo binary.
//!
//! Uses `PTOPO_PROC_ROOT` to point the binary at a fabricated procfs where
//! the test needs a fixed process table, and the live procfs otherwise.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

// ============================================================================
// Helpers
// ============================================================================

/// Command for the ptopo binary, isolated from the user's config.
fn ptopo(config_home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("ptopo");
    cmd.timeout(Duration::from_secs(60))
        .env_remove("PTOPO_CONFIG")
        .env_remove("PTOPO_PROC_ROOT")
        .env_remove("PTOPO_PTS_DIR")
        .env_remove("PTOPO_LOG")
        .env("XDG_CONFIG_HOME", config_home);
    cmd
}

fn write_process(root: &Path, pid: i32, ppid: i32, pgid: i32) {
    let dir = root.join(pid.to_string());
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("status"),
        format!("Name:\tp{pid}\nPid:\t{pid}\nPPid:\t{ppid}\nUid:\t0\t0\t0\t0\nNSpgid:\t{pgid}\n"),
    )
    .unwrap();
    fs::write(dir.join("stat"), format!("{pid} (p{pid}) S {ppid} {pgid} {pgid} 0 -1 0\n")).unwrap();
}

/// init(1), a shell (10) and a two-process pipeline group (20, 21).
fn fake_proc() -> TempDir {
    let dir = tempdir().unwrap();
    write_process(dir.path(), 1, 0, 1);
    write_process(dir.path(), 10, 1, 10);
    write_process(dir.path(), 20, 10, 20);
    write_process(dir.path(), 21, 10, 20);
    fs::create_dir(dir.path().join("self")).unwrap();
    dir
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("parse JSON")
}

// ============================================================================
// Fabricated procfs
// ============================================================================

#[test]
fn pids_lists_fake_table() {
    let home = tempdir().unwrap();
    let proc = fake_proc();
    let json = stdout_json(
        ptopo(home.path())
            .env("PTOPO_PROC_ROOT", proc.path())
            .args(["--format", "json", "pids"]),
    );
    let mut pids: Vec<i64> = json["pids"]
        .as_array()
        .expect("pids array")
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    pids.sort_unstable();
    assert_eq!(pids, vec![1, 10, 20, 21]);
    assert_eq!(json["count"], 4);
    assert_eq!(json["command"], "pids");
    assert!(json.get("schema_version").is_some());
}

#[test]
fn groups_text_counts_members() {
    let home = tempdir().unwrap();
    let proc = fake_proc();
    ptopo(home.path())
        .env("PTOPO_PROC_ROOT", proc.path())
        .arg("groups")
        .assert()
        .success()
        .stdout(predicate::str::contains("20: 2 processes"))
        .stdout(predicate::str::contains("10: 1 process\n"));
}

#[test]
fn show_missing_pid_exits_no_such_process() {
    let home = tempdir().unwrap();
    let proc = fake_proc();
    let mut cmd = ptopo(home.path());
    cmd.env("PTOPO_PROC_ROOT", proc.path())
        .args(["--format", "json", "show", "999"]);
    let json = stdout_json(&mut cmd);
    assert_eq!(json["error"]["kind"], "no_such_process");
    assert_eq!(json["error"]["code"], 20);
    cmd.assert().code(20);
}

#[test]
fn malformed_status_exits_malformed_record() {
    let home = tempdir().unwrap();
    let proc = fake_proc();
    fs::write(proc.path().join("10").join("status"), "Name:\tp10\nPid:\t10\n").unwrap();
    ptopo(home.path())
        .env("PTOPO_PROC_ROOT", proc.path())
        .args(["show", "10"])
        .assert()
        .code(21)
        .stderr(predicate::str::contains("malformed status record for process 10"));
}

// ============================================================================
// Live procfs
// ============================================================================

#[cfg(target_os = "linux")]
#[test]
fn show_test_process_reports_fields() {
    let home = tempdir().unwrap();
    let pid = std::process::id().to_string();
    let json = stdout_json(ptopo(home.path()).args(["--format", "json", "show", &pid]));
    assert_eq!(json["process"]["pid"].as_i64(), Some(std::process::id() as i64));
    assert!(json["is_group_leader"].is_boolean());
    assert!(json["is_session_leader"].is_boolean());
}

#[cfg(target_os = "linux")]
#[test]
fn tree_ends_with_requested_pid() {
    let home = tempdir().unwrap();
    let pid = std::process::id().to_string();
    ptopo(home.path())
        .args(["tree", &pid])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{pid}  ")));
}

#[cfg(target_os = "linux")]
#[test]
fn terminal_dev_null_is_not_a_terminal() {
    let home = tempdir().unwrap();
    ptopo(home.path())
        .args(["terminal", "/dev/null"])
        .assert()
        .code(23);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn missing_config_file_exits_config_error() {
    let home = tempdir().unwrap();
    let missing = home.path().join("nope.json");
    ptopo(home.path())
        .args(["--config", missing.to_str().unwrap(), "pids"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn config_file_sets_proc_root() {
    let home = tempdir().unwrap();
    let proc = fake_proc();
    let config = home.path().join("ptopo.json");
    fs::write(
        &config,
        serde_json::json!({ "proc_root": proc.path() }).to_string(),
    )
    .unwrap();
    ptopo(home.path())
        .args(["--config", config.to_str().unwrap(), "pids"])
        .assert()
        .success()
        .stdout(predicate::str::contains("21"));
}
