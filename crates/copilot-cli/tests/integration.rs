#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn copilot(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("copilot").unwrap();
    cmd.current_dir(dir.path()).env("COPILOT_ROOT", dir.path());
    cmd
}

// ---------------------------------------------------------------------------
// copilot --help
// ---------------------------------------------------------------------------

#[test]
fn help_lists_command_groups() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("app"))
        .stdout(predicate::str::contains("svc"))
        .stdout(predicate::str::contains("job"))
        .stdout(predicate::str::contains("pipeline"));
}

#[test]
fn logs_help_documents_flags() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["svc", "logs", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--since"))
        .stdout(predicate::str::contains("--follow"))
        .stdout(predicate::str::contains("--tasks"));
}

// ---------------------------------------------------------------------------
// deletions outside a workspace
// ---------------------------------------------------------------------------

#[test]
fn app_delete_needs_an_application() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["app", "delete", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no application specified"));
}

#[test]
fn empty_app_name_counts_as_missing() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["app", "delete", "--name", "", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no application specified"));
}

#[test]
fn env_delete_needs_an_application() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["env", "delete", "--name", "test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no application specified"));
}

#[test]
fn svc_delete_needs_an_application() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["svc", "delete", "--name", "web"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no application specified"));
}

#[test]
fn job_delete_requires_a_name() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["job", "delete", "--app", "my-app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--name"));
}

#[test]
fn pipeline_delete_needs_a_workspace() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["pipeline", "delete", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no application specified"));
}

// ---------------------------------------------------------------------------
// logs flag validation
// ---------------------------------------------------------------------------

#[test]
fn limit_below_range_is_rejected() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["svc", "logs", "--limit", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be between 1 and 10000"));
}

#[test]
fn limit_above_range_is_rejected() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["job", "logs", "--limit", "10001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--limit 10001 is out of bounds"));
}

#[test]
fn since_conflicts_with_start_time() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args([
            "svc",
            "logs",
            "--since",
            "5m",
            "--start-time",
            "2024-01-02T15:04:05Z",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only one of --since or --start-time"));
}

#[test]
fn follow_conflicts_with_end_time() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args([
            "job",
            "logs",
            "--follow",
            "--end-time",
            "2024-01-02T15:04:05Z",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only one of --follow or --end-time"));
}

#[test]
fn malformed_since_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["svc", "logs", "--since", "5x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid duration '5x'"));
}

#[test]
fn negative_since_is_rejected() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["svc", "logs", "--since=-5m"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--since must be positive"));
}

#[test]
fn malformed_start_time_names_the_flag() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["svc", "logs", "--start-time", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --start-time 'yesterday'"));
}

#[test]
fn since_beyond_the_calendar_is_rejected() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["svc", "logs", "--since", "3000000000h"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--since reaches too far into the past"));
}
