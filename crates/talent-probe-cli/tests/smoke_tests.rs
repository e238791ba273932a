//! Smoke tests for the talent-probe binary

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn talent_probe() -> Command {
    let mut cmd = Command::cargo_bin("talent-probe").expect("talent-probe binary should exist");
    cmd.env_remove("RUST_LOG")
        .env_remove("TALENT_PROBE_CONFIG")
        .env_remove("TALENT_PROBE_BASE_URL")
        .env_remove("TALENT_PROBE_DRIVER")
        .env_remove("TALENT_PROBE_POSITION_ID")
        .env_remove("TALENT_PROBE_CHROMIUM");
    cmd
}

#[test]
fn test_version_flag() {
    talent_probe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.3.0"));
}

#[test]
fn test_help_lists_commands() {
    talent_probe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_list_prints_catalog() {
    talent_probe()
        .args(["--color", "never", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            " 2. candidate changes stage via drag and drop",
        ))
        .stdout(predicate::str::contains("10. conserves candidates across a round trip"))
        .stdout(predicate::str::contains("(disabled:").count(3));
}

#[test]
fn test_mock_run_passes() {
    talent_probe()
        .args(["--color", "never", "run", "--driver", "mock"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS candidate changes stage via drag and drop"))
        .stdout(predicate::str::contains("SKIP filters positions by status"))
        .stdout(predicate::str::contains("7 passed, 0 failed, 3 skipped"));
}

#[test]
fn test_mock_run_with_thin_seed_skips() {
    talent_probe()
        .args(["--color", "never", "run", "--driver", "mock", "--position-id", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 passed, 0 failed, 7 skipped"));
}

#[test]
fn test_mock_run_missing_position_fails() {
    talent_probe()
        .args(["--color", "never", "run", "--driver", "mock", "--position-id", "99", "-f", "details"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL displays position details"))
        .stderr(predicate::str::contains("1 of 1 scenario(s) failed"));
}

#[test]
fn test_unmatched_filter_fails() {
    talent_probe()
        .args(["run", "--driver", "mock", "--filter", "no such scenario"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scenario matches filter"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("probe.yaml");
    fs::write(&path, "timeouts: [not, a, map]\n").unwrap();
    talent_probe()
        .args(["run", "--driver", "mock", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("YAML"));
}
