//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("proofputt").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"));
}

#[test]
fn test_serve_help() {
    let mut cmd = Command::cargo_bin("proofputt").unwrap();
    cmd.arg("serve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--heartbeat-timeout-secs"))
        .stdout(predicate::str::contains("PROOFPUTT_MAX_CONNECTIONS"));
}

#[test]
fn test_migrate_help() {
    let mut cmd = Command::cargo_bin("proofputt").unwrap();
    cmd.arg("migrate").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--database-url"));
}

#[test]
fn test_serve_without_database_url_fails() {
    let mut cmd = Command::cargo_bin("proofputt").unwrap();
    cmd.arg("serve")
        .env_remove("DATABASE_URL")
        .current_dir(std::env::temp_dir());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL not set"));
}

#[test]
fn test_unknown_command_fails() {
    let mut cmd = Command::cargo_bin("proofputt").unwrap();
    cmd.arg("fly");

    cmd.assert().failure();
}
