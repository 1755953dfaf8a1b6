//! Integration tests for argument parsing, help and version output.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn a0() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("a0"));
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    // arg_required_else_help prints help on stderr and exits 2
    a0().assert()
        .code(2)
        .stderr(predicate::str::contains("Run and talk to a local Agent Zero instance"));
}

#[test]
fn test_cli_no_args_shows_help_with_backend_env_set() {
    a0().env("A0_BACKEND_URL", "http://10.0.0.5:50001")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"))
        .stderr(predicate::str::contains("requires a subcommand").not());
}

#[test]
fn test_no_color_env_accepts_conventional_values() {
    for value in ["1", "yes", "true", "0", "false", ""] {
        a0().env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains("a0 v0.1.0"));
    }
}

#[test]
fn test_no_color_flag_and_env_together() {
    a0().env("NO_COLOR", "1")
        .args(["--no-color", "version", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\": \"0.1.0\""));
}

#[test]
fn test_cli_help_lists_command_groups() {
    let assert = a0().arg("--help").assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    for group in ["engine", "chat", "files", "settings", "banners", "storage", "config", "version"] {
        assert!(out.contains(group), "missing `{group}` in help:\n{out}");
    }
}

#[test]
fn test_cli_version_flag_shows_version() {
    a0().arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("a0 0.1.0"));
}

#[test]
fn test_version_command_shows_version() {
    a0().arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("a0 v0.1.0"));
}

#[test]
fn test_version_command_json_outputs_envelope() {
    let assert = a0().args(["version", "--json"]).assert().success();
    let out: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(out["success"], true);
    assert_eq!(out["data"]["version"], "0.1.0");
    assert!(out.get("error").is_none());
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    a0().arg("launch")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_chat_send_requires_text() {
    a0().args(["chat", "send"]).assert().code(2);
}

#[test]
fn test_engine_help_lists_lifecycle_commands() {
    a0().args(["engine", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pull"))
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("stop"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("status"));
}
