//! Integration tests for `a0 engine` on a host without a container engine.
//!
//! `PATH` is emptied so neither `docker` nor `podman` can be spawned.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn a0_without_engine(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("a0"));
    cmd.env("NO_COLOR", "1")
        .env("PATH", "")
        .env("A0_CONFIG", dir.path().join("config.yaml"));
    cmd
}

#[test]
fn test_engine_status_json_reports_docker_unavailable() {
    let dir = TempDir::new().unwrap();
    let assert = a0_without_engine(&dir)
        .args(["engine", "status", "--json"])
        .assert()
        .code(1);
    let out: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(out["success"], false);
    assert_eq!(out["error"]["code"], "DOCKER_UNAVAILABLE");
    assert_eq!(
        out["error"]["message"],
        "Neither Docker nor Podman is available on this system."
    );
    assert!(out.get("data").is_none());
}

#[test]
fn test_engine_status_human_prints_setup_hints() {
    let dir = TempDir::new().unwrap();
    a0_without_engine(&dir)
        .args(["engine", "status"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Neither Docker nor Podman"))
        .stderr(predicate::str::contains("https://docs.docker.com/get-docker/"));
}

#[test]
fn test_engine_images_degrades_to_empty_list() {
    let dir = TempDir::new().unwrap();
    let assert = a0_without_engine(&dir)
        .args(["engine", "images", "--json"])
        .assert()
        .success();
    let out: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(out["success"], true);
    assert_eq!(out["data"]["items"], serde_json::json!([]));
    assert!(out["data"]["error"].as_str().is_some());
}
