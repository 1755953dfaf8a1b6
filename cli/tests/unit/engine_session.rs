//! Unit tests for `EngineSession`: detection, verification, normalization
//! and the lifecycle operations.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use a0_cli::application::ports::OutputLine;
use a0_cli::domain::engine::{ContainerStatus, EngineKind, ImageStatus, RuntimeChoice};
use a0_cli::domain::error::{CODE_COMMAND_FAILED, CODE_ENGINE_UNAVAILABLE, EngineError};
use a0_cli::domain::response::ErrorPayload;

use super::helpers::{IMAGES_PULLED, PS_RUNNING, err_output};
use super::mocks::{RecordingReporter, Reply, ScriptedRunner, session};

fn engine_error(err: &anyhow::Error) -> &EngineError {
    err.downcast_ref::<EngineError>()
        .expect("error should be an EngineError")
}

// ── Detection ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_detect_falls_back_to_podman_when_docker_missing() {
    let runner = ScriptedRunner::new()
        .on("docker version", Reply::NotFound)
        .ok("podman version", "podman version 5.2.0");
    let (session, log) = session(runner, RuntimeChoice::Auto);

    let kind = session.detect_runtime().await.unwrap();

    assert_eq!(kind, EngineKind::Podman);
    assert_eq!(session.runtime(), Some(EngineKind::Podman));
    assert_eq!(log.all(), vec!["docker version", "podman version"]);
}

#[tokio::test]
async fn test_detect_counts_failing_version_as_present() {
    let runner = ScriptedRunner::new().on(
        "docker version",
        Reply::Output(err_output(1, b"Cannot connect to the Docker daemon")),
    );
    let (session, log) = session(runner, RuntimeChoice::Auto);

    assert_eq!(session.detect_runtime().await.unwrap(), EngineKind::Docker);
    assert_eq!(log.count("podman"), 0);
}

#[tokio::test]
async fn test_detect_result_is_cached() {
    let runner = ScriptedRunner::new().ok("docker version", "24.0.7");
    let (session, log) = session(runner, RuntimeChoice::Auto);

    session.detect_runtime().await.unwrap();
    session.detect_runtime().await.unwrap();

    assert_eq!(log.count("docker version"), 1);
}

#[tokio::test]
async fn test_detect_reports_no_runtime_when_neither_installed() {
    let runner = ScriptedRunner::new()
        .on("docker", Reply::NotFound)
        .on("podman", Reply::NotFound);
    let (session, _) = session(runner, RuntimeChoice::Auto);

    let err = session.detect_runtime().await.unwrap_err();

    assert_eq!(engine_error(&err).code(), CODE_ENGINE_UNAVAILABLE);
    assert_eq!(
        err.to_string(),
        "Neither Docker nor Podman is available on this system."
    );
}

#[tokio::test]
async fn test_fixed_runtime_skips_detection() {
    let runner = ScriptedRunner::new().ok("podman info", "host: {}");
    let (session, log) = session(runner, RuntimeChoice::Podman);

    assert_eq!(session.ensure_available().await.unwrap(), EngineKind::Podman);
    assert_eq!(log.all(), vec!["podman info"]);
}

// ── Verification ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_cli_maps_to_unavailable() {
    let runner = ScriptedRunner::new().on("docker", Reply::NotFound);
    let (session, _) = session(runner, RuntimeChoice::Docker);

    let err = session.ensure_available().await.unwrap_err();
    let payload = ErrorPayload::from_error(&err);

    assert_eq!(payload.code, CODE_ENGINE_UNAVAILABLE);
    assert!(payload.message.starts_with("Docker CLI was not found."));
    assert!(!session.is_verified());
}

#[tokio::test]
async fn test_daemon_down_maps_to_unavailable() {
    let runner = ScriptedRunner::new().on(
        "docker info",
        Reply::Output(err_output(
            1,
            b"Cannot connect to the Docker daemon at unix:///var/run/docker.sock. Is the docker daemon running?",
        )),
    );
    let (session, _) = session(runner, RuntimeChoice::Docker);

    let err = session.ensure_available().await.unwrap_err();

    assert!(engine_error(&err).is_unavailable());
    assert!(err.to_string().contains("does not appear to be running"));
}

#[tokio::test]
async fn test_permission_denied_maps_to_unavailable() {
    let runner = ScriptedRunner::new().on(
        "docker info",
        Reply::Output(err_output(
            1,
            b"permission denied while trying to connect to the Docker daemon socket",
        )),
    );
    let (session, _) = session(runner, RuntimeChoice::Docker);

    let err = session.ensure_available().await.unwrap_err();

    assert!(err.to_string().contains("requires elevated permissions"));
}

#[tokio::test]
async fn test_verified_session_skips_info() {
    let runner = ScriptedRunner::new()
        .ok("docker info", "")
        .ok("docker ps -a -q", "")
        .ok("docker stop", "");
    let (session, log) = session(runner, RuntimeChoice::Docker);

    session.ensure_available().await.unwrap();
    assert!(session.is_verified());
    session.stop().await.unwrap();
    session.stop().await.unwrap();

    assert_eq!(log.count("docker info"), 1);
}

#[tokio::test]
async fn test_unavailable_error_clears_verified_flag() {
    let runner = ScriptedRunner::new()
        .ok("docker info", "")
        .on(
            "docker ps",
            Reply::Output(err_output(1, b"error during connect: daemon is not running")),
        );
    let (session, log) = session(runner, RuntimeChoice::Docker);

    session.ensure_available().await.unwrap();
    let err = session.stop().await.unwrap_err();

    assert!(engine_error(&err).is_unavailable());
    assert!(!session.is_verified());
    session.ensure_available().await.unwrap();
    assert_eq!(log.count("docker info"), 2);
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_existing_container() {
    let runner = ScriptedRunner::new()
        .ok("docker info", "")
        .ok("docker ps -a -q --filter name=^/?agent-zero$", "3f2a9c1d\n")
        .ok("docker start agent-zero", "agent-zero\n");
    let (session, log) = session(runner, RuntimeChoice::Docker);

    let result = session.start().await.unwrap();

    assert!(result.started_existing);
    assert_eq!(result.container_id.as_deref(), Some("3f2a9c1d"));
    assert_eq!(log.count("docker run"), 0);
}

#[tokio::test]
async fn test_start_creates_container_when_absent() {
    let runner = ScriptedRunner::new()
        .ok("docker info", "")
        .ok("docker ps -a -q", "")
        .ok(
            "docker run -d --name agent-zero -p 50001:80 agent0ai/agent-zero:latest",
            "9e8d7c6b5a\n",
        );
    let (session, _) = session(runner, RuntimeChoice::Docker);

    let result = session.start().await.unwrap();

    assert!(!result.started_existing);
    assert_eq!(result.container_id.as_deref(), Some("9e8d7c6b5a"));
}

#[tokio::test]
async fn test_start_failure_is_command_failed_with_details() {
    let runner = ScriptedRunner::new()
        .ok("docker info", "")
        .ok("docker ps -a -q", "")
        .on(
            "docker run",
            Reply::Output(err_output(125, b"port is already allocated")),
        );
    let (session, _) = session(runner, RuntimeChoice::Docker);

    let err = session.start().await.unwrap_err();
    let engine = engine_error(&err);

    assert_eq!(engine.code(), CODE_COMMAND_FAILED);
    assert_eq!(err.to_string(), "Failed to create container.");
    assert_eq!(engine.details(), Some("port is already allocated"));
}

#[tokio::test]
async fn test_stop_without_container_is_not_an_error() {
    let runner = ScriptedRunner::new()
        .ok("docker info", "")
        .ok("docker ps -a -q", "\n");
    let (session, log) = session(runner, RuntimeChoice::Docker);

    let result = session.stop().await.unwrap();

    assert!(!result.stopped);
    assert_eq!(log.count("docker stop"), 0);
}

#[tokio::test]
async fn test_remove_treats_missing_image_as_not_removed() {
    let runner = ScriptedRunner::new()
        .ok("docker info", "")
        .ok("docker ps -a -q", "3f2a9c1d")
        .ok("docker rm -f agent-zero", "agent-zero")
        .on(
            "docker rmi",
            Reply::Output(err_output(
                1,
                b"Error response from daemon: No such image: agent0ai/agent-zero:latest",
            )),
        );
    let (session, _) = session(runner, RuntimeChoice::Docker);

    let result = session.remove().await.unwrap();

    assert!(result.removed_container);
    assert!(!result.removed_image);
}

#[tokio::test]
async fn test_remove_propagates_other_failures() {
    let runner = ScriptedRunner::new()
        .ok("docker info", "")
        .ok("docker ps -a -q", "")
        .on(
            "docker rmi",
            Reply::Output(err_output(
                1,
                b"conflict: unable to remove repository reference (must force)",
            )),
        );
    let (session, _) = session(runner, RuntimeChoice::Docker);

    let err = session.remove().await.unwrap_err();

    assert_eq!(engine_error(&err).code(), CODE_COMMAND_FAILED);
}

#[tokio::test]
async fn test_remove_container_vanished_before_rm_is_not_an_error() {
    let runner = ScriptedRunner::new()
        .ok("docker info", "")
        .ok("docker ps -a -q", "3f2a9c1d")
        .on(
            "docker rm -f agent-zero",
            Reply::Output(err_output(
                1,
                b"Error response from daemon: No such container: agent-zero",
            )),
        )
        .ok("docker rmi", "Untagged: agent0ai/agent-zero:latest");
    let (session, log) = session(runner, RuntimeChoice::Docker);

    let result = session.remove().await.unwrap();

    assert!(!result.removed_container);
    assert!(result.removed_image);
    assert_eq!(log.count("docker rmi"), 1);
}

#[tokio::test]
async fn test_remove_lookup_reporting_no_such_container_skips_rm() {
    let runner = ScriptedRunner::new()
        .ok("docker info", "")
        .on(
            "docker ps -a -q",
            Reply::Output(err_output(1, b"Error: No such container: agent-zero")),
        )
        .ok("docker rmi", "Untagged: agent0ai/agent-zero:latest");
    let (session, log) = session(runner, RuntimeChoice::Docker);

    let result = session.remove().await.unwrap();

    assert!(!result.removed_container);
    assert!(result.removed_image);
    assert_eq!(log.count("docker rm -f"), 0);
}

// ── Pull ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pull_streams_lines_and_reports_success() {
    let runner = ScriptedRunner::new().ok("docker info", "").on(
        "docker pull agent0ai/agent-zero:latest",
        Reply::Stream {
            lines: vec![
                OutputLine::Stdout("latest: Pulling from agent0ai/agent-zero".into()),
                OutputLine::Stderr("retrying layer 3".into()),
                OutputLine::Stdout(String::new()),
                OutputLine::Stdout("Status: Downloaded newer image".into()),
            ],
            code: 0,
            stderr: "retrying layer 3\n".into(),
        },
    );
    let (session, _) = session(runner, RuntimeChoice::Docker);
    let reporter = RecordingReporter::default();

    let result = session.pull(&reporter).await.unwrap();

    assert_eq!(result.image, "agent0ai/agent-zero:latest");
    assert_eq!(
        reporter.of("step"),
        vec![
            "latest: Pulling from agent0ai/agent-zero",
            "Status: Downloaded newer image"
        ]
    );
    assert_eq!(reporter.of("warn"), vec!["retrying layer 3"]);
    assert_eq!(
        reporter.of("success"),
        vec!["Docker image agent0ai/agent-zero:latest pulled successfully."]
    );
}

#[tokio::test]
async fn test_pull_nonzero_exit_carries_stderr() {
    let runner = ScriptedRunner::new().ok("docker info", "").on(
        "docker pull",
        Reply::Stream {
            lines: Vec::new(),
            code: 1,
            stderr: "manifest unknown\n".into(),
        },
    );
    let (session, _) = session(runner, RuntimeChoice::Docker);

    let err = session.pull(&RecordingReporter::default()).await.unwrap_err();

    assert_eq!(err.to_string(), "Docker pull command failed.");
    assert_eq!(engine_error(&err).details(), Some("manifest unknown"));
}

// ── Overview and status ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_status_interprets_running_container_and_pulled_image() {
    let runner = ScriptedRunner::new()
        .ok("docker info", "")
        .ok("docker ps -a --format", PS_RUNNING)
        .ok("docker images --format", IMAGES_PULLED);
    let (session, _) = session(runner, RuntimeChoice::Docker);

    let report = session.status().await.unwrap();

    assert_eq!(report.status.image, ImageStatus::Pulled);
    assert_eq!(report.status.container, ContainerStatus::Running);
    assert!(report.status.can_stop);
    assert_eq!(
        report.overview.containers[0].running_for.as_deref(),
        Some("2 hours ago")
    );
}

#[tokio::test]
async fn test_overview_rejects_malformed_lines() {
    let runner = ScriptedRunner::new()
        .ok("docker info", "")
        .ok("docker ps -a --format", "{not json")
        .ok("docker images --format", IMAGES_PULLED);
    let (session, _) = session(runner, RuntimeChoice::Docker);

    let err = session.overview().await.unwrap_err();

    assert_eq!(engine_error(&err).code(), CODE_COMMAND_FAILED);
    assert_eq!(err.to_string(), "Failed to parse docker ps output.");
}

#[tokio::test]
async fn test_overview_verifies_engine_once() {
    let runner = ScriptedRunner::new()
        .yielding()
        .ok("docker version", "24.0.7")
        .ok("docker info", "")
        .ok("docker ps -a --format", PS_RUNNING)
        .ok("docker images --format", IMAGES_PULLED);
    let (session, log) = session(runner, RuntimeChoice::Auto);

    session.overview().await.unwrap();

    assert_eq!(log.count("docker version"), 1);
    assert_eq!(log.count("docker info"), 1);
    assert_eq!(log.count("docker ps -a --format"), 1);
    assert_eq!(log.count("docker images --format"), 1);
}

// ── Permissive lists ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_images_drops_bad_lines_and_fills_sentinels() {
    let stdout = format!("{IMAGES_PULLED}\nnot json\n{{\"ID\":\"abc\"}}\n");
    let runner = ScriptedRunner::new()
        .ok("docker version", "")
        .ok("docker images --format", &stdout);
    let (session, _) = session(runner, RuntimeChoice::Auto);

    let list = session.list_images().await;

    assert_eq!(list.runtime, Some(EngineKind::Docker));
    assert!(list.error.is_none());
    assert_eq!(list.items.len(), 2);
    assert_eq!(list.items[1].repository, "<none>");
    assert_eq!(list.items[1].tag, "<none>");
}

#[tokio::test]
async fn test_list_never_fails() {
    let runner = ScriptedRunner::new()
        .on("docker", Reply::NotFound)
        .on("podman", Reply::NotFound);
    let (session, _) = session(runner, RuntimeChoice::Auto);

    let list = session.list_volumes().await;

    assert!(list.items.is_empty());
    assert_eq!(list.runtime, None);
    assert!(list.error.is_some());
}
