//! Application service: container engine session.
//!
//! `EngineSession` owns every piece of per-process engine state (the chosen
//! or detected runtime and the "engine verified" flag) and implements the
//! image/container lifecycle on top of the `ContainerEngine` port.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::cell::Cell;
use std::process::Output;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::application::ports::{ContainerEngine, OutputLine, ProgressReporter};
use crate::domain::engine::{
    ContainerInfo, EngineCommand, EngineKind, ImageInfo, Overview, Parsed, RUNTIME_CANDIDATES,
    ResourceSpec, ResourceStatus, RuntimeChoice, UnavailableReason, VolumeInfo,
    classify_error_text, interpret_overview, parse_containers, parse_images,
    parse_overview_containers, parse_overview_images, parse_volumes,
};
use crate::domain::error::EngineError;

pub const NO_RUNTIME_MESSAGE: &str = "Neither Docker nor Podman is available on this system.";

// ── Result types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullResult {
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    pub started_existing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopResult {
    pub stopped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemoveResult {
    pub removed_container: bool,
    pub removed_image: bool,
}

/// Overview plus its interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub runtime: EngineKind,
    pub image: String,
    pub container_name: String,
    pub port: u16,
    #[serde(flatten)]
    pub overview: Overview,
    pub status: ResourceStatus,
}

/// Result of a permissive list call. Never an error; failures land in
/// `error` with `items` empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeList<T> {
    pub runtime: Option<EngineKind>,
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Single-instance engine session.
pub struct EngineSession<E: ContainerEngine> {
    engine: E,
    runtime: RuntimeChoice,
    resources: ResourceSpec,
    detected: Cell<Option<EngineKind>>,
    verified: Cell<bool>,
}

/// True when the error chain holds a "no such file" spawn failure.
#[must_use]
pub fn is_command_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
    })
}

fn output_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !stdout.is_empty() {
        return stdout;
    }
    match output.status.code() {
        Some(code) => format!("exited with code {code}"),
        None => "terminated by signal".to_string(),
    }
}

fn mentions(err: &EngineError, needles: &[&str]) -> bool {
    matches!(err, EngineError::CommandFailed { .. })
        && err.details().is_some_and(|d| {
            let lower = d.to_lowercase();
            needles.iter().any(|n| lower.contains(n))
        })
}

impl<E: ContainerEngine> EngineSession<E> {
    pub fn new(engine: E, runtime: RuntimeChoice, resources: ResourceSpec) -> Self {
        Self {
            engine,
            runtime,
            resources,
            detected: Cell::new(None),
            verified: Cell::new(false),
        }
    }

    #[must_use]
    pub fn resources(&self) -> &ResourceSpec {
        &self.resources
    }

    /// Whether `info` has succeeded since the last "unavailable" error.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verified.get()
    }

    /// Runtime in use, if known yet.
    #[must_use]
    pub fn runtime(&self) -> Option<EngineKind> {
        self.runtime.fixed().or(self.detected.get())
    }

    fn invalidate(&self) {
        if self.verified.replace(false) {
            debug!("engine verification invalidated");
        }
    }

    /// Resolve which engine binary to use.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Unavailable`] when no candidate is installed.
    pub async fn detect_runtime(&self) -> Result<EngineKind> {
        if let Some(kind) = self.runtime() {
            return Ok(kind);
        }
        for &candidate in RUNTIME_CANDIDATES {
            match self.engine.exec(candidate, &EngineCommand::Version).await {
                Err(e) if is_command_not_found(&e) => {
                    debug!(engine = %candidate, "engine not installed");
                }
                // A non-zero `version` (daemon down) still means the CLI is there.
                _ => {
                    debug!(engine = %candidate, "engine detected");
                    self.detected.set(Some(candidate));
                    return Ok(candidate);
                }
            }
        }
        Err(EngineError::Unavailable {
            message: NO_RUNTIME_MESSAGE.to_string(),
            details: None,
        }
        .into())
    }

    /// Turn raw failure text into an engine error, clearing the verified
    /// flag when the engine itself is unusable.
    fn from_text(&self, engine: EngineKind, text: String, fallback: String) -> EngineError {
        match classify_error_text(&text) {
            Some(reason) => {
                self.invalidate();
                EngineError::Unavailable {
                    message: reason.message(engine),
                    details: Some(text),
                }
            }
            None => EngineError::CommandFailed {
                message: fallback,
                details: Some(text),
            },
        }
    }

    fn from_spawn_error(&self, engine: EngineKind, err: &anyhow::Error, fallback: String) -> EngineError {
        if is_command_not_found(err) {
            self.invalidate();
            return EngineError::Unavailable {
                message: UnavailableReason::Missing.message(engine),
                details: Some(format!("{err:#}")),
            };
        }
        self.from_text(engine, format!("{err:#}"), fallback)
    }

    /// Run `docker info` once per verification.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`EngineError`].
    pub async fn ensure_available(&self) -> Result<EngineKind> {
        let engine = self.detect_runtime().await?;
        if self.verified.get() {
            return Ok(engine);
        }
        let product = engine.product();
        let fallback =
            format!("{product} is not available. Please install or start {product} and try again.");
        match self.engine.exec(engine, &EngineCommand::Info).await {
            Ok(out) if out.status.success() => {
                self.verified.set(true);
                Ok(engine)
            }
            Ok(out) => Err(self.from_text(engine, output_text(&out), fallback).into()),
            Err(e) => Err(self.from_spawn_error(engine, &e, fallback).into()),
        }
    }

    /// Run one command after verification, normalizing every failure.
    async fn run(&self, command: &EngineCommand<'_>, fallback: Option<&str>) -> Result<Output, EngineError> {
        let engine = match self.ensure_available().await {
            Ok(engine) => engine,
            Err(e) => {
                return Err(e.downcast::<EngineError>().unwrap_or_else(|e| {
                    EngineError::CommandFailed {
                        message: e.to_string(),
                        details: None,
                    }
                }));
            }
        };
        let fallback = fallback.map_or_else(
            || format!("Failed to execute \"{engine} {}\".", command.args().join(" ")),
            str::to_string,
        );
        match self.engine.exec(engine, command).await {
            Ok(out) if out.status.success() => Ok(out),
            Ok(out) => Err(self.from_text(engine, output_text(&out), fallback)),
            Err(e) => Err(self.from_spawn_error(engine, &e, fallback)),
        }
    }

    async fn container_id(&self) -> Result<Option<String>, EngineError> {
        let out = self
            .run(
                &EngineCommand::FindContainer {
                    name: &self.resources.container_name,
                },
                None,
            )
            .await?;
        let stdout = String::from_utf8_lossy(&out.stdout);
        Ok(stdout.lines().map(str::trim).find(|l| !l.is_empty()).map(str::to_string))
    }

    /// Pull the configured image, streaming output lines to `reporter`.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`EngineError`] when the pull cannot start or
    /// exits non-zero.
    pub async fn pull(&self, reporter: &impl ProgressReporter) -> Result<PullResult> {
        let engine = self.ensure_available().await?;
        let image = self.resources.image.as_str();
        let sink = |line: OutputLine| match line {
            OutputLine::Stdout(text) if !text.trim().is_empty() => reporter.step(text.trim_end()),
            OutputLine::Stderr(text) if !text.trim().is_empty() => reporter.warn(text.trim_end()),
            _ => {}
        };
        let outcome = match self
            .engine
            .stream(engine, &EngineCommand::Pull { image }, &sink)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                return Err(self
                    .from_spawn_error(engine, &e, format!("{} pull command could not start.", engine.product()))
                    .into());
            }
        };
        if !outcome.status.success() {
            let code = outcome
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            let text = if outcome.stderr.trim().is_empty() {
                format!("{engine} pull exited with code {code}")
            } else {
                outcome.stderr.trim().to_string()
            };
            return Err(self
                .from_text(engine, text, format!("{} pull command failed.", engine.product()))
                .into());
        }
        reporter.success(&format!("{} image {image} pulled successfully.", engine.product()));
        Ok(PullResult {
            image: image.to_string(),
        })
    }

    /// Start the managed container, creating it from the image if needed.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`EngineError`].
    pub async fn start(&self) -> Result<StartResult> {
        let name = self.resources.container_name.as_str();
        if let Some(existing) = self.container_id().await? {
            self.run(&EngineCommand::Start { name }, Some("Failed to start container."))
                .await?;
            return Ok(StartResult {
                container_id: Some(existing),
                started_existing: true,
            });
        }
        let out = self
            .run(
                &EngineCommand::Run {
                    name,
                    port: self.resources.port,
                    image: &self.resources.image,
                },
                Some("Failed to create container."),
            )
            .await?;
        let id = String::from_utf8_lossy(&out.stdout).trim().to_string();
        Ok(StartResult {
            container_id: Some(id).filter(|s| !s.is_empty()),
            started_existing: false,
        })
    }

    /// Stop the managed container if it exists.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`EngineError`].
    pub async fn stop(&self) -> Result<StopResult> {
        if self.container_id().await?.is_none() {
            return Ok(StopResult { stopped: false });
        }
        self.run(
            &EngineCommand::Stop {
                name: &self.resources.container_name,
            },
            Some("Failed to stop container."),
        )
        .await?;
        Ok(StopResult { stopped: true })
    }

    /// Remove the container and the image. Already-absent resources are not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`EngineError`] for any other failure.
    pub async fn remove(&self) -> Result<RemoveResult> {
        let name = self.resources.container_name.as_str();
        let mut removed_container = false;
        let container = match self.container_id().await {
            Ok(id) => id,
            Err(e) if mentions(&e, &["no such container"]) => None,
            Err(e) => return Err(e.into()),
        };
        if container.is_some() {
            match self
                .run(&EngineCommand::RemoveContainer { name }, Some("Failed to remove container."))
                .await
            {
                Ok(_) => removed_container = true,
                Err(e) if mentions(&e, &["no such container"]) => {
                    debug!(container = name, "container already removed");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let removed_image = match self
            .run(
                &EngineCommand::RemoveImage {
                    image: &self.resources.image,
                },
                Some("Failed to remove image."),
            )
            .await
        {
            Ok(_) => true,
            Err(e) if mentions(&e, &["no such image", "image not known"]) => false,
            Err(e) => return Err(e.into()),
        };

        Ok(RemoveResult {
            removed_container,
            removed_image,
        })
    }

    /// Strict overview of the managed container and image.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`EngineError`], including when any output line
    /// fails to parse.
    pub async fn overview(&self) -> Result<Overview> {
        let containers_cmd = EngineCommand::ListNamedContainers {
            name: &self.resources.container_name,
        };
        let images_cmd = EngineCommand::ListRepositoryImages {
            repository: self.resources.repository(),
        };
        // Verify once up front; both commands then skip the check.
        self.ensure_available().await?;
        let (containers_out, images_out) = futures_util::future::try_join(
            self.run(&containers_cmd, None),
            self.run(&images_cmd, None),
        )
        .await?;

        let engine = self.runtime().map_or("docker", EngineKind::program);
        let containers = parse_overview_containers(&String::from_utf8_lossy(&containers_out.stdout))
            .map_err(|e| EngineError::CommandFailed {
                message: format!("Failed to parse {engine} ps output."),
                details: Some(e),
            })?;
        let images = parse_overview_images(&String::from_utf8_lossy(&images_out.stdout)).map_err(
            |e| EngineError::CommandFailed {
                message: format!("Failed to parse {engine} images output."),
                details: Some(e),
            },
        )?;
        Ok(Overview { containers, images })
    }

    /// Overview plus derived state and available actions.
    ///
    /// # Errors
    ///
    /// Same as [`Self::overview`].
    pub async fn status(&self) -> Result<StatusReport> {
        let overview = self.overview().await?;
        let status = interpret_overview(&overview, &self.resources);
        Ok(StatusReport {
            runtime: self.runtime().unwrap_or(EngineKind::Docker),
            image: self.resources.image.clone(),
            container_name: self.resources.container_name.clone(),
            port: self.resources.port,
            overview,
            status,
        })
    }

    // ── Permissive runtime lists ──────────────────────────────────────────────

    async fn list<T>(&self, command: EngineCommand<'_>, parse: fn(&str) -> Parsed<T>) -> RuntimeList<T> {
        let engine = match self.detect_runtime().await {
            Ok(engine) => engine,
            Err(e) => {
                return RuntimeList {
                    runtime: None,
                    items: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };
        let fallback = format!("Failed to execute \"{engine} {}\".", command.args().join(" "));
        let result = match self.engine.exec(engine, &command).await {
            Ok(out) if out.status.success() => Ok(out),
            Ok(out) => Err(self.from_text(engine, output_text(&out), fallback)),
            Err(e) => Err(self.from_spawn_error(engine, &e, fallback)),
        };
        match result {
            Ok(out) => {
                let parsed = parse(&String::from_utf8_lossy(&out.stdout));
                if parsed.dropped > 0 {
                    warn!(dropped = parsed.dropped, command = ?command.args(), "dropped unparseable engine output lines");
                }
                RuntimeList {
                    runtime: Some(engine),
                    items: parsed.items,
                    error: None,
                }
            }
            Err(e) => RuntimeList {
                runtime: Some(engine),
                items: Vec::new(),
                error: Some(match e.details() {
                    Some(d) if !e.is_unavailable() => format!("{e}: {d}"),
                    _ => e.to_string(),
                }),
            },
        }
    }

    pub async fn list_images(&self) -> RuntimeList<ImageInfo> {
        self.list(EngineCommand::ListImages, parse_images).await
    }

    pub async fn list_containers(&self) -> RuntimeList<ContainerInfo> {
        self.list(EngineCommand::ListContainers, parse_containers).await
    }

    pub async fn list_volumes(&self) -> RuntimeList<VolumeInfo> {
        self.list(EngineCommand::ListVolumes, parse_volumes).await
    }
}
