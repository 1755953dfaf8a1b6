//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`. Never from `crate::infra`,
//! `crate::commands`, or `crate::output`.
//!
//! Everything runs on one cooperative task, so none of these futures need to
//! be `Send`.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;

use crate::domain::chat::ViewChange;
use crate::domain::config::A0Config;
use crate::domain::engine::{EngineCommand, EngineKind};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// One line of output from a streamed process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// How a streamed process ended. Stderr is collected for error reporting.
#[derive(Debug, Clone)]
pub struct StreamOutcome {
    pub status: ExitStatus,
    pub stderr: String,
}

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    /// A spawn failure must keep the underlying `std::io::Error` in the
    /// chain so callers can recognise a missing binary.
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program, handing each stdout/stderr line to `sink` as it arrives.
    ///
    /// # Errors
    ///
    /// Same as `run_with_timeout`.
    async fn run_streaming(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
        sink: &dyn Fn(OutputLine),
    ) -> Result<StreamOutcome>;
}

// ── Container Engine Port ─────────────────────────────────────────────────────

/// Runs engine invocations against a docker- or podman-compatible CLI.
#[allow(async_fn_in_trait)]
pub trait ContainerEngine {
    /// Run `command` to completion and capture its output.
    async fn exec(&self, engine: EngineKind, command: &EngineCommand<'_>) -> Result<Output>;
    /// Run `command`, streaming its output lines to `sink`.
    async fn stream(
        &self,
        engine: EngineKind,
        command: &EngineCommand<'_>,
        sink: &dyn Fn(OutputLine),
    ) -> Result<StreamOutcome>;
}

// ── Backend API Port ──────────────────────────────────────────────────────────

/// A file part of a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Text fields and file parts of a multipart request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FormFile>,
}

impl FormPayload {
    #[must_use]
    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn file(mut self, file: FormFile) -> Self {
        self.files.push(file);
        self
    }
}

/// The agent backend's HTTP/JSON API.
#[allow(async_fn_in_trait)]
pub trait BackendApi {
    /// POST a JSON body and parse the JSON reply.
    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value>;
    /// GET with query parameters and parse the JSON reply.
    async fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value>;
    /// POST a multipart form and parse the JSON reply.
    async fn post_form(&self, endpoint: &str, form: FormPayload) -> Result<Value>;
    /// GET raw bytes.
    async fn download(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Vec<u8>>;
    /// Base URL requests are sent to.
    fn base_url(&self) -> &str;
}

// ── Local Filesystem Port ─────────────────────────────────────────────────────

/// Local file access for uploads, downloads, and attachments.
#[allow(async_fn_in_trait)]
pub trait LocalFiles {
    /// Size in bytes of the file at `path`.
    async fn size(&self, path: &Path) -> Result<u64>;
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
    /// Write `bytes` to `path`, creating parent directories.
    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Loads and persists the user's configuration file.
pub trait ConfigStore {
    /// Load the configuration, returning defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<A0Config>;
    /// Persist the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, config: &A0Config) -> Result<()>;
    /// Location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning or error line.
    fn warn(&self, message: &str);
}

// ── UI Observer Port ──────────────────────────────────────────────────────────

/// Told about every change to the chat view, after it has been applied.
pub trait UiObserver {
    fn notify(&self, change: &ViewChange);
}

/// Observer that ignores everything.
pub struct NullObserver;

impl UiObserver for NullObserver {
    fn notify(&self, _change: &ViewChange) {}
}
