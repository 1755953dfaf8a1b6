//! Shared mock infrastructure for unit tests.
//!
//! Provides a scripted [`CommandRunner`], an in-memory [`BackendApi`] and
//! recording implementations of the output ports, so each test file doesn't
//! have to re-define the same boilerplate.

#![allow(clippy::expect_used, dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::process::Output;
use std::rc::Rc;
use std::time::Duration;

use a0_cli::application::ports::{
    BackendApi, CommandRunner, ConfigStore, FormPayload, LocalFiles, OutputLine, ProgressReporter,
    StreamOutcome, UiObserver,
};
use a0_cli::application::services::engine_session::EngineSession;
use a0_cli::domain::chat::ViewChange;
use a0_cli::domain::config::A0Config;
use a0_cli::domain::engine::{ResourceSpec, RuntimeChoice};
use a0_cli::infra::engine::CliEngine;
use anyhow::Result;
use serde_json::Value;

use super::helpers::{exit_status, ok_output, spawn_not_found};

// ── Command runner ───────────────────────────────────────────────────────────

/// What a scripted command does.
#[derive(Clone)]
pub enum Reply {
    Output(Output),
    /// The binary is not installed.
    NotFound,
    /// Streamed lines, then an exit code and collected stderr.
    Stream {
        lines: Vec<OutputLine>,
        code: i32,
        stderr: String,
    },
}

/// Shared record of every command line a runner was asked to run.
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn all(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Number of recorded command lines starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.0.borrow().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn push(&self, line: String) {
        self.0.borrow_mut().push(line);
    }
}

/// Answers each command line with the first rule whose prefix matches.
/// Unmatched commands fail the call.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, Reply)>,
    log: CallLog,
    yielding: bool,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, prefix: &str, reply: Reply) -> Self {
        self.rules.push((prefix.to_string(), reply));
        self
    }

    pub fn ok(self, prefix: &str, stdout: &str) -> Self {
        self.on(prefix, Reply::Output(ok_output(stdout.as_bytes())))
    }

    /// Yield to the scheduler once before answering, so concurrent callers
    /// overlap.
    pub fn yielding(mut self) -> Self {
        self.yielding = true;
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn reply(&self, program: &str, args: &[&str]) -> Result<Reply> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.log.push(line.clone());
        match self.rules.iter().find(|(prefix, _)| line.starts_with(prefix.as_str())) {
            Some((_, Reply::NotFound)) => Err(spawn_not_found(program)),
            Some((_, reply)) => Ok(reply.clone()),
            None => anyhow::bail!("unexpected command: {line}"),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, Duration::from_secs(1)).await
    }

    async fn run_with_timeout(&self, program: &str, args: &[&str], _: Duration) -> Result<Output> {
        if self.yielding {
            tokio::task::yield_now().await;
        }
        match self.reply(program, args)? {
            Reply::Output(out) => Ok(out),
            Reply::Stream { .. } => anyhow::bail!("streamed reply for a captured command"),
            Reply::NotFound => unreachable!("handled in reply()"),
        }
    }

    async fn run_streaming(
        &self,
        program: &str,
        args: &[&str],
        _: Duration,
        sink: &dyn Fn(OutputLine),
    ) -> Result<StreamOutcome> {
        match self.reply(program, args)? {
            Reply::Stream {
                lines,
                code,
                stderr,
            } => {
                for line in lines {
                    sink(line);
                }
                Ok(StreamOutcome {
                    status: exit_status(code),
                    stderr,
                })
            }
            Reply::Output(out) => {
                for line in String::from_utf8_lossy(&out.stdout).lines() {
                    sink(OutputLine::Stdout(line.to_string()));
                }
                Ok(StreamOutcome {
                    status: out.status,
                    stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
                })
            }
            Reply::NotFound => unreachable!("handled in reply()"),
        }
    }
}

/// Engine session over a scripted runner, plus the runner's call log.
pub fn session(
    runner: ScriptedRunner,
    runtime: RuntimeChoice,
) -> (EngineSession<CliEngine<ScriptedRunner>>, CallLog) {
    let log = runner.log();
    let engine = CliEngine::new(runner, Duration::from_secs(1), Duration::from_secs(5));
    (EngineSession::new(engine, runtime, ResourceSpec::default()), log)
}

// ── Backend ──────────────────────────────────────────────────────────────────

/// One request seen by [`MockBackend`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub endpoint: String,
    pub body: Value,
    pub query: Vec<(String, String)>,
    pub form: Option<FormPayload>,
}

/// Per-endpoint reply queues. The last reply for an endpoint repeats.
pub struct MockBackend {
    base_url: String,
    replies: RefCell<HashMap<String, VecDeque<Result<Value, String>>>>,
    downloads: RefCell<HashMap<String, Vec<u8>>>,
    requests: RefCell<Vec<Recorded>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_url("http://localhost:50001")
    }

    pub fn with_url(url: &str) -> Self {
        Self {
            base_url: url.to_string(),
            replies: RefCell::new(HashMap::new()),
            downloads: RefCell::new(HashMap::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn reply(self, endpoint: &str, body: Value) -> Self {
        self.push(endpoint, Ok(body));
        self
    }

    pub fn fail(self, endpoint: &str, message: &str) -> Self {
        self.push(endpoint, Err(message.to_string()));
        self
    }

    pub fn file(self, path: &str, bytes: &[u8]) -> Self {
        self.downloads
            .borrow_mut()
            .insert(path.to_string(), bytes.to_vec());
        self
    }

    /// Queue a reply on an already shared backend.
    pub fn push(&self, endpoint: &str, reply: Result<Value, String>) {
        self.replies
            .borrow_mut()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.borrow().clone()
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<Recorded> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .cloned()
            .collect()
    }

    fn record(&self, method: &'static str, endpoint: &str, body: Value, query: &[(&str, &str)], form: Option<FormPayload>) {
        self.requests.borrow_mut().push(Recorded {
            method,
            endpoint: endpoint.to_string(),
            body,
            query: query
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            form,
        });
    }

    fn next(&self, endpoint: &str) -> Result<Value> {
        let mut replies = self.replies.borrow_mut();
        let queue = replies
            .get_mut(endpoint)
            .ok_or_else(|| anyhow::anyhow!("no reply scripted for {endpoint}"))?;
        let reply = if queue.len() > 1 {
            queue.pop_front().expect("non-empty queue")
        } else {
            queue
                .front()
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no reply scripted for {endpoint}"))?
        };
        reply.map_err(|message| anyhow::anyhow!(message))
    }
}

impl BackendApi for MockBackend {
    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value> {
        self.record("POST", endpoint, body.clone(), &[], None);
        self.next(endpoint)
    }

    async fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.record("GET", endpoint, Value::Null, query, None);
        self.next(endpoint)
    }

    async fn post_form(&self, endpoint: &str, form: FormPayload) -> Result<Value> {
        self.record("POST", endpoint, Value::Null, &[], Some(form));
        self.next(endpoint)
    }

    async fn download(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Vec<u8>> {
        self.record("GET", endpoint, Value::Null, query, None);
        let path = query
            .iter()
            .find(|(k, _)| *k == "path")
            .map(|(_, v)| *v)
            .unwrap_or_default();
        self.downloads
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("{endpoint} returned HTTP 404"))
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

// ── Local files ──────────────────────────────────────────────────────────────

/// In-memory file system keyed by path.
#[derive(Default)]
pub struct MemFiles {
    files: RefCell<HashMap<PathBuf, Vec<u8>>>,
    /// Sizes reported without holding the bytes.
    sizes: RefCell<HashMap<PathBuf, u64>>,
}

impl MemFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, path: &str, bytes: &[u8]) -> Self {
        self.files
            .borrow_mut()
            .insert(PathBuf::from(path), bytes.to_vec());
        self
    }

    /// A file that reports `size` bytes but reads as empty.
    pub fn sized(self, path: &str, size: u64) -> Self {
        self.sizes.borrow_mut().insert(PathBuf::from(path), size);
        self.with(path, b"")
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.borrow().get(Path::new(path)).cloned()
    }
}

impl LocalFiles for MemFiles {
    async fn size(&self, path: &Path) -> Result<u64> {
        if let Some(size) = self.sizes.borrow().get(path) {
            return Ok(*size);
        }
        self.files
            .borrow()
            .get(path)
            .map(|b| b.len() as u64)
            .ok_or_else(|| anyhow::anyhow!("no such file: {}", path.display()))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such file: {}", path.display()))
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }
}

// ── Config store ─────────────────────────────────────────────────────────────

/// Config store that keeps the saved value in memory.
#[derive(Default)]
pub struct MemConfigStore {
    pub saved: RefCell<Option<A0Config>>,
}

impl ConfigStore for MemConfigStore {
    fn load(&self) -> Result<A0Config> {
        Ok(self.saved.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &A0Config) -> Result<()> {
        *self.saved.borrow_mut() = Some(config.clone());
        Ok(())
    }

    fn path(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/tmp/a0-test/config.yaml"))
    }
}

// ── Reporters and observers ──────────────────────────────────────────────────

/// Records every progress message with its kind.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: RefCell<Vec<(&'static str, String)>>,
}

impl RecordingReporter {
    pub fn of(&self, kind: &str) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.events.borrow_mut().push(("step", message.to_string()));
    }
    fn success(&self, message: &str) {
        self.events.borrow_mut().push(("success", message.to_string()));
    }
    fn warn(&self, message: &str) {
        self.events.borrow_mut().push(("warn", message.to_string()));
    }
}

/// Records every view change.
#[derive(Default)]
pub struct RecordingObserver {
    pub changes: RefCell<Vec<ViewChange>>,
}

impl RecordingObserver {
    pub fn count(&self, pred: impl Fn(&ViewChange) -> bool) -> usize {
        self.changes.borrow().iter().filter(|c| pred(c)).count()
    }
}

impl UiObserver for RecordingObserver {
    fn notify(&self, change: &ViewChange) {
        self.changes.borrow_mut().push(change.clone());
    }
}
