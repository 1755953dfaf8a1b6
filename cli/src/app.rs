//! Application context: unified state passed to every command handler.
//!
//! `AppContext` owns the output context, the loaded configuration and the
//! config store, and builds the engine session and backend client on demand.
//! Adding a new cross-cutting concern requires only one field change here.

use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::application::ports::ConfigStore;
use crate::application::services::engine_session::EngineSession;
use crate::domain::config::A0Config;
use crate::domain::engine::ResourceSpec;
use crate::infra::backend::HttpBackend;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::engine::CliEngine;
use crate::output::{
    HumanRenderer, JsonRenderer, JsonReporter, ModeReporter, OutputContext, Renderer,
    TerminalReporter,
};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `A0_YES` env vars).
    pub yes: bool,
    /// Backend URL overriding `backend.url`.
    pub backend_url: Option<String>,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Production engine session type.
pub type CliEngineSession = EngineSession<CliEngine<TokioCommandRunner>>;

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Where the configuration lives.
    pub config_store: YamlConfigStore,
    /// Configuration loaded at startup, with flag overrides applied.
    pub config: A0Config,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or `A0_YES`
    /// environment variables are present.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("A0_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        let config_store = YamlConfigStore;
        let mut config = config_store.load()?;
        if let Some(url) = &flags.behaviour.backend_url {
            config.backend.url = url.trim_end_matches('/').to_string();
        }

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            config_store,
            config,
            non_interactive,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Print `data` as an envelope in JSON mode, or through `human` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn emit<T: Serialize>(&self, data: &T, human: impl FnOnce(&HumanRenderer<'_>)) -> Result<()> {
        match self.renderer() {
            Renderer::Human(renderer) => {
                human(&renderer);
                Ok(())
            }
            Renderer::Json(renderer) => renderer.render(data),
        }
    }

    /// Progress reporter for the current output mode.
    #[must_use]
    pub fn reporter(&self) -> ModeReporter<'_> {
        match self.mode {
            OutputMode::Human => ModeReporter::Terminal(TerminalReporter::new(&self.output)),
            OutputMode::Json => ModeReporter::Json(JsonReporter),
        }
    }

    /// Managed image, container and port from the configuration.
    #[must_use]
    pub fn resources(&self) -> ResourceSpec {
        ResourceSpec {
            image: self.config.engine.image.clone(),
            container_name: self.config.engine.container_name.clone(),
            port: self.config.engine.port,
        }
    }

    /// Engine session for this invocation.
    #[must_use]
    pub fn engine_session(&self) -> CliEngineSession {
        let engine = &self.config.engine;
        let command_timeout = Duration::from_secs(engine.command_timeout_secs);
        let cli = CliEngine::new(
            TokioCommandRunner::new(command_timeout),
            command_timeout,
            Duration::from_secs(engine.pull_timeout_secs),
        );
        EngineSession::new(cli, engine.runtime, self.resources())
    }

    /// HTTP client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn backend(&self) -> Result<HttpBackend> {
        HttpBackend::new(
            &self.config.backend.url,
            Duration::from_secs(self.config.backend.timeout_secs),
        )
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `A0_YES` env),
    /// returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}
