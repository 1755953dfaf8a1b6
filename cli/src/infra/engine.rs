//! Infrastructure implementation of the `ContainerEngine` port.
//!
//! `CliEngine<R>` routes every engine invocation through a `CommandRunner`,
//! choosing the timeout from the kind of command.

use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use tracing::trace;

use crate::application::ports::{CommandRunner, ContainerEngine, OutputLine, StreamOutcome};
use crate::domain::engine::{EngineCommand, EngineKind};

/// Adapter that runs docker/podman CLI commands.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
pub struct CliEngine<R: CommandRunner> {
    runner: R,
    command_timeout: Duration,
    pull_timeout: Duration,
}

impl<R: CommandRunner> CliEngine<R> {
    pub fn new(runner: R, command_timeout: Duration, pull_timeout: Duration) -> Self {
        Self {
            runner,
            command_timeout,
            pull_timeout,
        }
    }

    fn timeout_for(&self, command: &EngineCommand<'_>) -> Duration {
        if command.is_long_running() {
            self.pull_timeout
        } else {
            self.command_timeout
        }
    }
}

impl<R: CommandRunner> ContainerEngine for CliEngine<R> {
    async fn exec(&self, engine: EngineKind, command: &EngineCommand<'_>) -> Result<Output> {
        let args = command.args();
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        trace!(program = engine.program(), args = ?argv, "running engine command");
        self.runner
            .run_with_timeout(engine.program(), &argv, self.timeout_for(command))
            .await
    }

    async fn stream(
        &self,
        engine: EngineKind,
        command: &EngineCommand<'_>,
        sink: &dyn Fn(OutputLine),
    ) -> Result<StreamOutcome> {
        let args = command.args();
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        trace!(program = engine.program(), args = ?argv, "streaming engine command");
        self.runner
            .run_streaming(engine.program(), &argv, self.timeout_for(command), sink)
            .await
    }
}
