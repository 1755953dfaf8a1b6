//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// Run and talk to a local Agent Zero instance
#[derive(Parser)]
#[command(
    name = "a0",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Backend URL (overrides `backend.url`)
    #[arg(long, global = true, env = "A0_BACKEND_URL")]
    pub backend: Option<String>,

    /// Skip confirmation prompts
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage the Agent Zero container
    #[command(subcommand)]
    Engine(commands::engine::EngineCommand),

    /// Send messages and follow conversations
    #[command(subcommand)]
    Chat(commands::chat::ChatCommand),

    /// Browse the agent's work directory
    #[command(subcommand)]
    Files(commands::files::FilesCommand),

    /// Print backend settings
    Settings,

    /// Show setup banners
    Banners,

    /// Inspect volumes and back up persistent content
    #[command(subcommand)]
    Storage(commands::storage::StorageCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Parse the process arguments. A bare `a0` prints help to stderr and
    /// exits 2, even when env-backed flags such as `NO_COLOR` are set.
    #[must_use]
    pub fn parse_or_help() -> Self {
        if std::env::args_os().len() <= 1 {
            let _ = Self::command().write_help(&mut std::io::stderr());
            std::process::exit(2);
        }
        Self::parse()
    }

    /// Build the application flags from parsed arguments.
    #[must_use]
    pub fn flags(&self) -> AppFlags {
        AppFlags {
            output: OutputFlags {
                no_color: self.no_color,
                quiet: self.quiet,
                json: self.json,
            },
            behaviour: BehaviourFlags {
                yes: self.yes,
                backend_url: self.backend.clone(),
            },
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self, app: &AppContext) -> Result<ExitCode> {
        match self.command {
            Command::Engine(cmd) => commands::engine::run(app, cmd).await,
            Command::Chat(cmd) => commands::chat::run(app, cmd).await,
            Command::Files(cmd) => commands::files::run(app, cmd).await,
            Command::Settings => commands::settings::run_settings(app).await,
            Command::Banners => commands::settings::run_banners(app).await,
            Command::Storage(cmd) => commands::storage::run(app, cmd).await,
            Command::Config(cmd) => commands::config::run(app, cmd),
            Command::Version => commands::version::run(app),
        }
    }
}
