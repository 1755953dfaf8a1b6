//! `a0 chat`: send messages, follow a context, list conversations.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::app::AppContext;
use crate::application::ports::{BackendApi, NullObserver, UiObserver};
use crate::application::services::chat::send_message;
use crate::application::services::poll_loop::{PollCadence, run_poll_loop};
use crate::application::services::reconcile::ChatSession;
use crate::domain::chat::{ContextSummary, LogEntry, ViewChange};
use crate::infra::fs::LocalFs;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext};

/// Chat subcommands.
#[derive(Subcommand)]
pub enum ChatCommand {
    /// Send one message
    Send {
        /// Message text
        text: String,
        /// Attach a local file (repeatable)
        #[arg(long = "attach", value_name = "FILE")]
        attachments: Vec<PathBuf>,
        /// Context to send to
        #[arg(long, conflicts_with = "new")]
        context: Option<String>,
        /// Start a new context
        #[arg(long)]
        new: bool,
    },
    /// Follow a context and chat from stdin
    Watch {
        /// Context to follow (default: the backend's current one)
        #[arg(long)]
        context: Option<String>,
    },
    /// List chats and tasks
    Contexts,
}

/// Run a chat subcommand.
///
/// # Errors
///
/// Returns an error if the backend is unreachable or rejects the request.
pub async fn run(app: &AppContext, cmd: ChatCommand) -> Result<ExitCode> {
    let backend = app.backend()?;
    match cmd {
        ChatCommand::Send {
            text,
            attachments,
            context,
            new,
        } => send(app, &backend, &text, &attachments, context.as_deref(), new).await,
        ChatCommand::Watch { context } => watch(app, &backend, context.as_deref()).await,
        ChatCommand::Contexts => contexts(app, &backend).await,
    }
}

/// IANA zone reported to the backend with each poll.
fn local_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|e| {
        warn!(error = %e, "cannot determine local timezone, using UTC");
        "UTC".to_string()
    })
}

async fn send(
    app: &AppContext,
    backend: &impl BackendApi,
    text: &str,
    attachments: &[PathBuf],
    context: Option<&str>,
    new: bool,
) -> Result<ExitCode> {
    let observer = NullObserver;
    let session = ChatSession::new(backend, &observer, local_timezone());
    match context {
        Some(id) => {
            session.set_context(id);
        }
        None if new => {
            session.new_context();
        }
        None => {
            // Adopt whatever the backend is currently showing.
            session.reconcile().await?;
        }
    }
    let receipt = send_message(&session, &LocalFs, text, attachments).await?;
    app.emit(&receipt, |h| h.render_sent(&receipt))?;
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct ContextsSnapshot<'a> {
    active: Option<String>,
    contexts: &'a [ContextSummary],
    tasks: &'a [ContextSummary],
}

async fn contexts(app: &AppContext, backend: &impl BackendApi) -> Result<ExitCode> {
    let observer = NullObserver;
    let session = ChatSession::new(backend, &observer, local_timezone())
        .with_active_tab(app.config.chat.active_tab);
    session.reconcile().await?;
    let view = session.view();
    let snapshot = ContextsSnapshot {
        active: session.context(),
        contexts: &view.contexts,
        tasks: &view.tasks,
    };
    app.emit(&snapshot, |h| {
        h.render_contexts(&view.contexts, &view.tasks, snapshot.active.as_deref());
    })?;
    Ok(ExitCode::SUCCESS)
}

// ── Watch ─────────────────────────────────────────────────────────────────────

/// Prints view changes as they arrive. Entries are re-rendered in place by
/// printing only what grew since the last time they were shown.
pub struct WatchPrinter<'a> {
    ctx: &'a OutputContext,
    json: bool,
    printed: RefCell<HashMap<String, String>>,
}

impl<'a> WatchPrinter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext, json: bool) -> Self {
        Self {
            ctx,
            json,
            printed: RefCell::new(HashMap::new()),
        }
    }

    fn print_entry(&self, renderer: &HumanRenderer<'_>, entry: &LogEntry) {
        let mut printed = self.printed.borrow_mut();
        match printed.get(&entry.id) {
            Some(shown) if shown == &entry.content => {}
            Some(shown) if entry.content.starts_with(shown.as_str()) => {
                renderer.render_log_append(&entry.content[shown.len()..]);
            }
            _ => renderer.render_log_entry(entry),
        }
        printed.insert(entry.id.clone(), entry.content.clone());
    }
}

impl UiObserver for WatchPrinter<'_> {
    fn notify(&self, change: &ViewChange) {
        if self.json {
            if let Err(e) = JsonRenderer.render_event(change) {
                warn!(error = %format!("{e:#}"), "failed to print watch event");
            }
            return;
        }
        let renderer = HumanRenderer::new(self.ctx);
        match change {
            ViewChange::LogUpdated(entries) => {
                for entry in entries {
                    self.print_entry(&renderer, entry);
                }
            }
            ViewChange::HistoryCleared => self.printed.borrow_mut().clear(),
            ViewChange::ContextSwitched(id) => self.ctx.info(&format!("Following context {id}")),
            ViewChange::Notifications(items) => {
                for n in items {
                    renderer.render_notification(n);
                }
            }
            ViewChange::Connection(connected) => renderer.render_connection(*connected),
            ViewChange::Paused(paused) => {
                if *paused {
                    self.ctx.info("Agent paused");
                }
            }
            ViewChange::Progress(_) | ViewChange::Contexts(_) | ViewChange::Tasks(_) => {}
        }
    }
}

/// A line typed while watching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchInput {
    Message(String),
    NewContext,
    Switch(String),
    Quit,
    Empty,
}

impl WatchInput {
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        match line.split_once(char::is_whitespace) {
            _ if line == "/quit" || line == "/exit" => Self::Quit,
            _ if line == "/new" => Self::NewContext,
            Some(("/switch", id)) if !id.trim().is_empty() => Self::Switch(id.trim().to_string()),
            _ => Self::Message(line.to_string()),
        }
    }
}

async fn read_input<B: BackendApi, O: UiObserver>(
    app: &AppContext,
    session: &ChatSession<'_, B, O>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match WatchInput::parse(&line) {
            WatchInput::Empty => {}
            WatchInput::Quit => return Ok(()),
            WatchInput::NewContext => {
                session.new_context();
            }
            WatchInput::Switch(id) => {
                session.set_context(&id);
            }
            WatchInput::Message(text) => {
                if let Err(e) = send_message(session, &LocalFs, &text, &[]).await {
                    HumanRenderer::new(&app.output).render_error(&e);
                }
            }
        }
    }
    debug!("stdin closed; watching until interrupted");
    std::future::pending::<()>().await;
    Ok(())
}

async fn watch(app: &AppContext, backend: &impl BackendApi, context: Option<&str>) -> Result<ExitCode> {
    let printer = WatchPrinter::new(&app.output, app.is_json());
    let session = ChatSession::new(backend, &printer, local_timezone())
        .with_active_tab(app.config.chat.active_tab);
    if let Some(id) = context {
        session.set_context(id);
    }
    if !app.is_json() {
        app.output.info(&format!(
            "Watching {} (type a message, /new, /switch <id>, /quit)",
            backend.base_url()
        ));
    }

    let mut cadence = PollCadence::from_config(&app.config.poll);
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    tokio::select! {
        cycles = run_poll_loop(&session, &mut cadence, shutdown) => {
            debug!(cycles, "poll loop stopped");
        }
        result = read_input(app, &session) => result?,
    }
    Ok(ExitCode::SUCCESS)
}
