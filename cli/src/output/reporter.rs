//! `TerminalReporter` and `JsonReporter`, the Presentation-layer
//! implementations of `ProgressReporter`.
//!
//! They let application services emit progress events without depending on
//! any presentation type directly.

use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::domain::response::{ProgressEvent, ProgressKind};
use crate::output::OutputContext;
use crate::output::json::format_line;

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` prints `"  → {message}"` (suppressed when `ctx.quiet`)
/// - `success()` prints `"  ✓ {message}"` (suppressed when `ctx.quiet`)
/// - `warn()` prints `"  ! {message}"` to stderr (never suppressed)
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if !self.ctx.quiet {
            println!("  {} {message}", "→".style(self.ctx.styles.info));
        }
    }

    fn success(&self, message: &str) {
        if !self.ctx.quiet {
            println!("  {} {message}", "✓".style(self.ctx.styles.success));
        }
    }

    fn warn(&self, message: &str) {
        eprintln!("  {} {message}", "!".style(self.ctx.styles.warning));
    }
}

/// Writes each progress event as one JSON line on stderr, leaving stdout
/// for the final envelope.
pub struct JsonReporter;

impl JsonReporter {
    fn emit(kind: ProgressKind, message: &str) {
        let event = ProgressEvent {
            kind,
            message: message.to_string(),
        };
        if let Ok(line) = format_line(&event) {
            eprintln!("{line}");
        }
    }
}

impl ProgressReporter for JsonReporter {
    fn step(&self, message: &str) {
        Self::emit(ProgressKind::Info, message);
    }

    fn success(&self, message: &str) {
        Self::emit(ProgressKind::Success, message);
    }

    fn warn(&self, message: &str) {
        Self::emit(ProgressKind::Error, message);
    }
}

/// Reporter matching the active output mode.
pub enum ModeReporter<'a> {
    Terminal(TerminalReporter<'a>),
    Json(JsonReporter),
}

impl ProgressReporter for ModeReporter<'_> {
    fn step(&self, message: &str) {
        match self {
            Self::Terminal(r) => r.step(message),
            Self::Json(r) => r.step(message),
        }
    }

    fn success(&self, message: &str) {
        match self {
            Self::Terminal(r) => r.success(message),
            Self::Json(r) => r.success(message),
        }
    }

    fn warn(&self, message: &str) {
        match self {
            Self::Terminal(r) => r.warn(message),
            Self::Json(r) => r.warn(message),
        }
    }
}
