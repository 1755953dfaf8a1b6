//! JSON output helpers.
//!
//! Every `--json` command prints exactly one [`Envelope`] on stdout, whether
//! it succeeds or fails. Streamed events (pull progress, chat changes) go out
//! as one compact JSON object per line.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::response::Envelope;

/// Machine-readable renderer.
pub struct JsonRenderer;

impl JsonRenderer {
    /// Print `{"success": true, "data": ...}`.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render<T: Serialize>(&self, data: &T) -> Result<()> {
        println!("{}", format_envelope(&Envelope::ok(data))?);
        Ok(())
    }

    /// Print `{"success": false, "error": {...}}`.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_error(&self, err: &anyhow::Error) -> Result<()> {
        println!("{}", format_envelope(&Envelope::<()>::failure(err))?);
        Ok(())
    }

    /// Print one event as a single line.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_event<T: Serialize>(&self, event: &T) -> Result<()> {
        println!("{}", format_line(event)?);
        Ok(())
    }
}

/// Pretty-printed envelope.
///
/// # Errors
///
/// Returns an error if JSON serialization fails (should not happen in
/// practice: `serde_json` only fails on non-finite floats and maps with
/// non-string keys, neither of which appear here).
pub fn format_envelope<T: Serialize>(envelope: &Envelope<T>) -> Result<String> {
    serde_json::to_string_pretty(envelope).context("JSON serialization failed")
}

/// Compact single-line JSON.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_line<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).context("JSON serialization failed")
}
