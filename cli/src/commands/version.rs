//! Version command

use std::process::ExitCode;

use anyhow::Result;
use serde_json::json;

use crate::app::AppContext;

/// Run the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let version = env!("CARGO_PKG_VERSION");
    app.emit(&json!({ "version": version }), |h| h.render_version(version))?;
    Ok(ExitCode::SUCCESS)
}
