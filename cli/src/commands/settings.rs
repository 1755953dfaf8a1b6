//! `a0 settings` and `a0 banners`.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::settings::{fetch_settings, load_banners};
use crate::output::progress::with_spinner;

/// Print the backend settings snapshot.
///
/// # Errors
///
/// Returns an error if the backend request fails.
pub async fn run_settings(app: &AppContext) -> Result<ExitCode> {
    let backend = app.backend()?;
    let settings = fetch_settings(&backend).await?;
    app.emit(&settings, |h| h.render_settings(&settings))?;
    Ok(ExitCode::SUCCESS)
}

/// Print the merged setup banners.
///
/// # Errors
///
/// Returns an error only if the HTTP client cannot be built; backend
/// failures degrade to fewer banners.
pub async fn run_banners(app: &AppContext) -> Result<ExitCode> {
    let backend = app.backend()?;
    let now = chrono::Utc::now().to_rfc3339();
    let banners = with_spinner(&app.output, "Checking setup...", async {
        Ok(load_banners(&backend, now).await)
    })
    .await?;
    app.emit(&banners, |h| h.render_banners(&banners))?;
    Ok(ExitCode::SUCCESS)
}
