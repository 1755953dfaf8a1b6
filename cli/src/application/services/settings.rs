//! Application service: settings snapshot and welcome banners.

use anyhow::Result;
use serde_json::{Value, json};
use tracing::warn;

use crate::application::ports::BackendApi;
use crate::domain::banners::{
    Banner, BannerContext, WELCOME_BANNERS_ENDPOINT, frontend_checks, merge_banners, sort_banners,
};

pub const SETTINGS_ENDPOINT: &str = "/settings_get";

/// Fetch the backend's settings snapshot as-is.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn fetch_settings(backend: &impl BackendApi) -> Result<Value> {
    backend.post_json(SETTINGS_ENDPOINT, &Value::Null).await
}

/// Run the local checks, ask the backend for its banners, merge and sort.
///
/// A missing settings snapshot or a failing banner endpoint degrades to
/// fewer banners rather than an error.
pub async fn load_banners(backend: &impl BackendApi, now: String) -> Vec<Banner> {
    let snapshot = match fetch_settings(backend).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "failed to load settings for banners");
            Value::Null
        }
    };
    let settings = snapshot.get("settings").cloned().unwrap_or(Value::Null);
    let context = BannerContext::new(backend.base_url(), &settings, now);
    let local = frontend_checks(&context, &settings);

    let body = json!({
        "context": context,
        "frontend_banners": local,
    });
    let remote = match backend.post_json(WELCOME_BANNERS_ENDPOINT, &body).await {
        Ok(reply) => reply
            .get("banners")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "failed to load backend banners");
            Vec::new()
        }
    };
    sort_banners(merge_banners(&local, &remote))
}
