//! Application service: volume overview and persistent content sync.

use anyhow::{Context, Result};

use crate::application::ports::BackendApi;
use crate::domain::error::BackendError;
use crate::domain::storage::{
    PERSISTENT_SYNC_ENDPOINT, StorageOverview, SyncRequest, SyncResult, VOLUME_OVERVIEW_ENDPOINT,
};

/// # Errors
///
/// Returns an error if the request fails, the reply is not an overview or
/// the backend reports failure.
pub async fn storage_overview(backend: &impl BackendApi) -> Result<StorageOverview> {
    let body = backend.get_json(VOLUME_OVERVIEW_ENDPOINT, &[]).await?;
    let overview: StorageOverview =
        serde_json::from_value(body).map_err(|e| BackendError::Malformed {
            endpoint: VOLUME_OVERVIEW_ENDPOINT.to_string(),
            reason: e.to_string(),
        })?;
    if !overview.success {
        anyhow::bail!(
            "{}",
            overview
                .error
                .as_deref()
                .unwrap_or("Failed to load volume overview.")
        );
    }
    Ok(overview)
}

/// # Errors
///
/// Returns an error if the request fails or the backend reports failure.
/// The log lines are kept in the error chain.
pub async fn run_sync(backend: &impl BackendApi, request: &SyncRequest) -> Result<SyncResult> {
    let body = serde_json::to_value(request).context("failed to encode sync request")?;
    let reply = backend.post_json(PERSISTENT_SYNC_ENDPOINT, &body).await?;
    let result = SyncResult::from_value(&reply);
    if !result.success {
        let message = result
            .error
            .clone()
            .unwrap_or_else(|| format!("The {} failed.", request.direction));
        return Err(anyhow::anyhow!("{}", result.log.join("\n")).context(message));
    }
    Ok(result)
}
