//! Application service: sending chat messages.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Value, json};

use crate::application::ports::{BackendApi, FormFile, FormPayload, LocalFiles, UiObserver};
use crate::application::services::reconcile::ChatSession;
use crate::domain::chat::LogEntry;
use crate::domain::context::generate_message_id;
use crate::domain::error::BackendError;

pub const MESSAGE_ENDPOINT: &str = "/message_async";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendReceipt {
    pub context: String,
    pub message_id: String,
    pub attachments: usize,
}

/// Submit `text` (plus any attachments) to the active context, creating one
/// first if none is active.
///
/// The message is rendered locally before the request goes out. The backend
/// may answer with a different context id, which then becomes active.
///
/// # Errors
///
/// Returns an error if an attachment cannot be read, the request fails, or
/// the reply carries no context id.
pub async fn send_message<B: BackendApi, O: UiObserver>(
    session: &ChatSession<'_, B, O>,
    files: &impl LocalFiles,
    text: &str,
    attachments: &[PathBuf],
) -> Result<SendReceipt> {
    let context = match session.context() {
        Some(id) => id,
        None => session.new_context(),
    };
    let message_id = generate_message_id();
    let heading = if attachments.is_empty() {
        "User message"
    } else {
        "Uploading attachments..."
    };
    session.render_local(LogEntry::local_user_message(&message_id, heading, text));

    let reply = if attachments.is_empty() {
        let body = json!({
            "text": text,
            "context": context,
            "message_id": message_id,
        });
        session.backend().post_json(MESSAGE_ENDPOINT, &body).await?
    } else {
        let mut form = FormPayload::default()
            .field("text", text)
            .field("context", &context)
            .field("message_id", &message_id);
        for path in attachments {
            let bytes = files
                .read(path)
                .await
                .with_context(|| format!("failed to read attachment {}", path.display()))?;
            let file_name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            form = form.file(FormFile {
                field: "attachments".to_string(),
                file_name,
                bytes,
            });
        }
        session.backend().post_form(MESSAGE_ENDPOINT, form).await?
    };

    let returned = reply
        .get("context")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| BackendError::Malformed {
            endpoint: MESSAGE_ENDPOINT.to_string(),
            reason: "No response returned.".to_string(),
        })?;
    session.set_context(returned);

    Ok(SendReceipt {
        context: returned.to_string(),
        message_id,
        attachments: attachments.len(),
    })
}
