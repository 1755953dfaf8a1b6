//! Normalized result envelope and progress events for machine-readable output.

use serde::Serialize;

use crate::domain::error::{CODE_UNEXPECTED, EngineError};

/// `{code, message, details?}`, the only error shape callers ever see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorPayload {
    /// Normalize any error. Engine errors keep their code and details;
    /// everything else becomes `UNEXPECTED_ERROR` with the full cause chain.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        if let Some(engine) = err.downcast_ref::<EngineError>() {
            return Self {
                code: engine.code().to_string(),
                message: engine.to_string(),
                details: engine.details().map(str::to_string),
            };
        }
        let chain = format!("{err:?}");
        let message = err.to_string();
        Self {
            code: CODE_UNEXPECTED.to_string(),
            details: Some(chain).filter(|c| *c != message),
            message,
        }
    }
}

/// `{success, data?, error?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl<T> Envelope<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(err: &anyhow::Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorPayload::from_error(err)),
        }
    }
}

/// Severity of a streamed progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressKind {
    Info,
    Error,
    Success,
}

/// One event on the progress channel, e.g. a line of `pull` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub kind: ProgressKind,
    pub message: String,
}
