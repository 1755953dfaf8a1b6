//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Engine errors ─────────────────────────────────────────────────────────────

/// Machine-readable code for an unreachable container engine.
pub const CODE_ENGINE_UNAVAILABLE: &str = "DOCKER_UNAVAILABLE";
/// Machine-readable code for a failed engine command.
pub const CODE_COMMAND_FAILED: &str = "DOCKER_COMMAND_FAILED";
/// Machine-readable code for anything that is not an engine error.
pub const CODE_UNEXPECTED: &str = "UNEXPECTED_ERROR";

/// Errors raised by container engine operations.
///
/// `Unavailable` means the user has to fix their setup (install the engine,
/// start the daemon, fix permissions). `CommandFailed` is a single operation
/// going wrong while the engine itself is reachable.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("{message}")]
    Unavailable {
        message: String,
        details: Option<String>,
    },

    #[error("{message}")]
    CommandFailed {
        message: String,
        details: Option<String>,
    },
}

impl EngineError {
    /// Stable error code exposed in JSON output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => CODE_ENGINE_UNAVAILABLE,
            Self::CommandFailed { .. } => CODE_COMMAND_FAILED,
        }
    }

    /// Raw engine output attached to the error, if any.
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Unavailable { details, .. } | Self::CommandFailed { details, .. } => {
                details.as_deref()
            }
        }
    }

    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// True when the details mention `needle` (used for idempotent removal).
    #[must_use]
    pub fn details_contain(&self, needle: &str) -> bool {
        self.details().is_some_and(|d| d.contains(needle))
    }
}

// ── Backend errors ────────────────────────────────────────────────────────────

/// Errors talking to the agent backend's HTTP API.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}

// ── File browser errors ───────────────────────────────────────────────────────

/// Errors related to work-directory file operations.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("File {name} exceeds the maximum allowed size of 100MB.")]
    TooLarge { name: String },

    #[error("File does not exist: {0}")]
    NotFound(String),
}

// ── Persistent sync errors ────────────────────────────────────────────────────

/// Validation errors for backup/restore of persistent content.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Enter a destination folder that is mounted into the container.")]
    MissingTarget,

    #[error("Select at least one content type to sync.")]
    NothingSelected,

    #[error("Unknown sync direction '{0}': expected backup or restore")]
    UnknownDirection(String),
}
