//! Active-context tracking and client-side identifier generation.

use rand::Rng;
use rand::distributions::Alphanumeric;

const SHORT_ID_LEN: usize = 8;

/// Which conversation the client is following.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContextState {
    #[default]
    NoContext,
    Active(String),
}

/// Active context plus the log cursors that belong to it.
///
/// The log cursor is only meaningful for the active context, so every switch
/// resets it. `log_version` never decreases for a fixed `log_guid`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextTracker {
    state: ContextState,
    log_version: u64,
    log_guid: String,
}

impl ContextTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start out following `id` instead of waiting for the backend's choice.
    #[must_use]
    pub fn with_context(id: impl Into<String>) -> Self {
        Self {
            state: ContextState::Active(id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn state(&self) -> &ContextState {
        &self.state
    }

    /// Id of the active context, if any.
    #[must_use]
    pub fn active(&self) -> Option<&str> {
        match &self.state {
            ContextState::NoContext => None,
            ContextState::Active(id) => Some(id),
        }
    }

    #[must_use]
    pub fn log_version(&self) -> u64 {
        self.log_version
    }

    #[must_use]
    pub fn log_guid(&self) -> &str {
        &self.log_guid
    }

    /// Switch to `id`. Returns `false` (and changes nothing) when it is
    /// already active; otherwise the log cursor is reset.
    pub fn set_context(&mut self, id: &str) -> bool {
        if self.active() == Some(id) {
            return false;
        }
        self.state = ContextState::Active(id.to_string());
        self.log_version = 0;
        self.log_guid.clear();
        true
    }

    /// Switch to a freshly generated context id and return it.
    pub fn new_context(&mut self) -> String {
        let id = generate_context_id();
        self.set_context(&id);
        id
    }

    /// Discard the log cursor and adopt `guid` as the current log identity.
    pub fn reset_log(&mut self, guid: &str) {
        self.log_version = 0;
        guid.clone_into(&mut self.log_guid);
    }

    /// Record the cursor reported by a fully applied response.
    pub fn advance(&mut self, version: u64, guid: &str) {
        self.log_version = version;
        guid.clone_into(&mut self.log_guid);
    }

    /// True when a response with this cursor means the server-side log was
    /// reset since we last looked.
    #[must_use]
    pub fn is_reset(&self, guid: &str, version: u64) -> bool {
        self.log_guid != guid || version < self.log_version
    }
}

/// Eight random alphanumeric characters, the format the backend accepts for
/// client-created contexts.
#[must_use]
pub fn generate_context_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHORT_ID_LEN)
        .map(char::from)
        .collect()
}

/// Whether `id` has the shape produced by [`generate_context_id`].
#[must_use]
pub fn is_short_id(id: &str) -> bool {
    id.len() == SHORT_ID_LEN && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Random version-4 UUID used for message ids.
#[must_use]
pub fn generate_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
