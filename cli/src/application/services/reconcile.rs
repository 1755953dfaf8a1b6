//! Application service: chat session and poll reconciliation.
//!
//! One `reconcile` call is one poll cycle. It sends the current cursors,
//! validates the reply, and applies it to the [`ChatView`], notifying the
//! observer after every mutating step. All state lives in this session
//! object and is only touched between awaits.

use std::cell::RefCell;

use anyhow::{Context, Result};
use tracing::debug;

use crate::application::ports::{BackendApi, UiObserver};
use crate::domain::chat::{ChatView, ContextSummary, LogEntry, Progress, ViewChange, first_id};
use crate::domain::config::ActiveTab;
use crate::domain::context::ContextTracker;
use crate::domain::error::BackendError;
use crate::domain::poll::{POLL_ENDPOINT, PollRequest, PollResponse};

/// What one reconciliation cycle observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleOutcome {
    /// New log data arrived.
    pub activity: bool,
    /// The response belonged to another context and was dropped.
    pub stale: bool,
}

enum Step {
    Done(CycleOutcome),
    Resync,
}

/// Client-side chat state plus the backend it reconciles against.
pub struct ChatSession<'a, B: BackendApi, O: UiObserver> {
    backend: &'a B,
    observer: &'a O,
    tracker: RefCell<ContextTracker>,
    view: RefCell<ChatView>,
    active_tab: ActiveTab,
    timezone: String,
}

impl<'a, B: BackendApi, O: UiObserver> ChatSession<'a, B, O> {
    pub fn new(backend: &'a B, observer: &'a O, timezone: impl Into<String>) -> Self {
        Self {
            backend,
            observer,
            tracker: RefCell::new(ContextTracker::new()),
            view: RefCell::new(ChatView::default()),
            active_tab: ActiveTab::default(),
            timezone: timezone.into(),
        }
    }

    #[must_use]
    pub fn with_active_tab(mut self, tab: ActiveTab) -> Self {
        self.active_tab = tab;
        self
    }

    pub fn backend(&self) -> &'a B {
        self.backend
    }

    /// Id of the context being followed.
    #[must_use]
    pub fn context(&self) -> Option<String> {
        self.tracker.borrow().active().map(str::to_string)
    }

    #[must_use]
    pub fn log_version(&self) -> u64 {
        self.tracker.borrow().log_version()
    }

    #[must_use]
    pub fn log_guid(&self) -> String {
        self.tracker.borrow().log_guid().to_string()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.view.borrow().connected
    }

    /// Copy of the current view.
    #[must_use]
    pub fn view(&self) -> ChatView {
        self.view.borrow().clone()
    }

    /// Follow `id`. A no-op when `id` is already active; otherwise the log
    /// cursor and rendered history are discarded.
    pub fn set_context(&self, id: &str) -> bool {
        let switched = self.tracker.borrow_mut().set_context(id);
        if switched {
            debug!(context = id, "switched context");
            self.clear_history();
            self.observer.notify(&ViewChange::ContextSwitched(id.to_string()));
        }
        switched
    }

    /// Start a fresh client-side context and follow it.
    pub fn new_context(&self) -> String {
        let id = self.tracker.borrow_mut().new_context();
        debug!(context = %id, "created context");
        self.clear_history();
        self.observer.notify(&ViewChange::ContextSwitched(id.clone()));
        id
    }

    /// Render an entry that did not come from a poll, e.g. the user's own
    /// message right after sending it.
    pub fn render_local(&self, entry: LogEntry) {
        self.view.borrow_mut().messages.apply(entry.clone());
        self.observer.notify(&ViewChange::LogUpdated(vec![entry]));
    }

    fn clear_history(&self) {
        self.view.borrow_mut().messages.clear();
        self.observer.notify(&ViewChange::HistoryCleared);
    }

    fn set_connected(&self, connected: bool) {
        let changed = {
            let mut view = self.view.borrow_mut();
            std::mem::replace(&mut view.connected, connected) != connected
        };
        if changed {
            self.observer.notify(&ViewChange::Connection(connected));
        }
    }

    /// Run one poll cycle.
    ///
    /// On a log reset the history is cleared and at most one extra request
    /// is made straight away; the outcome is that of the last request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply is malformed. The
    /// view is then marked disconnected and no cursor is touched.
    pub async fn reconcile(&self) -> Result<CycleOutcome> {
        let mut allow_resync = true;
        loop {
            match self.cycle(allow_resync).await {
                Ok(Step::Done(outcome)) => return Ok(outcome),
                Ok(Step::Resync) => allow_resync = false,
                Err(e) => {
                    self.set_connected(false);
                    return Err(e);
                }
            }
        }
    }

    async fn cycle(&self, allow_resync: bool) -> Result<Step> {
        let request = {
            let tracker = self.tracker.borrow();
            PollRequest {
                log_from: tracker.log_version(),
                notifications_from: self.view.borrow().notifications.version(),
                context: tracker.active().map(str::to_string),
                timezone: self.timezone.clone(),
            }
        };
        let body = serde_json::to_value(&request).context("failed to encode poll request")?;
        let raw = self.backend.post_json(POLL_ENDPOINT, &body).await?;
        let response = PollResponse::from_value(&raw).map_err(|reason| BackendError::Malformed {
            endpoint: POLL_ENDPOINT.to_string(),
            reason,
        })?;

        if let (None, Some(id)) = (self.context(), response.context.as_deref()) {
            self.set_context(id);
        }
        if self.context() != response.context {
            debug!(
                expected = ?self.context(),
                got = ?response.context,
                "dropping poll response for another context"
            );
            return Ok(Step::Done(CycleOutcome {
                activity: false,
                stale: true,
            }));
        }

        let (reset, fresh_cursor) = {
            let tracker = self.tracker.borrow();
            (
                tracker.is_reset(&response.log_guid, response.log_version),
                tracker.log_guid().is_empty() && request.log_from == 0,
            )
        };
        if reset && !fresh_cursor {
            debug!(guid = %response.log_guid, "log reset by backend");
            self.clear_history();
            self.tracker.borrow_mut().reset_log(&response.log_guid);
            if allow_resync {
                return Ok(Step::Resync);
            }
            // Reset twice in a row; pick it up on the next cycle.
            return Ok(Step::Done(CycleOutcome {
                activity: true,
                stale: false,
            }));
        }

        Ok(Step::Done(self.apply(response)))
    }

    fn apply(&self, response: PollResponse) -> CycleOutcome {
        let PollResponse {
            log_guid,
            log_version,
            logs,
            log_progress,
            log_progress_active,
            contexts,
            tasks,
            notifications,
            paused,
            ..
        } = response;

        let activity = log_version != self.tracker.borrow().log_version();
        if activity && !logs.is_empty() {
            {
                let mut view = self.view.borrow_mut();
                for entry in &logs {
                    view.messages.apply(entry.clone());
                }
            }
            self.observer.notify(&ViewChange::LogUpdated(logs));
        }

        let progress = Progress {
            text: log_progress,
            active: log_progress_active,
        };
        if self.replace_if_changed(|v| &mut v.progress, progress.clone()) {
            self.observer.notify(&ViewChange::Progress(progress));
        }

        let fresh = self.view.borrow_mut().notifications.update(notifications);
        if !fresh.is_empty() {
            self.observer.notify(&ViewChange::Notifications(fresh));
        }

        if self.replace_if_changed(|v| &mut v.paused, paused) {
            self.observer.notify(&ViewChange::Paused(paused));
        }

        self.set_connected(true);

        if self.replace_if_changed(|v| &mut v.contexts, contexts.clone()) {
            self.observer.notify(&ViewChange::Contexts(contexts));
        }
        if self.replace_if_changed(|v| &mut v.tasks, tasks.clone()) {
            self.observer.notify(&ViewChange::Tasks(tasks));
        }

        self.tracker.borrow_mut().advance(log_version, &log_guid);
        self.follow_selection();

        CycleOutcome {
            activity,
            stale: false,
        }
    }

    /// Keep the active context inside the list shown for the active tab.
    fn follow_selection(&self) {
        let target = {
            let view = self.view.borrow();
            let list: &[ContextSummary] = match self.active_tab {
                ActiveTab::Chats => &view.contexts,
                ActiveTab::Tasks => &view.tasks,
            };
            let active = self.context();
            match (active.as_deref(), first_id(list)) {
                (Some(id), Some(first)) if !list.iter().any(|c| c.id == id) => {
                    Some(first.to_string())
                }
                (None, Some(first)) => Some(first.to_string()),
                _ => None,
            }
        };
        if let Some(id) = target {
            self.set_context(&id);
        }
    }

    fn replace_if_changed<T: PartialEq>(
        &self,
        field: impl FnOnce(&mut ChatView) -> &mut T,
        value: T,
    ) -> bool {
        let mut view = self.view.borrow_mut();
        let slot = field(&mut view);
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }
}
