//! Chat view state: rendered messages, notifications, and context lists.
//!
//! These types replace reactive UI stores. Mutations go through methods that
//! report what changed so the caller can notify observers explicitly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Log entries ───────────────────────────────────────────────────────────────

/// One message in a context's log, as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: String,
    /// Sequence number within the log.
    pub no: u64,
    /// `user`, `agent`, `response`, `tool`, `error`, ...
    #[serde(rename = "type")]
    pub kind: String,
    pub heading: String,
    pub content: String,
    /// Temporary entries are replaced by a later write to the same id.
    pub temp: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kvps: Option<Value>,
}

impl LogEntry {
    /// Read a log entry from untrusted JSON. Missing text fields default to
    /// empty strings and a missing `id` falls back to the sequence number.
    /// Returns `None` for values that are not objects.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let no = obj.get("no").and_then(Value::as_u64).unwrap_or(0);
        let id = obj
            .get("id")
            .and_then(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| no.to_string());
        Some(Self {
            id,
            no,
            kind: text("type"),
            heading: text("heading"),
            content: text("content"),
            temp: obj.get("temp").and_then(Value::as_bool).unwrap_or(false),
            kvps: obj.get("kvps").filter(|v| !v.is_null()).cloned(),
        })
    }

    /// A message authored locally before the backend has echoed it.
    #[must_use]
    pub fn local_user_message(id: &str, heading: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            no: 0,
            kind: "user".to_string(),
            heading: heading.to_string(),
            content: content.to_string(),
            temp: false,
            kvps: None,
        }
    }
}

/// Rendered history: entries in order of first appearance, last write per id
/// wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageLog {
    order: Vec<String>,
    entries: HashMap<String, LogEntry>,
}

impl MessageLog {
    /// Insert or replace by id. Returns `true` when the id is new.
    pub fn apply(&mut self, entry: LogEntry) -> bool {
        let is_new = !self.entries.contains_key(&entry.id);
        if is_new {
            self.order.push(entry.id.clone());
        }
        self.entries.insert(entry.id.clone(), entry);
        is_new
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LogEntry> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }
}

// ── Notifications ─────────────────────────────────────────────────────────────

/// A backend notification (toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Default for Notification {
    fn default() -> Self {
        Self {
            id: String::new(),
            kind: "info".to_string(),
            title: String::new(),
            message: String::new(),
            detail: String::new(),
            created_at: None,
        }
    }
}

/// Notifications delivered by one poll response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationDelta {
    pub guid: String,
    pub version: u64,
    pub items: Vec<Notification>,
}

/// Process-wide notification list. Its cursor is independent of the active
/// context and survives context switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationStore {
    guid: String,
    version: u64,
    items: Vec<Notification>,
}

impl NotificationStore {
    /// Cursor sent as `notifications_from`.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    /// Merge a delta and return the notifications that were not seen before.
    pub fn update(&mut self, delta: NotificationDelta) -> Vec<Notification> {
        if !delta.guid.is_empty() && delta.guid != self.guid {
            self.items.clear();
            self.version = 0;
            self.guid = delta.guid;
        }
        let mut fresh = Vec::new();
        for item in delta.items {
            if let Some(existing) = self
                .items
                .iter_mut()
                .find(|n| !item.id.is_empty() && n.id == item.id)
            {
                *existing = item;
            } else {
                fresh.push(item.clone());
                self.items.push(item);
            }
        }
        self.version = self.version.max(delta.version);
        fresh
    }
}

// ── Contexts ──────────────────────────────────────────────────────────────────

/// Entry in the chats or tasks list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ContextSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Task lists report the scheduler state (`idle`, `running`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl ContextSummary {
    /// Read a list entry from untrusted JSON. Entries without an id are
    /// rejected; scalar fields of any type are rendered as text.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| match obj.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Some(Self {
            id: text("id")?,
            name: text("name"),
            created_at: text("created_at"),
            state: text("state"),
        })
    }
}

/// First id in a list, the one selected when nothing else is.
#[must_use]
pub fn first_id(list: &[ContextSummary]) -> Option<&str> {
    list.first().map(|c| c.id.as_str())
}

#[must_use]
pub fn contains_id(list: &[ContextSummary], id: &str) -> bool {
    list.iter().any(|c| c.id == id)
}

// ── View ──────────────────────────────────────────────────────────────────────

/// Progress bar text and whether it is animating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub text: String,
    pub active: bool,
}

/// Whole client-side chat state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatView {
    pub messages: MessageLog,
    pub notifications: NotificationStore,
    pub progress: Progress,
    pub paused: bool,
    pub connected: bool,
    pub contexts: Vec<ContextSummary>,
    pub tasks: Vec<ContextSummary>,
}

/// What an observer is told after each mutating step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "change", content = "data", rename_all = "snake_case")]
pub enum ViewChange {
    /// Entries were (re)rendered, in application order.
    LogUpdated(Vec<LogEntry>),
    HistoryCleared,
    ContextSwitched(String),
    Progress(Progress),
    /// Newly arrived notifications.
    Notifications(Vec<Notification>),
    Paused(bool),
    Connection(bool),
    Contexts(Vec<ContextSummary>),
    Tasks(Vec<ContextSummary>),
}
