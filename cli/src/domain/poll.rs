//! `/poll` request and response shapes.
//!
//! The response is checked field by field before anything in it is trusted.
//! Required fields must be present with the right type; everything else falls
//! back to an empty default.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::chat::{ContextSummary, LogEntry, Notification, NotificationDelta};

pub const POLL_ENDPOINT: &str = "/poll";

/// Cursors the client sends on every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollRequest {
    pub log_from: u64,
    pub notifications_from: u64,
    pub context: Option<String>,
    pub timezone: String,
}

/// A validated poll response.
#[derive(Debug, Clone, PartialEq)]
pub struct PollResponse {
    /// `None` when the backend has no context to report yet.
    pub context: Option<String>,
    pub log_guid: String,
    pub log_version: u64,
    pub logs: Vec<LogEntry>,
    pub log_progress: String,
    pub log_progress_active: bool,
    pub contexts: Vec<ContextSummary>,
    pub tasks: Vec<ContextSummary>,
    pub notifications: NotificationDelta,
    pub paused: bool,
}

impl PollResponse {
    /// Validate an untrusted JSON body.
    ///
    /// # Errors
    ///
    /// Returns a description of the first missing or mistyped required field.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| "response is not a JSON object".to_string())?;

        let context = match obj.get("context") {
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) => None,
            Some(_) => return Err("field 'context' is not a string".to_string()),
            None => return Err("missing field 'context'".to_string()),
        };
        let log_guid = match obj.get("log_guid") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err("field 'log_guid' is not a string".to_string()),
            None => return Err("missing field 'log_guid'".to_string()),
        };
        let log_version = match obj.get("log_version") {
            Some(v) => v
                .as_u64()
                .ok_or_else(|| "field 'log_version' is not a non-negative integer".to_string())?,
            None => return Err("missing field 'log_version'".to_string()),
        };

        let logs = array(obj, "logs")
            .iter()
            .filter_map(LogEntry::from_value)
            .collect();

        Ok(Self {
            context,
            log_guid,
            log_version,
            logs,
            log_progress: progress_text(obj.get("log_progress")),
            log_progress_active: flag(obj, "log_progress_active"),
            contexts: summaries(obj, "contexts"),
            tasks: summaries(obj, "tasks"),
            notifications: NotificationDelta {
                guid: obj
                    .get("notifications_guid")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                version: obj
                    .get("notifications_version")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
                items: array(obj, "notifications")
                    .iter()
                    .filter_map(|v| serde_json::from_value::<Notification>(v.clone()).ok())
                    .collect(),
            },
            paused: flag(obj, "paused"),
        })
    }
}

fn array<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice)
}

fn flag(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn progress_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        _ => String::new(),
    }
}

fn summaries(obj: &Map<String, Value>, key: &str) -> Vec<ContextSummary> {
    array(obj, key)
        .iter()
        .filter_map(ContextSummary::from_value)
        .collect()
}
