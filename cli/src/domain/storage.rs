//! Persistent storage: the backend's docker volume snapshot and
//! backup/restore of prompts and knowledge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::SyncError;

pub const VOLUME_OVERVIEW_ENDPOINT: &str = "/docker_volume_overview";
pub const PERSISTENT_SYNC_ENDPOINT: &str = "/persistent_sync";

// ── Volume overview ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Mount {
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MountedContainer {
    pub name: String,
    pub id: String,
    pub mounts: Vec<Mount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VolumeSnapshot {
    pub name: String,
    pub driver: String,
    pub mountpoint: String,
}

/// `/docker_volume_overview` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageOverview {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub containers: Vec<MountedContainer>,
    pub volumes: Vec<VolumeSnapshot>,
}

impl StorageOverview {
    /// Host paths that could serve as sync targets: bind mount sources, then
    /// volume mountpoints, without duplicates.
    #[must_use]
    pub fn detected_host_paths(&self) -> Vec<String> {
        let binds = self
            .containers
            .iter()
            .flat_map(|c| &c.mounts)
            .filter(|m| m.kind == "bind" && !m.source.is_empty())
            .map(|m| m.source.as_str());
        let volumes = self
            .volumes
            .iter()
            .map(|v| v.mountpoint.as_str())
            .filter(|p| !p.is_empty());

        let mut paths: Vec<String> = Vec::new();
        for path in binds.chain(volumes) {
            if !paths.iter().any(|p| p == path) {
                paths.push(path.to_string());
            }
        }
        paths
    }
}

// ── Sync ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    Backup,
    Restore,
}

impl SyncDirection {
    /// Past tense used in the success message.
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Backup => "Backed up",
            Self::Restore => "Restored",
        }
    }
}

impl FromStr for SyncDirection {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "backup" => Ok(Self::Backup),
            "restore" => Ok(Self::Restore),
            _ => Err(SyncError::UnknownDirection(s.to_string())),
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Backup => "backup",
            Self::Restore => "restore",
        })
    }
}

/// Content groups that can be synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSelection {
    pub prompts: bool,
    pub knowledge: bool,
}

impl Default for SyncSelection {
    fn default() -> Self {
        Self {
            prompts: true,
            knowledge: true,
        }
    }
}

/// Validated `/persistent_sync` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncRequest {
    pub direction: SyncDirection,
    pub target_path: String,
    pub items: Vec<&'static str>,
    pub clean_destination: bool,
}

impl SyncRequest {
    /// # Errors
    ///
    /// Returns [`SyncError::MissingTarget`] for a blank target and
    /// [`SyncError::NothingSelected`] when neither group is selected.
    pub fn new(
        direction: SyncDirection,
        target_path: &str,
        selection: SyncSelection,
        clean_destination: bool,
    ) -> Result<Self, SyncError> {
        let target_path = target_path.trim();
        if target_path.is_empty() {
            return Err(SyncError::MissingTarget);
        }
        let mut items = Vec::new();
        if selection.prompts {
            items.push("prompts");
        }
        if selection.knowledge {
            items.push("knowledge");
        }
        if items.is_empty() {
            return Err(SyncError::NothingSelected);
        }
        Ok(Self {
            direction,
            target_path: target_path.to_string(),
            items,
            clean_destination,
        })
    }
}

/// `/persistent_sync` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct SyncResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
    pub log: Vec<String>,
}

impl SyncResult {
    #[must_use]
    pub fn from_value(body: &Value) -> Self {
        let text = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            success: body.get("success").and_then(Value::as_bool).unwrap_or(false),
            error: text("error"),
            target_path: text("target_path"),
            log: body
                .get("log")
                .and_then(Value::as_array)
                .map(|lines| {
                    lines
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}
