//! Work-directory file browser types, sorting, and upload rules.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::FileError;

/// Path placeholder the backend expands to its working directory.
pub const DEFAULT_WORK_DIR: &str = "$WORK_DIR";

/// Largest non-archive file accepted for upload.
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "tar", "gz", "rar", "7z"];

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
    /// Modification time as reported by the backend.
    pub modified: String,
}

/// A directory listing plus where it sits in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Listing {
    pub entries: Vec<FileEntry>,
    pub current_path: String,
    /// Empty at the root.
    pub parent_path: String,
}

#[derive(Deserialize)]
struct RawListing {
    #[serde(default)]
    entries: Vec<FileEntry>,
    #[serde(default)]
    current_path: String,
    #[serde(default)]
    parent_path: String,
}

impl Listing {
    /// Read the `data` object of a listing or upload response.
    ///
    /// # Errors
    ///
    /// Returns a description when `data` is missing or not a listing.
    pub fn from_response(body: &Value) -> Result<Self, String> {
        let data = body
            .get("data")
            .ok_or_else(|| "missing field 'data'".to_string())?;
        let raw: RawListing = serde_json::from_value(data.clone()).map_err(|e| e.to_string())?;
        Ok(Self {
            entries: raw.entries,
            current_path: raw.current_path,
            parent_path: raw.parent_path,
        })
    }
}

/// `/file_info` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileInfo {
    pub exists: bool,
    pub is_dir: bool,
    pub abs_path: String,
    pub file_name: String,
}

/// A file the backend refused during upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUpload {
    pub name: String,
    pub error: String,
}

/// Read the `failed` list, which holds either names or `{name, error}`.
#[must_use]
pub fn parse_failed_uploads(body: &Value) -> Vec<FailedUpload> {
    body.get("failed")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|f| match f {
                    Value::String(name) => Some(FailedUpload {
                        name: name.clone(),
                        error: String::new(),
                    }),
                    Value::Object(obj) => Some(FailedUpload {
                        name: obj.get("name")?.as_str()?.to_string(),
                        error: obj
                            .get("error")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    }),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

// ── Sorting ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Date,
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            "date" => Ok(Self::Date),
            other => anyhow::bail!("unknown sort key '{other}': expected name, size or date"),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Size => "size",
            Self::Date => "date",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sorting state; selecting the current key again flips the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = match self.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
        } else {
            self.key = key;
            self.direction = SortDirection::Asc;
        }
    }
}

fn modified_at(entry: &FileEntry) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&entry.modified)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(&entry.modified, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|n| n.and_utc())
        })
}

/// Folders first, then by the chosen key. Folder grouping ignores direction.
#[must_use]
pub fn sort_entries(entries: &[FileEntry], order: SortOrder) -> Vec<FileEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        if a.is_dir != b.is_dir {
            return if a.is_dir {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        let by_key = match order.key {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Size => a.size.cmp(&b.size),
            SortKey::Date => modified_at(a).cmp(&modified_at(b)),
        };
        match order.direction {
            SortDirection::Asc => by_key,
            SortDirection::Desc => by_key.reverse(),
        }
    });
    sorted
}

// ── Upload rules ──────────────────────────────────────────────────────────────

#[must_use]
pub fn is_archive(file_name: &str) -> bool {
    file_name
        .rsplit('.')
        .next()
        .is_some_and(|ext| ARCHIVE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Archives may be any size; other files are capped at [`MAX_UPLOAD_BYTES`].
///
/// # Errors
///
/// Returns [`FileError::TooLarge`] for an oversized non-archive file.
pub fn check_upload_size(file_name: &str, size: u64) -> Result<(), FileError> {
    if !is_archive(file_name) && size > MAX_UPLOAD_BYTES {
        return Err(FileError::TooLarge {
            name: file_name.to_string(),
        });
    }
    Ok(())
}

/// Human-readable size with two decimals, trailing zeros trimmed.
#[must_use]
pub fn format_file_size(size: u64) -> String {
    const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB", "TB"];
    if size == 0 {
        return "0 Bytes".to_string();
    }
    #[allow(clippy::cast_precision_loss)] // display only
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

// ── Navigation ────────────────────────────────────────────────────────────────

/// Where the browser is and how it got there.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BrowserState {
    pub current_path: String,
    pub parent_path: String,
    pub history: Vec<String>,
    pub sort: SortOrder,
}

impl BrowserState {
    /// Path to open first: the explicit one, else where we are, else the
    /// work directory.
    #[must_use]
    pub fn initial_path(&self, requested: Option<&str>) -> String {
        match requested {
            Some(p) if !p.is_empty() => p.to_string(),
            _ if !self.current_path.is_empty() => self.current_path.clone(),
            _ => DEFAULT_WORK_DIR.to_string(),
        }
    }

    /// Record a move to `path` in history unless it is where we already are.
    pub fn push_history(&mut self, path: &str) {
        if self.current_path != path {
            self.history.push(self.current_path.clone());
        }
    }

    /// Parent to move to, or `None` at the root. Records history.
    pub fn up_target(&mut self) -> Option<String> {
        if self.parent_path.is_empty() {
            return None;
        }
        self.history.push(self.current_path.clone());
        Some(self.parent_path.clone())
    }

    pub fn adopt(&mut self, listing: &Listing) {
        self.current_path.clone_from(&listing.current_path);
        self.parent_path.clone_from(&listing.parent_path);
    }
}
