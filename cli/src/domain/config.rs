//! Domain types and validators for a0 configuration.
//!
//! Pure functions only. No I/O and no async.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::engine::{DEFAULT_CONTAINER_NAME, DEFAULT_IMAGE, DEFAULT_PORT, RuntimeChoice};
use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "engine.runtime",
    "engine.image",
    "engine.container_name",
    "engine.port",
    "engine.command_timeout_secs",
    "engine.pull_timeout_secs",
    "backend.url",
    "backend.timeout_secs",
    "poll.short_interval_ms",
    "poll.long_interval_ms",
    "poll.short_interval_budget",
    "chat.active_tab",
];
pub const VALID_RUNTIMES: &[&str] = &["auto", "docker", "podman"];
pub const VALID_TABS: &[&str] = &["chats", "tasks"];

const NUMERIC_KEYS: &[&str] = &[
    "engine.port",
    "engine.command_timeout_secs",
    "engine.pull_timeout_secs",
    "backend.timeout_secs",
    "poll.short_interval_ms",
    "poll.long_interval_ms",
    "poll.short_interval_budget",
];

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.a0/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct A0Config {
    pub engine: EngineConfig,
    pub backend: BackendConfig,
    pub poll: PollConfig,
    pub chat: ChatConfig,
}

/// Container engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// `auto` (detect docker, then podman), `docker`, or `podman`.
    pub runtime: RuntimeChoice,
    /// Image reference pulled and run, e.g. `agent0ai/agent-zero:latest`.
    pub image: String,
    /// Name of the single managed container.
    pub container_name: String,
    /// Host port published to the container's port 80.
    pub port: u16,
    pub command_timeout_secs: u64,
    pub pull_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeChoice::Auto,
            image: DEFAULT_IMAGE.to_string(),
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            port: DEFAULT_PORT,
            command_timeout_secs: 30,
            pull_timeout_secs: 1800,
        }
    }
}

/// Agent backend HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: format!("http://localhost:{DEFAULT_PORT}"),
            timeout_secs: 30,
        }
    }
}

/// Poll loop cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollConfig {
    pub short_interval_ms: u64,
    pub long_interval_ms: u64,
    /// Number of short-interval cycles granted after new log data arrives.
    pub short_interval_budget: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            short_interval_ms: 25,
            long_interval_ms: 250,
            short_interval_budget: 100,
        }
    }
}

/// Which context list drives automatic selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActiveTab {
    #[default]
    Chats,
    Tasks,
}

impl std::fmt::Display for ActiveTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chats => f.write_str("chats"),
            Self::Tasks => f.write_str("tasks"),
        }
    }
}

/// Chat client settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub active_tab: ActiveTab,
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |valid: &str| -> anyhow::Error {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            valid: valid.to_string(),
        }
        .into()
    };

    match key {
        "engine.runtime" if !VALID_RUNTIMES.contains(&value) => {
            Err(invalid(&VALID_RUNTIMES.join(", ")))
        }
        "chat.active_tab" if !VALID_TABS.contains(&value) => Err(invalid(&VALID_TABS.join(", "))),
        "engine.port" if value.parse::<u16>().map_or(true, |p| p == 0) => {
            Err(invalid("a port number between 1 and 65535"))
        }
        k if NUMERIC_KEYS.contains(&k) && k != "engine.port" && value.parse::<u64>().is_err() => {
            Err(invalid("a non-negative integer"))
        }
        "backend.url" if !(value.starts_with("http://") || value.starts_with("https://")) => {
            Err(invalid("an http:// or https:// URL"))
        }
        "engine.image" | "engine.container_name" if value.trim().is_empty() => {
            Err(invalid("a non-empty string"))
        }
        _ => Ok(()),
    }
}

/// Apply an already-validated `key = value` to the config.
///
/// # Errors
///
/// Returns an error if the key is unknown or the value does not parse.
pub fn apply_config_value(config: &mut A0Config, key: &str, value: &str) -> Result<()> {
    validate_config_key(key)?;
    validate_config_value(key, value)?;

    match key {
        "engine.runtime" => config.engine.runtime = value.parse()?,
        "engine.image" => config.engine.image = value.to_string(),
        "engine.container_name" => config.engine.container_name = value.to_string(),
        "engine.port" => config.engine.port = value.parse()?,
        "engine.command_timeout_secs" => config.engine.command_timeout_secs = value.parse()?,
        "engine.pull_timeout_secs" => config.engine.pull_timeout_secs = value.parse()?,
        "backend.url" => config.backend.url = value.trim_end_matches('/').to_string(),
        "backend.timeout_secs" => config.backend.timeout_secs = value.parse()?,
        "poll.short_interval_ms" => config.poll.short_interval_ms = value.parse()?,
        "poll.long_interval_ms" => config.poll.long_interval_ms = value.parse()?,
        "poll.short_interval_budget" => config.poll.short_interval_budget = value.parse()?,
        "chat.active_tab" => {
            config.chat.active_tab = if value == "tasks" {
                ActiveTab::Tasks
            } else {
                ActiveTab::Chats
            };
        }
        _ => anyhow::bail!("Unknown setting: {key}"),
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
