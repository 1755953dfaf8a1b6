//! Container engine domain: argument vectors, CLI output parsing, and
//! status interpretation.
//!
//! Pure functions only. Nothing here spawns a process; the application layer
//! feeds captured stdout/stderr in and gets typed values out.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Image pulled and run when nothing else is configured.
pub const DEFAULT_IMAGE: &str = "agent0ai/agent-zero:latest";
/// Name given to the single managed container.
pub const DEFAULT_CONTAINER_NAME: &str = "agent-zero";
/// Host port published to the container's port 80.
pub const DEFAULT_PORT: u16 = 50001;

/// Runtimes tried, in order, when `engine.runtime` is `auto`.
pub const RUNTIME_CANDIDATES: &[EngineKind] = &[EngineKind::Docker, EngineKind::Podman];

/// Go template that makes the engine print one JSON object per line.
const JSON_FORMAT: &str = "{{json .}}";

// ── Engine identity ───────────────────────────────────────────────────────────

/// A container engine CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Docker,
    Podman,
}

impl EngineKind {
    /// Executable name looked up on `PATH`.
    #[must_use]
    pub fn program(self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Podman => "podman",
        }
    }

    /// Product name used in user-facing messages.
    #[must_use]
    pub fn product(self) -> &'static str {
        match self {
            Self::Docker => "Docker",
            Self::Podman => "Podman",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Configured runtime preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeChoice {
    #[default]
    Auto,
    Docker,
    Podman,
}

impl RuntimeChoice {
    /// The fixed engine for this choice, or `None` when it must be detected.
    #[must_use]
    pub fn fixed(self) -> Option<EngineKind> {
        match self {
            Self::Auto => None,
            Self::Docker => Some(EngineKind::Docker),
            Self::Podman => Some(EngineKind::Podman),
        }
    }
}

impl FromStr for RuntimeChoice {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "docker" => Ok(Self::Docker),
            "podman" => Ok(Self::Podman),
            other => anyhow::bail!("unknown runtime '{other}'"),
        }
    }
}

impl fmt::Display for RuntimeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Docker => f.write_str("docker"),
            Self::Podman => f.write_str("podman"),
        }
    }
}

// ── Resource defaults ─────────────────────────────────────────────────────────

/// The image/container/port triple every lifecycle operation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    pub image: String,
    pub container_name: String,
    pub port: u16,
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ResourceSpec {
    /// Image reference without its tag (`agent0ai/agent-zero`).
    #[must_use]
    pub fn repository(&self) -> &str {
        split_image_ref(&self.image).0
    }

    /// Image tag, `latest` when the reference has none.
    #[must_use]
    pub fn tag(&self) -> &str {
        split_image_ref(&self.image).1
    }
}

/// Split `repo[:tag]` without mistaking a registry port for a tag.
#[must_use]
pub fn split_image_ref(image: &str) -> (&str, &str) {
    match image.rfind(':') {
        Some(idx) if !image[idx + 1..].contains('/') => (&image[..idx], &image[idx + 1..]),
        _ => (image, "latest"),
    }
}

// ── Argument vectors ──────────────────────────────────────────────────────────

/// Every engine invocation this crate performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand<'a> {
    /// `info`: daemon reachability check.
    Info,
    /// `version`: presence check used for runtime detection.
    Version,
    Pull { image: &'a str },
    Run { name: &'a str, port: u16, image: &'a str },
    Start { name: &'a str },
    Stop { name: &'a str },
    RemoveContainer { name: &'a str },
    RemoveImage { image: &'a str },
    /// `ps -a -q` filtered to an exact container name.
    FindContainer { name: &'a str },
    /// `ps -a` JSON lines filtered by (substring) name.
    ListNamedContainers { name: &'a str },
    /// `images` JSON lines restricted to one repository.
    ListRepositoryImages { repository: &'a str },
    ListImages,
    ListContainers,
    ListVolumes,
}

impl EngineCommand<'_> {
    /// The argument vector passed to the engine binary.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let v = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
        match self {
            Self::Info => v(&["info"]),
            Self::Version => v(&["version"]),
            Self::Pull { image } => v(&["pull", image]),
            Self::Run { name, port, image } => {
                let publish = format!("{port}:80");
                v(&["run", "-d", "--name", name, "-p", &publish, image])
            }
            Self::Start { name } => v(&["start", name]),
            Self::Stop { name } => v(&["stop", name]),
            Self::RemoveContainer { name } => v(&["rm", "-f", name]),
            Self::RemoveImage { image } => v(&["rmi", image]),
            Self::FindContainer { name } => {
                let filter = format!("name=^/?{name}$");
                v(&["ps", "-a", "-q", "--filter", &filter])
            }
            Self::ListNamedContainers { name } => {
                let filter = format!("name={name}");
                v(&["ps", "-a", "--format", JSON_FORMAT, "--filter", &filter])
            }
            Self::ListRepositoryImages { repository } => {
                v(&["images", "--format", JSON_FORMAT, repository])
            }
            Self::ListImages => v(&["images", "--format", JSON_FORMAT]),
            Self::ListContainers => v(&["ps", "--all", "--format", JSON_FORMAT]),
            Self::ListVolumes => v(&["volume", "ls", "--format", JSON_FORMAT]),
        }
    }

    /// Whether this invocation may run far longer than the default timeout.
    #[must_use]
    pub fn is_long_running(&self) -> bool {
        matches!(self, Self::Pull { .. })
    }
}

// ── Runtime list records (permissive) ─────────────────────────────────────────

/// One row of `images --format {{json .}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub id: String,
    pub repository: String,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// One row of `ps --all --format {{json .}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// One row of `volume ls --format {{json .}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mountpoint: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawImage {
    #[serde(rename = "ID")]
    id: Option<String>,
    repository: Option<String>,
    tag: Option<String>,
    created_at: Option<String>,
    created_since: Option<String>,
    size: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawContainer {
    #[serde(rename = "ID")]
    id: Option<String>,
    names: Option<NameField>,
    image: Option<String>,
    state: Option<String>,
    status: Option<String>,
    created_at: Option<StringOrNumber>,
    running_for: Option<String>,
    ports: Option<PortsField>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawVolume {
    name: Option<String>,
    driver: Option<String>,
    mountpoint: Option<String>,
}

/// `Names` is a string for docker and an array for podman.
#[derive(Deserialize)]
#[serde(untagged)]
enum NameField {
    One(String),
    Many(Vec<String>),
}

impl NameField {
    fn joined(self) -> String {
        match self {
            Self::One(s) => s,
            Self::Many(v) => v.join(","),
        }
    }
}

/// `CreatedAt` is a string for docker and a unix timestamp for podman.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Num(i64),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            Self::Str(s) => s,
            Self::Num(n) => n.to_string(),
        }
    }
}

/// `Ports` is a string for docker and a list of mappings for podman.
#[derive(Deserialize)]
#[serde(untagged)]
enum PortsField {
    Str(String),
    Other(serde_json::Value),
}

impl PortsField {
    fn into_string(self) -> String {
        match self {
            Self::Str(s) => s,
            Self::Other(v) => v.to_string(),
        }
    }
}

/// Lines successfully parsed plus the number that were dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub items: Vec<T>,
    pub dropped: usize,
}

/// Parse newline-delimited JSON, dropping lines that fail to parse.
#[must_use]
pub fn parse_json_lines<T: serde::de::DeserializeOwned>(input: &str) -> Parsed<T> {
    let mut items = Vec::new();
    let mut dropped = 0;
    for line in input.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<T>(line) {
            Ok(item) => items.push(item),
            Err(_) => dropped += 1,
        }
    }
    Parsed { items, dropped }
}

#[must_use]
pub fn parse_images(stdout: &str) -> Parsed<ImageInfo> {
    let raw = parse_json_lines::<RawImage>(stdout);
    Parsed {
        items: raw
            .items
            .into_iter()
            .map(|r| ImageInfo {
                id: r.id.unwrap_or_else(|| "unknown".to_string()),
                repository: r.repository.unwrap_or_else(|| "<none>".to_string()),
                tag: r.tag.unwrap_or_else(|| "<none>".to_string()),
                created_at: r.created_at,
                size: r.size,
            })
            .collect(),
        dropped: raw.dropped,
    }
}

#[must_use]
pub fn parse_containers(stdout: &str) -> Parsed<ContainerInfo> {
    let raw = parse_json_lines::<RawContainer>(stdout);
    Parsed {
        items: raw
            .items
            .into_iter()
            .map(|r| ContainerInfo {
                id: r.id.unwrap_or_else(|| "unknown".to_string()),
                name: r.names.map_or_else(|| "<unnamed>".to_string(), NameField::joined),
                image: r.image.unwrap_or_else(|| "<unknown>".to_string()),
                state: r.state,
                status: r.status,
                created_at: r.created_at.map(StringOrNumber::into_string),
            })
            .collect(),
        dropped: raw.dropped,
    }
}

#[must_use]
pub fn parse_volumes(stdout: &str) -> Parsed<VolumeInfo> {
    let raw = parse_json_lines::<RawVolume>(stdout);
    Parsed {
        items: raw
            .items
            .into_iter()
            .map(|r| VolumeInfo {
                name: r.name.unwrap_or_else(|| "<unknown>".to_string()),
                driver: r.driver,
                mountpoint: r.mountpoint,
            })
            .collect(),
        dropped: raw.dropped,
    }
}

// ── Overview records (strict) ─────────────────────────────────────────────────

/// Managed container as reported by the status overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running_for: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<String>,
}

/// Managed image as reported by the status overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewImage {
    pub id: String,
    pub repository: String,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// Containers and images relevant to the managed resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub containers: Vec<OverviewContainer>,
    pub images: Vec<OverviewImage>,
}

/// Parse overview container lines, failing on the first malformed line.
///
/// # Errors
///
/// Returns the offending line's parse error.
pub fn parse_overview_containers(stdout: &str) -> Result<Vec<OverviewContainer>, String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            let r: RawContainer = serde_json::from_str(line).map_err(|e| e.to_string())?;
            Ok(OverviewContainer {
                id: r.id.unwrap_or_default(),
                name: r.names.map(NameField::joined).unwrap_or_default(),
                image: r.image.unwrap_or_default(),
                state: r.state.unwrap_or_default(),
                status: r.status.unwrap_or_default(),
                created_at: r.created_at.map(StringOrNumber::into_string),
                running_for: r.running_for,
                ports: r.ports.map(PortsField::into_string),
            })
        })
        .collect()
}

/// Parse overview image lines, failing on the first malformed line.
///
/// # Errors
///
/// Returns the offending line's parse error.
pub fn parse_overview_images(stdout: &str) -> Result<Vec<OverviewImage>, String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            let r: RawImage = serde_json::from_str(line).map_err(|e| e.to_string())?;
            Ok(OverviewImage {
                id: r.id.unwrap_or_default(),
                repository: r.repository.unwrap_or_default(),
                tag: r.tag.unwrap_or_default(),
                created_since: r.created_since,
                created_at: r.created_at,
                size: r.size,
            })
        })
        .collect()
}

// ── Error text classification ─────────────────────────────────────────────────

/// Why the engine cannot be used at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The binary is not on `PATH`.
    Missing,
    /// The binary exists but its daemon is down.
    DaemonDown,
    /// The user may not talk to the daemon.
    PermissionDenied,
}

impl UnavailableReason {
    /// Setup guidance shown to the user.
    #[must_use]
    pub fn message(self, engine: EngineKind) -> String {
        let product = engine.product();
        match self {
            Self::Missing => format!(
                "{product} CLI was not found. Install {product} and ensure the {engine} command is available in your PATH."
            ),
            Self::DaemonDown => format!(
                "{product} does not appear to be running. Please launch {product} and wait for it to finish starting before retrying."
            ),
            Self::PermissionDenied => format!(
                "{product} requires elevated permissions. Make sure your user has access to {product}."
            ),
        }
    }
}

/// Classify engine error text as "engine unavailable", or `None` when it is
/// an ordinary command failure.
#[must_use]
pub fn classify_error_text(text: &str) -> Option<UnavailableReason> {
    // Patterns are compile-time constants.
    #[allow(clippy::unwrap_used)]
    let daemon = Regex::new(
        r"(?i)daemon is not running|cannot connect to the (docker |podman )?daemon|is the docker daemon running",
    )
    .unwrap();
    #[allow(clippy::unwrap_used)]
    let permission = Regex::new(r"(?i)permission denied").unwrap();

    if daemon.is_match(text) {
        Some(UnavailableReason::DaemonDown)
    } else if permission.is_match(text) {
        Some(UnavailableReason::PermissionDenied)
    } else {
        None
    }
}

// ── Status interpretation ─────────────────────────────────────────────────────

/// Whether the managed image is present locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    Pulled,
    NotFound,
}

/// Lifecycle state of the managed container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    Running,
    Stopped,
    NotCreated,
}

/// Interpreted status plus the actions that make sense next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceStatus {
    pub image: ImageStatus,
    pub container: ContainerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_detail: Option<String>,
    pub can_start: bool,
    pub can_stop: bool,
    pub can_remove: bool,
}

/// Derive the user-facing status from an overview.
#[must_use]
pub fn interpret_overview(overview: &Overview, spec: &ResourceSpec) -> ResourceStatus {
    let image = overview
        .images
        .iter()
        .find(|img| img.repository == spec.repository() && img.tag == spec.tag());
    let container = overview.containers.iter().find(|c| {
        c.name == spec.container_name || c.image.starts_with(spec.repository())
    });

    let image_status = if image.is_some() {
        ImageStatus::Pulled
    } else {
        ImageStatus::NotFound
    };
    let image_detail = image.map(|img| match &img.size {
        Some(size) => format!("{}:{} • {size}", img.repository, img.tag),
        None => format!("{}:{}", img.repository, img.tag),
    });

    let (container_status, container_detail) = match container {
        Some(c) => {
            let running = c.state.eq_ignore_ascii_case("running");
            let info: Vec<&str> = [Some(c.status.as_str()), c.ports.as_deref()]
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty())
                .collect();
            (
                if running {
                    ContainerStatus::Running
                } else {
                    ContainerStatus::Stopped
                },
                Some(info.join(" • ")).filter(|s| !s.is_empty()),
            )
        }
        None => (ContainerStatus::NotCreated, None),
    };

    ResourceStatus {
        image: image_status,
        container: container_status,
        image_detail,
        container_detail,
        can_start: match container_status {
            ContainerStatus::Running => false,
            ContainerStatus::Stopped => true,
            ContainerStatus::NotCreated => image.is_some(),
        },
        can_stop: container_status == ContainerStatus::Running,
        can_remove: image.is_some() || container.is_some(),
    }
}
