//! Welcome banners: local security checks plus merging with backend banners.

use serde::Serialize;
use serde_json::Value;

pub const WELCOME_BANNERS_ENDPOINT: &str = "/welcome_banners";

pub const PRIORITY_HIGH: i64 = 100;
pub const PRIORITY_MEDIUM: i64 = 50;

const LOCAL_PROVIDERS: &[&str] = &["ollama", "lm_studio", "lmstudio"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BannerType {
    #[default]
    Info,
    Warning,
    Error,
}

impl BannerType {
    /// Unknown type names render as info.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "warning" => Self::Warning,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }
}

/// Where a banner came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerSource {
    Frontend,
    Backend,
}

impl BannerSource {
    fn as_str(self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
        }
    }
}

/// A banner as produced by a check, before merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: BannerType,
    pub priority: i64,
    pub html: String,
}

/// A merged banner ready to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    /// Stable display key: the id, or `<source>-<index>`.
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: BannerType,
    pub priority: i64,
    pub html: String,
    pub source: BannerSource,
}

/// Facts about how the client reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerContext {
    pub url: String,
    pub hostname: String,
    pub protocol: String,
    pub time: String,
    pub selected_provider: Option<String>,
}

impl BannerContext {
    /// Build the context for `url`, taking the provider from a
    /// `/settings_get` snapshot.
    #[must_use]
    pub fn new(url: &str, settings: &Value, time: String) -> Self {
        let (protocol, hostname) = split_url(url);
        Self {
            url: url.to_string(),
            hostname,
            protocol,
            time,
            selected_provider: settings
                .get("chat_model_provider")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// `(scheme, host)` of a URL, without brackets around IPv6 hosts.
fn split_url(url: &str) -> (String, String) {
    let (scheme, rest) = url.split_once("://").unwrap_or(("", url));
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let authority = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = if let Some(v6) = authority.strip_prefix('[') {
        v6.split(']').next().unwrap_or_default()
    } else {
        authority.split(':').next().unwrap_or_default()
    };
    (scheme.to_lowercase(), host.to_lowercase())
}

#[must_use]
pub fn is_loopback_host(hostname: &str) -> bool {
    let host = hostname.to_lowercase();
    if host.is_empty() {
        return false;
    }
    if matches!(host.as_str(), "localhost" | "::1" | "0.0.0.0") || host.ends_with(".localhost") {
        return true;
    }
    let octets: Vec<&str> = host.split('.').collect();
    octets.len() == 4
        && octets[0] == "127"
        && octets[1..]
            .iter()
            .all(|o| (1..=3).contains(&o.len()) && o.bytes().all(|b| b.is_ascii_digit()))
}

fn is_local_provider(provider: &str) -> bool {
    let normalized = provider
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    LOCAL_PROVIDERS.contains(&normalized.as_str())
}

fn non_empty(settings: &Value, key: &str) -> bool {
    settings
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}

/// Run the local security and setup checks against a settings object.
#[must_use]
pub fn frontend_checks(context: &BannerContext, settings: &Value) -> Vec<BannerDraft> {
    let is_local = is_loopback_host(&context.hostname);
    let has_credentials = non_empty(settings, "auth_login") && non_empty(settings, "auth_password");
    let mut banners = Vec::new();

    if !is_local && !has_credentials {
        banners.push(BannerDraft {
            id: Some("welcome-unsecured-connection".into()),
            title: "Unsecured connection".into(),
            kind: BannerType::Warning,
            priority: PRIORITY_HIGH,
            html: "<p>This instance is reachable from a non-local address without authentication. \
                   Add credentials to protect access from the internet.</p>"
                .into(),
        });
    }

    if has_credentials && !is_local && context.protocol != "https" {
        banners.push(BannerDraft {
            id: Some("welcome-credentials-plaintext".into()),
            title: "Credentials may be sent unencrypted".into(),
            kind: BannerType::Warning,
            priority: PRIORITY_MEDIUM,
            html: "<p>Authentication is enabled but this connection is not using HTTPS. \
                   Credentials could be intercepted on the network.</p>"
                .into(),
        });
    }

    let provider = settings
        .get("chat_model_provider")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty() && !is_local_provider(p));
    let missing_key = provider.is_some_and(|p| {
        !settings
            .get("api_keys")
            .and_then(|keys| keys.get(p))
            .and_then(Value::as_str)
            .is_some_and(|k| !k.is_empty())
    });
    if missing_key {
        banners.push(BannerDraft {
            id: Some("welcome-missing-api-key".into()),
            title: "Missing API key".into(),
            kind: BannerType::Error,
            priority: PRIORITY_HIGH,
            html: "<p>The selected provider does not have an API key configured. \
                   Agent Zero will not be able to run until one is added.</p>"
                .into(),
        });
    }

    banners
}

fn normalize(value: &Value) -> Option<BannerDraft> {
    let obj = value.as_object()?;
    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    let html = obj.get("html").and_then(Value::as_str).unwrap_or_default();
    if title.is_empty() || html.is_empty() {
        return None;
    }
    Some(BannerDraft {
        id: obj
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        title: title.to_string(),
        kind: obj
            .get("type")
            .and_then(Value::as_str)
            .map(BannerType::from_name)
            .unwrap_or_default(),
        priority: obj.get("priority").and_then(Value::as_i64).unwrap_or(0),
        html: html.to_string(),
    })
}

/// Merge local and backend banners. Entries without title or html are
/// dropped and the first banner with a given id wins, local ones first.
#[must_use]
pub fn merge_banners(frontend: &[BannerDraft], backend: &[Value]) -> Vec<Banner> {
    let local = frontend.iter().map(|d| {
        (
            Some(d.clone()).filter(|d| !d.title.trim().is_empty() && !d.html.is_empty()),
            BannerSource::Frontend,
        )
    });
    let remote = backend.iter().map(|v| (normalize(v), BannerSource::Backend));

    let mut seen = std::collections::HashSet::new();
    let mut merged: Vec<(BannerDraft, BannerSource)> = Vec::new();
    for (draft, source) in local.chain(remote) {
        let Some(draft) = draft else { continue };
        if draft.id.as_ref().is_some_and(|id| !seen.insert(id.clone())) {
            continue;
        }
        merged.push((draft, source));
    }

    merged
        .into_iter()
        .enumerate()
        .map(|(index, (d, source))| Banner {
            key: d
                .id
                .clone()
                .unwrap_or_else(|| format!("{}-{index}", source.as_str())),
            id: d.id,
            title: d.title.trim().to_string(),
            kind: d.kind,
            priority: d.priority,
            html: d.html,
            source,
        })
        .collect()
}

/// Highest priority first; equal priorities keep their merge order.
#[must_use]
pub fn sort_banners(mut banners: Vec<Banner>) -> Vec<Banner> {
    banners.sort_by(|a, b| b.priority.cmp(&a.priority));
    banners
}
