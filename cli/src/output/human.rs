//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;
use serde_json::Value;

use crate::application::services::chat::SendReceipt;
use crate::application::services::engine_session::{
    RemoveResult, RuntimeList, StartResult, StatusReport, StopResult,
};
use crate::application::services::files::{OpenOutcome, UploadReport};
use crate::domain::banners::{Banner, BannerType};
use crate::domain::chat::{ContextSummary, LogEntry, Notification};
use crate::domain::config::A0Config;
use crate::domain::engine::{ContainerInfo, ContainerStatus, ImageInfo, ImageStatus, VolumeInfo};
use crate::domain::error::CODE_ENGINE_UNAVAILABLE;
use crate::domain::files::{Listing, SortOrder, format_file_size, sort_entries};
use crate::domain::response::ErrorPayload;
use crate::domain::storage::{StorageOverview, SyncResult};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

/// Drop markup from banner html, keeping the text.
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.info(&format!("a0 v{version}"));
    }

    /// Render a failed command. Engine-unavailable errors get setup hints.
    pub fn render_error(&self, err: &anyhow::Error) {
        let payload = ErrorPayload::from_error(err);
        self.ctx.error(&payload.message);
        if payload.code == CODE_ENGINE_UNAVAILABLE {
            if let Some(details) = &payload.details {
                eprintln!("    {}", details.style(self.ctx.styles.dim));
            }
            eprintln!();
            eprintln!("  A container engine is required to run Agent Zero:");
            eprintln!("    Docker:  https://docs.docker.com/get-docker/");
            eprintln!("    Podman:  https://podman.io/docs/installation");
            eprintln!("  Make sure it is running, then: a0 engine status");
        } else if let Some(details) = &payload.details {
            for line in details.lines() {
                eprintln!("    {}", line.style(self.ctx.styles.dim));
            }
        }
    }

    /// Render the current a0 configuration.
    pub fn render_config(&self, config: &A0Config, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        let rows = [
            ("engine.runtime:", config.engine.runtime.to_string()),
            ("engine.image:", config.engine.image.clone()),
            ("engine.container_name:", config.engine.container_name.clone()),
            ("engine.port:", config.engine.port.to_string()),
            (
                "engine.command_timeout_secs:",
                config.engine.command_timeout_secs.to_string(),
            ),
            (
                "engine.pull_timeout_secs:",
                config.engine.pull_timeout_secs.to_string(),
            ),
            ("backend.url:", config.backend.url.clone()),
            ("backend.timeout_secs:", config.backend.timeout_secs.to_string()),
            ("poll.short_interval_ms:", config.poll.short_interval_ms.to_string()),
            ("poll.long_interval_ms:", config.poll.long_interval_ms.to_string()),
            (
                "poll.short_interval_budget:",
                config.poll.short_interval_budget.to_string(),
            ),
            ("chat.active_tab:", config.chat.active_tab.to_string()),
        ];
        for (key, value) in rows {
            println!("  {key:<30} {value}");
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["A0_CONFIG", "A0_BACKEND_URL", "NO_COLOR"] {
            println!(
                "    {:<18} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }

    // ── Engine ────────────────────────────────────────────────────────────────

    pub fn render_status(&self, report: &StatusReport) {
        let status = &report.status;
        self.ctx.kv("Runtime:  ", report.runtime.product());
        let image = match status.image {
            ImageStatus::Pulled => format!("{} (pulled)", report.image),
            ImageStatus::NotFound => format!("{} (not found)", report.image),
        };
        self.ctx.kv("Image:    ", &image);
        let container = match status.container {
            ContainerStatus::Running => "running",
            ContainerStatus::Stopped => "stopped",
            ContainerStatus::NotCreated => "not created",
        };
        let detail = status
            .container_detail
            .as_deref()
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        self.ctx.kv(
            "Container:",
            &format!("{} {container}{detail}", report.container_name),
        );
        if status.container == ContainerStatus::Running {
            self.ctx
                .kv("Web UI:   ", &format!("http://localhost:{}", report.port));
        }

        if self.ctx.quiet {
            return;
        }
        println!();
        let next = if status.can_start && status.container != ContainerStatus::Running {
            Some("a0 engine start")
        } else if status.image == ImageStatus::NotFound {
            Some("a0 engine pull")
        } else {
            None
        };
        if let Some(cmd) = next {
            self.ctx.info(&format!("Next: {cmd}"));
        }
    }

    pub fn render_start(&self, result: &StartResult) {
        let id = result
            .container_id
            .as_deref()
            .map(|id| format!(" ({})", id.chars().take(12).collect::<String>()))
            .unwrap_or_default();
        if result.started_existing {
            self.ctx.success(&format!("Started existing container{id}"));
        } else {
            self.ctx.success(&format!("Created and started container{id}"));
        }
    }

    pub fn render_stop(&self, result: StopResult) {
        if result.stopped {
            self.ctx.success("Container stopped");
        } else {
            self.ctx.info("No container to stop");
        }
    }

    pub fn render_remove(&self, result: RemoveResult) {
        if result.removed_container {
            self.ctx.success("Container removed");
        } else {
            self.ctx.info("No container to remove");
        }
        if result.removed_image {
            self.ctx.success("Image removed");
        } else {
            self.ctx.info("No image to remove");
        }
    }

    fn render_list_error<T>(&self, list: &RuntimeList<T>) -> bool {
        match &list.error {
            Some(error) => {
                self.ctx.error(error);
                true
            }
            None => false,
        }
    }

    pub fn render_images(&self, list: &RuntimeList<ImageInfo>) {
        if self.render_list_error(list) {
            return;
        }
        if list.items.is_empty() {
            self.ctx.info("No images");
            return;
        }
        println!(
            "  {:<14} {:<36} {:<14} {:<10} {}",
            "ID", "REPOSITORY", "TAG", "SIZE", "CREATED"
        );
        for img in &list.items {
            println!(
                "  {:<14} {:<36} {:<14} {:<10} {}",
                img.id.chars().take(12).collect::<String>(),
                img.repository,
                img.tag,
                img.size.as_deref().unwrap_or("-"),
                img.created_at.as_deref().unwrap_or("-"),
            );
        }
    }

    pub fn render_containers(&self, list: &RuntimeList<ContainerInfo>) {
        if self.render_list_error(list) {
            return;
        }
        if list.items.is_empty() {
            self.ctx.info("No containers");
            return;
        }
        println!(
            "  {:<14} {:<20} {:<36} {}",
            "ID", "NAME", "IMAGE", "STATUS"
        );
        for c in &list.items {
            println!(
                "  {:<14} {:<20} {:<36} {}",
                c.id.chars().take(12).collect::<String>(),
                c.name,
                c.image,
                c.status.as_deref().or(c.state.as_deref()).unwrap_or("-"),
            );
        }
    }

    pub fn render_volumes(&self, list: &RuntimeList<VolumeInfo>) {
        if self.render_list_error(list) {
            return;
        }
        if list.items.is_empty() {
            self.ctx.info("No volumes");
            return;
        }
        println!("  {:<40} {:<10} {}", "NAME", "DRIVER", "MOUNTPOINT");
        for v in &list.items {
            println!(
                "  {:<40} {:<10} {}",
                v.name,
                v.driver.as_deref().unwrap_or("-"),
                v.mountpoint.as_deref().unwrap_or("-"),
            );
        }
    }

    // ── Chat ──────────────────────────────────────────────────────────────────

    pub fn render_sent(&self, receipt: &SendReceipt) {
        self.ctx
            .success(&format!("Message sent to context {}", receipt.context));
    }

    /// Print a log entry header and its content.
    pub fn render_log_entry(&self, entry: &LogEntry) {
        let style = self.ctx.styles.for_entry_kind(&entry.kind);
        let heading = if entry.heading.is_empty() {
            entry.kind.clone()
        } else {
            strip_tags(&entry.heading)
        };
        println!("{}", format!("[{}] {heading}", entry.kind).style(style));
        if !entry.content.is_empty() {
            println!("{}", entry.content);
        }
    }

    /// Print the tail of an entry that grew since it was last shown.
    pub fn render_log_append(&self, text: &str) {
        print!("{text}");
        if !text.ends_with('\n') {
            println!();
        }
    }

    pub fn render_notification(&self, n: &Notification) {
        let title = if n.title.is_empty() { &n.kind } else { &n.title };
        let line = format!("{title}: {}", n.message);
        match n.kind.as_str() {
            "error" => self.ctx.error(&line),
            "warning" => self.ctx.warn(&line),
            "success" => self.ctx.success(&line),
            _ => self.ctx.info(&line),
        }
    }

    pub fn render_connection(&self, connected: bool) {
        if connected {
            self.ctx.success("Connected to backend");
        } else {
            self.ctx.warn("Backend unreachable, retrying...");
        }
    }

    pub fn render_contexts(
        &self,
        contexts: &[ContextSummary],
        tasks: &[ContextSummary],
        active: Option<&str>,
    ) {
        for (title, list) in [("Chats:", contexts), ("Tasks:", tasks)] {
            self.ctx.header(title);
            if list.is_empty() {
                println!("    (none)");
            }
            for c in list {
                let name = c.name.as_deref().unwrap_or("");
                let state = c.state.as_deref().map(|s| format!(" [{s}]")).unwrap_or_default();
                if active == Some(c.id.as_str()) {
                    let id = format!("{:<10}", c.id);
                    println!("  * {} {name}{state}", id.style(self.ctx.styles.active));
                } else {
                    println!("    {:<10} {name}{state}", c.id);
                }
            }
            println!();
        }
    }

    // ── Files ─────────────────────────────────────────────────────────────────

    pub fn render_listing(&self, listing: &Listing, order: SortOrder) {
        self.ctx.header(&listing.current_path);
        if listing.entries.is_empty() {
            println!("    (empty)");
            return;
        }
        for entry in sort_entries(&listing.entries, order) {
            let name = if entry.is_dir {
                format!("{}/", entry.name).style(self.ctx.styles.bold).to_string()
            } else {
                entry.name.clone()
            };
            let size = if entry.is_dir {
                String::new()
            } else {
                format_file_size(entry.size)
            };
            println!("  {:>12}  {:<20}  {name}", size, entry.modified);
        }
    }

    pub fn render_upload(&self, report: &UploadReport) {
        for name in &report.uploaded {
            self.ctx.success(&format!("Uploaded {name}"));
        }
        for failed in &report.failed {
            self.ctx.error(&format!("{}: {}", failed.name, failed.error));
        }
        if report.uploaded.is_empty() && report.failed.is_empty() {
            self.ctx.warn("Nothing was uploaded");
        }
    }

    pub fn render_open(&self, outcome: &OpenOutcome, order: SortOrder) {
        match outcome {
            OpenOutcome::Listed { listing } => self.render_listing(listing, order),
            OpenOutcome::Downloaded { path, bytes } => self.render_download(path, *bytes),
        }
    }

    pub fn render_download(&self, path: &Path, bytes: usize) {
        self.ctx.success(&format!(
            "Saved {} ({})",
            path.display(),
            format_file_size(bytes as u64)
        ));
    }

    // ── Settings, banners, storage ────────────────────────────────────────────

    pub fn render_settings(&self, settings: &Value) {
        match serde_json::to_string_pretty(settings) {
            Ok(text) => println!("{text}"),
            Err(_) => println!("{settings}"),
        }
    }

    pub fn render_banners(&self, banners: &[Banner]) {
        if banners.is_empty() {
            self.ctx.success("Nothing needs your attention");
            return;
        }
        for banner in banners {
            let style = match banner.kind {
                BannerType::Error => self.ctx.styles.error,
                BannerType::Warning => self.ctx.styles.warning,
                BannerType::Info => self.ctx.styles.info,
            };
            println!("  {}", banner.title.style(style));
            println!("    {}", strip_tags(&banner.html));
            println!();
        }
    }

    pub fn render_storage(&self, overview: &StorageOverview) {
        self.ctx.header("Containers:");
        if overview.containers.is_empty() {
            println!("    (none)");
        }
        for container in &overview.containers {
            println!("    {}", container.name.style(self.ctx.styles.bold));
            for mount in &container.mounts {
                let source = mount.name.as_deref().unwrap_or(&mount.source);
                println!("      {:<7} {source} -> {}", mount.kind, mount.destination);
            }
        }
        println!();
        self.ctx.header("Volumes:");
        if overview.volumes.is_empty() {
            println!("    (none)");
        }
        for volume in &overview.volumes {
            println!("    {:<32} {:<8} {}", volume.name, volume.driver, volume.mountpoint);
        }
        let paths = overview.detected_host_paths();
        if !paths.is_empty() {
            println!();
            self.ctx.header("Host paths:");
            for path in paths {
                println!("    {path}");
            }
        }
    }

    pub fn render_sync(&self, result: &SyncResult, verb: &str) {
        for line in &result.log {
            println!("    {}", line.style(self.ctx.styles.dim));
        }
        let target = result.target_path.as_deref().unwrap_or("the target folder");
        self.ctx.success(&format!("{verb} persistent content to {target}"));
    }
}
