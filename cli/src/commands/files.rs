//! `a0 files`: browse, upload and download work-directory files.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::ports::LocalFiles;
use crate::application::services::files::{FileBrowser, OpenOutcome};
use crate::domain::files::{Listing, SortDirection, SortKey, SortOrder, sort_entries};
use crate::infra::fs::LocalFs;

/// Sorting flags shared by listing commands.
#[derive(Args, Clone, Copy)]
pub struct SortArgs {
    /// Sort by name, size or date
    #[arg(long, default_value = "name")]
    pub sort: SortKey,
    /// Reverse the order
    #[arg(long)]
    pub desc: bool,
}

impl SortArgs {
    fn order(self) -> SortOrder {
        SortOrder {
            key: self.sort,
            direction: if self.desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        }
    }
}

/// Files subcommands.
#[derive(Subcommand)]
pub enum FilesCommand {
    /// List a directory (default: the work directory)
    Ls {
        path: Option<String>,
        /// List the parent of PATH instead
        #[arg(long)]
        up: bool,
        #[command(flatten)]
        sort: SortArgs,
    },
    /// Upload local files
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Target directory (default: the work directory)
        #[arg(long)]
        to: Option<String>,
    },
    /// Delete a file or directory
    Rm { path: String },
    /// Download a file
    Get {
        path: String,
        /// Where to save it (default: its own name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List a directory or download a file, whichever PATH is
    Open {
        path: String,
        /// Where to save a downloaded file
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        sort: SortArgs,
    },
}

/// Run a files subcommand.
///
/// # Errors
///
/// Returns an error if the backend request or a local file operation fails.
pub async fn run(app: &AppContext, cmd: FilesCommand) -> Result<ExitCode> {
    let backend = app.backend()?;
    let mut browser = FileBrowser::new(&backend);
    match cmd {
        FilesCommand::Ls { path, up, sort } => {
            let mut listing = browser.open(path.as_deref()).await?;
            if up {
                match browser.navigate_up().await? {
                    Some(parent) => listing = parent,
                    None => app.output.info("Already at the top directory."),
                }
            }
            let order = sort.order();
            let sorted = sorted(&listing, order);
            app.emit(&sorted, |h| h.render_listing(&listing, order))?;
        }
        FilesCommand::Upload { files, to } => {
            let reporter = app.reporter();
            let report = browser.upload(&LocalFs, &reporter, &files, to.as_deref()).await?;
            app.emit(&report, |h| h.render_upload(&report))?;
            if !report.failed.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
        FilesCommand::Rm { path } => {
            if !app.confirm(&format!("Delete {path}?"), true)? {
                app.output.info("Cancelled.");
                return Ok(ExitCode::SUCCESS);
            }
            browser.delete(&path).await?;
            app.emit(&serde_json::json!({ "deleted": path }), |_| {
                app.output.success(&format!("Deleted {path}"));
            })?;
        }
        FilesCommand::Get { path, output } => {
            let bytes = browser.download(&path).await?;
            let dest = output.unwrap_or_else(|| default_destination(&path));
            LocalFs.write(&dest, &bytes).await?;
            let outcome = OpenOutcome::Downloaded {
                path: dest,
                bytes: bytes.len(),
            };
            app.emit(&outcome, |h| h.render_open(&outcome, SortOrder::default()))?;
        }
        FilesCommand::Open { path, output, sort } => {
            let outcome = browser.open_link(&LocalFs, &path, output.as_deref()).await?;
            app.emit(&outcome, |h| h.render_open(&outcome, sort.order()))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn sorted(listing: &Listing, order: SortOrder) -> Listing {
    Listing {
        entries: sort_entries(&listing.entries, order),
        ..listing.clone()
    }
}

/// Last path segment of a remote path, used as the local file name.
fn default_destination(remote: &str) -> PathBuf {
    let name = remote
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("download");
    PathBuf::from(name)
}
