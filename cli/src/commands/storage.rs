//! `a0 storage`: volume overview and backup/restore of persistent content.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::services::storage::{run_sync, storage_overview};
use crate::domain::storage::{SyncDirection, SyncRequest, SyncSelection};
use crate::output::progress::with_spinner;

/// Storage subcommands.
#[derive(Subcommand)]
pub enum StorageCommand {
    /// Show containers, mounts and volumes seen by the backend
    Overview,
    /// Back up or restore prompts and knowledge
    Sync {
        /// backup or restore
        direction: SyncDirection,
        /// Host folder mounted into the container
        #[arg(long)]
        target: String,
        /// Leave prompts out
        #[arg(long)]
        no_prompts: bool,
        /// Leave knowledge out
        #[arg(long)]
        no_knowledge: bool,
        /// Remove destination files that are not in the source
        #[arg(long)]
        clean: bool,
    },
}

/// Run a storage subcommand.
///
/// # Errors
///
/// Returns an error if the request is invalid, the backend is unreachable,
/// or the sync fails.
pub async fn run(app: &AppContext, cmd: StorageCommand) -> Result<ExitCode> {
    let backend = app.backend()?;
    match cmd {
        StorageCommand::Overview => {
            let overview = storage_overview(&backend).await?;
            app.emit(&overview, |h| h.render_storage(&overview))?;
        }
        StorageCommand::Sync {
            direction,
            target,
            no_prompts,
            no_knowledge,
            clean,
        } => {
            let selection = SyncSelection {
                prompts: !no_prompts,
                knowledge: !no_knowledge,
            };
            let request = SyncRequest::new(direction, &target, selection, clean)?;
            if clean
                && !app.confirm(
                    &format!("Files in the {direction} destination that are not in the source will be deleted. Continue?"),
                    true,
                )?
            {
                app.output.info("Cancelled.");
                return Ok(ExitCode::SUCCESS);
            }
            let message = match direction {
                SyncDirection::Backup => "Backing up...",
                SyncDirection::Restore => "Restoring...",
            };
            let result = with_spinner(&app.output, message, run_sync(&backend, &request)).await?;
            app.emit(&result, |h| h.render_sync(&result, direction.verb()))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
