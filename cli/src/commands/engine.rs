//! `a0 engine`: pull, run and inspect the Agent Zero container.

use std::process::ExitCode;
use std::rc::Rc;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::services::engine_session::StopResult;
use crate::application::services::runtime_lists::RuntimeLists;
use crate::output::progress::with_spinner;

/// Engine subcommands.
#[derive(Subcommand)]
pub enum EngineCommand {
    /// Pull the configured image
    Pull,
    /// Start the container, creating it if needed
    Start,
    /// Stop the container
    Stop,
    /// Remove the container and its image
    Remove,
    /// Show image and container status
    Status,
    /// List local images
    Images,
    /// List all containers
    Containers,
    /// List volumes
    Volumes,
}

/// Run an engine subcommand.
///
/// # Errors
///
/// Returns a normalized engine error when the runtime is unavailable or a
/// command fails.
pub async fn run(app: &AppContext, cmd: EngineCommand) -> Result<ExitCode> {
    match cmd {
        EngineCommand::Pull => pull(app).await,
        EngineCommand::Start => start(app).await,
        EngineCommand::Stop => stop(app).await,
        EngineCommand::Remove => remove(app).await,
        EngineCommand::Status => status(app).await,
        EngineCommand::Images | EngineCommand::Containers | EngineCommand::Volumes => {
            list(app, &cmd).await
        }
    }
}

async fn pull(app: &AppContext) -> Result<ExitCode> {
    let session = app.engine_session();
    let reporter = app.reporter();
    let result = session.pull(&reporter).await?;
    if app.is_json() {
        app.emit(&result, |_| {})?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn start(app: &AppContext) -> Result<ExitCode> {
    let session = app.engine_session();
    let result = with_spinner(&app.output, "Starting container...", session.start()).await?;
    app.emit(&result, |h| h.render_start(&result))?;
    if !app.is_json() {
        app.output
            .info(&format!("Web UI: http://localhost:{}", session.resources().port));
    }
    Ok(ExitCode::SUCCESS)
}

async fn stop(app: &AppContext) -> Result<ExitCode> {
    let session = app.engine_session();
    let result: StopResult =
        with_spinner(&app.output, "Stopping container...", session.stop()).await?;
    app.emit(&result, |h| h.render_stop(result))?;
    Ok(ExitCode::SUCCESS)
}

async fn remove(app: &AppContext) -> Result<ExitCode> {
    let resources = app.resources();
    let prompt = format!(
        "Remove container {} and image {}?",
        resources.container_name, resources.image
    );
    if !app.confirm(&prompt, true)? {
        app.output.info("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }
    let session = app.engine_session();
    let result = with_spinner(&app.output, "Removing...", session.remove()).await?;
    app.emit(&result, |h| h.render_remove(result))?;
    Ok(ExitCode::SUCCESS)
}

async fn status(app: &AppContext) -> Result<ExitCode> {
    let session = app.engine_session();
    let report = session.status().await?;
    app.emit(&report, |h| h.render_status(&report))?;
    Ok(ExitCode::SUCCESS)
}

async fn list(app: &AppContext, cmd: &EngineCommand) -> Result<ExitCode> {
    let lists = RuntimeLists::new(Rc::new(app.engine_session()));
    match cmd {
        EngineCommand::Images => {
            let list = lists.images().await;
            app.emit(&list, |h| h.render_images(&list))?;
        }
        EngineCommand::Containers => {
            let list = lists.containers().await;
            app.emit(&list, |h| h.render_containers(&list))?;
        }
        _ => {
            let list = lists.volumes().await;
            app.emit(&list, |h| h.render_volumes(&list))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
