//! a0 - command-line client for Agent Zero

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use a0_cli::app::AppContext;
use a0_cli::cli::Cli;
use a0_cli::output::{HumanRenderer, JsonRenderer, OutputContext};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_or_help();
    let flags = cli.flags();
    let json = flags.output.json;

    let result = match AppContext::new(&flags) {
        Ok(app) => cli.run(&app).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            if json {
                let _ = JsonRenderer.render_error(&e);
            } else {
                let ctx = OutputContext::new(flags.output.no_color, false);
                HumanRenderer::new(&ctx).render_error(&e);
            }
            ExitCode::FAILURE
        }
    }
}
