use std::error::Error;
use std::process::ExitCode;

use novade_quad_client::{logging, ClientError, ConfigLoader, LoopSummary, QuadClient};
use tracing::info;

fn try_main() -> Result<LoopSummary, ClientError> {
    let (config, path) = ConfigLoader::load()?;
    logging::init_logging(&config.logging)?;
    info!(
        path = %path.display(),
        from_file = path.is_file(),
        "configuration resolved"
    );
    info!(
        width = config.window.width,
        height = config.window.height,
        dispatch = ?config.render.dispatch,
        "starting NovaDE quad client"
    );
    QuadClient::bootstrap(&config)?.run()
}

/// Prints `err` and its source chain to stderr.
fn report(err: &ClientError) {
    eprintln!("Error: {err}");
    let mut current: Option<&dyn Error> = err.source();
    let mut indent_level = 1;
    while let Some(source) = current {
        eprintln!("{}Caused by: {source}", "  ".repeat(indent_level));
        current = source.source();
        indent_level += 1;
    }
}

fn main() -> ExitCode {
    match try_main() {
        Ok(summary) => {
            info!(frames = summary.frames, reason = ?summary.reason, "exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}
