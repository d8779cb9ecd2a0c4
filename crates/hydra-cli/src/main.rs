//! hydra
//!
//! Runs a shell command in every git submodule of the current repository,
//! several submodules at a time.
//!
//! Exit status: 0 on completion, 2 when the run could not start because of a
//! configuration problem, 1 on any other error (including `--fail-on-error`
//! with failed submodules).

use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::{error, info};

use hydra_cli::args::Args;
use hydra_core::RunSummary;

/// Exit status for errors raised before any worker started.
const CONFIG_ERROR_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    hydra_core::tracing_init::init_tracing(&args.log_level, args.log_json)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Hydra started");

    let summary = match hydra_cli::app::run(&args).await {
        Ok(summary) => summary,
        Err(e) if is_config_error(&e) => {
            error!(error = %format!("{e:#}"), "Configuration error");
            return Ok(ExitCode::from(CONFIG_ERROR_EXIT));
        }
        Err(e) => return Err(e),
    };

    if args.summary_json {
        print_summary(&summary)?;
    }

    if args.fail_on_error && summary.has_failures() {
        bail!("{} of {} submodules failed", summary.failed, summary.total);
    }
    Ok(ExitCode::SUCCESS)
}

fn is_config_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<hydra_core::Error>()
        .is_some_and(hydra_core::Error::is_config)
}

#[allow(clippy::print_stdout)]
fn print_summary(summary: &RunSummary) -> Result<()> {
    println!("{}", serde_json::to_string(summary)?);
    Ok(())
}
