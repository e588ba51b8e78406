//! hh-pilot CLI
//!
//! Thin wrapper around [`hh_pilot::app::run`]: argument parsing, tracing
//! setup, and exit-code mapping. The user closing the tab or pressing
//! Ctrl-C is a normal way for a run to end and exits 0.

use anyhow::Context;
use clap::Parser;

use hh_pilot::config::{Cli, Settings};
use hh_pilot::workflow::RunOutcome;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("hh-pilot {} starting", hh_pilot::VERSION);

    match run(cli).await {
        Ok(()) => {}
        Err(err) => {
            tracing::error!("Error occurred: {:#}", err);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::from_cli(cli).context("invalid arguments")?;

    match hh_pilot::app::run(settings).await {
        Ok(summary) => {
            match summary.outcome {
                RunOutcome::Completed => tracing::info!(
                    submitted = summary.submitted,
                    skipped = summary.skipped,
                    "All done"
                ),
                RunOutcome::Aborted => tracing::info!(
                    submitted = summary.submitted,
                    skipped = summary.skipped,
                    "Stopped by user"
                ),
            }
            Ok(())
        }
        Err(err) if err.is_page_closed() => {
            tracing::info!("Page was closed by user. Exiting gracefully");
            Ok(())
        }
        Err(err) => Err(err).context("automation failed"),
    }
}
