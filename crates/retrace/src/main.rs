//! retrace: replay a git history as a stream of buffer edits
//!
//! Operations go to stdout in the chosen format; logs go to stderr.

use std::process::ExitCode;

use clap::Parser;
use retrace::config::{Config, OutputFormat};
use retrace::output::render_summary;
use tracing::{error, info};

fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return ExitCode::FAILURE;
    }

    match retrace::run::run(&config) {
        Ok(summary) => {
            if config.format == OutputFormat::Summary {
                println!("{}", render_summary(&summary));
            } else {
                info!(
                    commits = summary.commits,
                    operations = summary.operations,
                    cancelled = summary.cancelled,
                    "Replay finished"
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
