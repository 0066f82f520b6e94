//! Superstore Insights - command line entry point
//!
//! Runs the full report pipeline with the configuration resolved from
//! `SUPERSTORE_CONFIG`, `./superstore.json` or the built-in defaults.

use anyhow::Context;
use std::process::ExitCode;
use superstore_insights::{pipeline, PipelineConfig};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("SUPERSTORE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let config = PipelineConfig::load().context("failed to resolve configuration")?;

    match pipeline::run(&config) {
        Ok(report) => {
            println!(
                "\nAnalysis complete: {} rows, {} charts failed. Output in {}",
                report.rows,
                report.chart_failures.len(),
                config.output_dir.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "pipeline aborted");
            println!("Error: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

