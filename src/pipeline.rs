//! Report Pipeline
//! load -> clean -> aggregate -> report -> render, strictly in sequence.
//! Load and clean failures end the run; chart failures are collected.

use crate::charts::{
    ChartOutcome, ChartPlotter, InteractiveChart, StaticChartRenderer, DASHBOARD_FILE,
};
use crate::config::PipelineConfig;
use crate::data::{CleanerError, DataCleaner, DataLoader, LoaderError};
use crate::report::{self, AGGREGATES_FILE};
use crate::stats::{AggregateViews, Aggregator};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Could not load dataset: {0}")]
    Load(#[from] LoaderError),
    #[error("Could not clean dataset: {0}")]
    Clean(#[from] CleanerError),
    #[error("Could not create output directory {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Everything one run produced.
#[derive(Debug)]
pub struct RunReport {
    pub rows: usize,
    pub views: AggregateViews,
    pub static_charts: Vec<ChartOutcome<PathBuf>>,
    pub interactive_charts: Vec<InteractiveChart>,
    pub dashboard: Option<PathBuf>,
    pub aggregates_file: Option<PathBuf>,
    /// (chart name, error message) for every chart that failed.
    pub chart_failures: Vec<(String, String)>,
}

pub fn run(config: &PipelineConfig) -> Result<RunReport, PipelineError> {
    println!("Loading and cleaning data...");
    let mut loader = DataLoader::new();
    let raw = loader.load(&config.input_path)?;

    let table = DataCleaner::new(config.fill_rules.clone()).clean(raw)?;

    println!("\nPreparing data for analysis...");
    let views = Aggregator::new(config.top_products).compute_all(&table);
    info!(views = views.len(), "aggregates computed");

    if let Err(e) = report::print_summary(&views) {
        warn!(error = %e, "failed to print summary");
    }

    fs::create_dir_all(&config.output_dir).map_err(|source| PipelineError::Output {
        path: config.output_dir.clone(),
        source,
    })?;

    let aggregates_path = config.output_dir.join(AGGREGATES_FILE);
    let aggregates_file = match report::export_json(&views, &aggregates_path) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!(error = %e, "failed to export aggregates");
            None
        }
    };

    println!("\nGenerating visualizations...");
    let mut chart_failures = Vec::new();
    let static_charts =
        StaticChartRenderer::render_all(table.frame(), &config.style, &config.output_dir);
    for outcome in &static_charts {
        if let Err(e) = &outcome.result {
            chart_failures.push((outcome.name.to_string(), e.to_string()));
        }
    }

    println!("\nCreating interactive dashboard...");
    let mut interactive_charts = Vec::new();
    for outcome in ChartPlotter::build_dashboard(table.frame(), &config.style) {
        match outcome.result {
            Ok(chart) => interactive_charts.push(chart),
            Err(e) => chart_failures.push((outcome.name.to_string(), e.to_string())),
        }
    }

    let dashboard = match ChartPlotter::write_dashboard(
        &interactive_charts,
        &config.output_dir.join(DASHBOARD_FILE),
    ) {
        Ok(path) => Some(path),
        Err(e) => {
            chart_failures.push(("dashboard".to_string(), e.to_string()));
            None
        }
    };

    if config.open_dashboard {
        if let Some(path) = &dashboard {
            if let Err(e) = open::that(path) {
                warn!(error = %e, "failed to open dashboard");
            }
        }
    }

    for (name, error) in &chart_failures {
        println!("Chart '{}' failed: {}", name, error);
    }
    info!(
        rows = table.height(),
        failed_charts = chart_failures.len(),
        "pipeline complete"
    );

    Ok(RunReport {
        rows: table.height(),
        views,
        static_charts,
        interactive_charts,
        dashboard,
        aggregates_file,
        chart_failures,
    })
}
