//! Superstore Insights - sales ETL and reporting
//!
//! Loads a superstore order workbook (xlsx/xls/ods or csv), cleans and
//! enriches it, computes the aggregate views, prints a summary and renders
//! static PNG charts plus an interactive HTML dashboard.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{run, PipelineError, RunReport};
