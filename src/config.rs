//! Pipeline Configuration
//! Input/output locations, fill rules and chart style for one run.

use crate::charts::ChartStyle;
use crate::data::FillRules;
use crate::stats::DEFAULT_TOP_PRODUCTS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "SUPERSTORE_CONFIG";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "superstore.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub fill_rules: FillRules,
    pub style: ChartStyle,
    pub top_products: usize,
    /// Open the generated dashboard in the default browser.
    pub open_dashboard: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data/superstore_dataset.xlsx"),
            output_dir: PathBuf::from("output"),
            fill_rules: FillRules::default(),
            style: ChartStyle::default(),
            top_products: DEFAULT_TOP_PRODUCTS,
            open_dashboard: false,
        }
    }
}

impl PipelineConfig {
    /// Resolve the run configuration: the file named by `SUPERSTORE_CONFIG`,
    /// else `superstore.json` in the working directory, else defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}
