//! Superstore Data Loader Module
//! Reads spreadsheet (calamine) and CSV (Polars) files into a raw DataFrame.

use super::schema::{format_number, DATE_COLUMNS, NUMERIC_COLUMNS, REQUIRED_COLUMNS};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("Failed to open workbook: {0}")]
    WorkbookError(#[from] calamine::Error),
    #[error("No worksheet found in {}", .0.display())]
    NoWorksheet(PathBuf),
    #[error("Worksheet in {} has no header row", .0.display())]
    EmptySheet(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
}

/// Input formats the loader understands, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Spreadsheet,
    Csv,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(InputFormat::Spreadsheet),
            "csv" => Some(InputFormat::Csv),
            _ => None,
        }
    }
}

/// Loads the superstore dataset and keeps the raw frame around.
pub struct DataLoader {
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            file_path: None,
        }
    }

    /// Load a spreadsheet or CSV file. The previous frame is dropped first,
    /// so a failed load never leaves stale data behind.
    pub fn load(&mut self, file_path: &Path) -> Result<&DataFrame, LoaderError> {
        self.df = None;
        self.file_path = Some(file_path.to_path_buf());

        if !file_path.exists() {
            return Err(LoaderError::NotFound(file_path.to_path_buf()));
        }

        let format = InputFormat::from_path(file_path)
            .ok_or_else(|| LoaderError::UnsupportedFormat(file_path.to_path_buf()))?;

        let df = match format {
            InputFormat::Spreadsheet => Self::read_spreadsheet(file_path)?,
            InputFormat::Csv => Self::read_csv(file_path)?,
        };

        info!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "dataset loaded"
        );

        Ok(self.df.insert(df))
    }

    /// Read a CSV file. Known columns get fixed types, so a cell that does
    /// not parse fails the load instead of turning into null.
    fn read_csv(file_path: &Path) -> Result<DataFrame, LoaderError> {
        let header = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect_schema()?;

        let mut overwrite = Schema::default();
        for name in header.iter_names() {
            if NUMERIC_COLUMNS.contains(&name.as_str()) {
                overwrite.with_column(name.clone(), DataType::Float64);
            } else if REQUIRED_COLUMNS.contains(&name.as_str()) {
                overwrite.with_column(name.clone(), DataType::String);
            }
        }

        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .with_dtype_overwrite(Some(Arc::new(overwrite)))
            .finish()?
            .collect()?;
        Ok(df)
    }

    /// Read the first worksheet; the first row holds the column names.
    fn read_spreadsheet(file_path: &Path) -> Result<DataFrame, LoaderError> {
        let mut workbook = open_workbook_auto(file_path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| LoaderError::NoWorksheet(file_path.to_path_buf()))??;

        let mut rows = range.rows();
        let header: Vec<String> = rows
            .next()
            .ok_or_else(|| LoaderError::EmptySheet(file_path.to_path_buf()))?
            .iter()
            .map(|cell| cell_text(cell).unwrap_or_default())
            .collect();
        let body: Vec<&[Data]> = rows.collect();
        debug!(columns = header.len(), rows = body.len(), "worksheet read");

        let columns = header
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                // Short rows leave trailing cells empty.
                let cells = body.iter().map(|row| row.get(idx));
                if NUMERIC_COLUMNS.contains(&name.as_str()) {
                    let values: Vec<Option<f64>> =
                        cells.map(|c| c.and_then(cell_number)).collect();
                    Column::new(name.as_str().into(), values)
                } else if DATE_COLUMNS.contains(&name.as_str()) {
                    let values: Vec<Option<String>> =
                        cells.map(|c| c.and_then(cell_date_text)).collect();
                    Column::new(name.as_str().into(), values)
                } else {
                    let values: Vec<Option<String>> =
                        cells.map(|c| c.and_then(cell_text)).collect();
                    Column::new(name.as_str().into(), values)
                }
            })
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// Get list of column names from the loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }
}

/// Excel stores dates as days since 1899-12-30.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Data::Float(f) => Some(format_number(*f)),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()).map(|d| d.to_string()),
        _ => None,
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Dates become ISO text; the cleaner parses them into typed dates.
fn cell_date_text(cell: &Data) -> Option<String> {
    match cell {
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()).map(|d| d.to_string()),
        Data::Float(f) => excel_serial_to_date(*f).map(|d| d.to_string()),
        Data::Int(i) => excel_serial_to_date(*i as f64).map(|d| d.to_string()),
        other => cell_text(other),
    }
}
