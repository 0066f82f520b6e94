//! Data Cleaner Module
//! Parses dates, fills missing values and derives margin and calendar columns.

use super::schema::{
    self, SchemaError, CATEGORY, DISCOUNT, ORDER_DATE, ORDER_MONTH, ORDER_QUARTER,
    ORDER_YEAR, POSTAL_CODE, PROFIT, PROFIT_MARGIN, REGION, REQUIRED_COLUMNS, SALES, SEGMENT,
    SHIP_DATE, SUB_CATEGORY,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Invalid date in column '{column}' at row {row}: {value:?}")]
    InvalidDate {
        column: String,
        row: usize,
        value: Option<String>,
    },
    #[error("Column '{column}' has unexpected type {dtype}")]
    UnexpectedType { column: String, dtype: String },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

impl From<SchemaError> for CleanerError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::MissingColumn(name) => CleanerError::MissingColumn(name),
            SchemaError::UnexpectedType { column, dtype, .. } => {
                CleanerError::UnexpectedType { column, dtype }
            }
            SchemaError::PolarsError(e) => CleanerError::PolarsError(e),
        }
    }
}

/// Replacement values for missing cells. No other column is filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillRules {
    pub postal_code: String,
    pub discount: f64,
    pub profit: f64,
}

impl Default for FillRules {
    fn default() -> Self {
        Self {
            postal_code: "Unknown".to_string(),
            discount: 0.0,
            profit: 0.0,
        }
    }
}

/// One cleaned order line.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_date: NaiveDate,
    pub ship_date: NaiveDate,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub region: Option<String>,
    pub segment: Option<String>,
    pub sales: Option<f64>,
    pub profit: f64,
    pub discount: f64,
    pub postal_code: String,
    pub profit_margin: Option<f64>,
    pub order_year: i32,
    pub order_month: u32,
    pub order_quarter: u32,
}

/// Cleaned dataset plus derived columns. Read-only once built.
#[derive(Debug, Clone)]
pub struct EnrichedTable {
    frame: DataFrame,
    records: Vec<OrderRecord>,
}

impl EnrichedTable {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }

    pub fn height(&self) -> usize {
        self.records.len()
    }

    pub fn total_sales(&self) -> f64 {
        self.records
            .iter()
            .filter_map(|r| r.sales)
            .fold(0.0, |acc, v| acc + v)
    }
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Profit as a percentage of sales; `None` when sales are zero or missing.
pub fn profit_margin(profit: f64, sales: Option<f64>) -> Option<f64> {
    match sales {
        Some(s) if s != 0.0 && s.is_finite() => Some(round2(profit / s * 100.0)),
        _ => None,
    }
}

pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Parse a date written in one of the accepted layouts.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Turns the raw loaded table into an `EnrichedTable`.
pub struct DataCleaner {
    fill_rules: FillRules,
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self::new(FillRules::default())
    }
}

impl DataCleaner {
    pub fn new(fill_rules: FillRules) -> Self {
        Self { fill_rules }
    }

    /// Clean a raw table. The input frame is not modified; the result is a
    /// new frame with typed dates, filled values and the derived columns.
    pub fn clean(&self, raw: &DataFrame) -> Result<EnrichedTable, CleanerError> {
        schema::require_columns(raw, &REQUIRED_COLUMNS)?;

        let order_dates = Self::parse_date_column(raw, ORDER_DATE)?;
        let ship_dates = Self::parse_date_column(raw, SHIP_DATE)?;
        debug!(rows = raw.height(), "dates parsed");

        let postal_codes: Vec<String> = schema::str_values(raw, POSTAL_CODE)?
            .into_iter()
            .map(|v| v.unwrap_or_else(|| self.fill_rules.postal_code.clone()))
            .collect();
        let discounts: Vec<f64> = schema::f64_values(raw, DISCOUNT)?
            .into_iter()
            .map(|v| v.unwrap_or(self.fill_rules.discount))
            .collect();
        let profits: Vec<f64> = schema::f64_values(raw, PROFIT)?
            .into_iter()
            .map(|v| v.unwrap_or(self.fill_rules.profit))
            .collect();
        let sales = schema::f64_values(raw, SALES)?;

        let margins: Vec<Option<f64>> = profits
            .iter()
            .zip(&sales)
            .map(|(&p, &s)| profit_margin(p, s))
            .collect();
        let years: Vec<i32> = order_dates.iter().map(|d| d.year()).collect();
        let months: Vec<u32> = order_dates.iter().map(|d| d.month()).collect();
        let quarters: Vec<u32> = order_dates.iter().map(|d| quarter_of(*d)).collect();

        let mut frame = raw.clone();
        frame.with_column(schema::date_column(
            ORDER_DATE,
            &order_dates.iter().copied().map(Some).collect::<Vec<_>>(),
        )?)?;
        frame.with_column(schema::date_column(
            SHIP_DATE,
            &ship_dates.iter().copied().map(Some).collect::<Vec<_>>(),
        )?)?;
        frame.with_column(Column::new(POSTAL_CODE.into(), postal_codes.clone()))?;
        frame.with_column(Column::new(DISCOUNT.into(), discounts.clone()))?;
        frame.with_column(Column::new(PROFIT.into(), profits.clone()))?;
        frame.with_column(Column::new(SALES.into(), sales.clone()))?;
        frame.with_column(Column::new(PROFIT_MARGIN.into(), margins.clone()))?;
        frame.with_column(Column::new(ORDER_YEAR.into(), years.clone()))?;
        frame.with_column(Column::new(ORDER_MONTH.into(), months.clone()))?;
        frame.with_column(Column::new(ORDER_QUARTER.into(), quarters.clone()))?;

        let categories = schema::str_values(raw, CATEGORY)?;
        let sub_categories = schema::str_values(raw, SUB_CATEGORY)?;
        let regions = schema::str_values(raw, REGION)?;
        let segments = schema::str_values(raw, SEGMENT)?;

        let records = (0..raw.height())
            .map(|i| OrderRecord {
                order_date: order_dates[i],
                ship_date: ship_dates[i],
                category: categories[i].clone(),
                sub_category: sub_categories[i].clone(),
                region: regions[i].clone(),
                segment: segments[i].clone(),
                sales: sales[i],
                profit: profits[i],
                discount: discounts[i],
                postal_code: postal_codes[i].clone(),
                profit_margin: margins[i],
                order_year: years[i],
                order_month: months[i],
                order_quarter: quarters[i],
            })
            .collect();

        let undefined_margins = margins.iter().filter(|m| m.is_none()).count();
        info!(
            rows = frame.height(),
            undefined_margins, "dataset cleaned and enriched"
        );

        Ok(EnrichedTable { frame, records })
    }

    /// Every row must carry a parseable date; the first bad one aborts.
    fn parse_date_column(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>, CleanerError> {
        let col = df
            .column(name)
            .map_err(|_| CleanerError::MissingColumn(name.to_string()))?;

        let parsed: Vec<(Option<NaiveDate>, Option<String>)> = match col.dtype() {
            DataType::Date | DataType::Datetime(_, _) => schema::date_values(df, name)?
                .into_iter()
                .map(|d| (d, None))
                .collect(),
            _ => schema::str_values(df, name)?
                .into_iter()
                .map(|text| (text.as_deref().and_then(parse_date), text))
                .collect(),
        };

        parsed
            .into_iter()
            .enumerate()
            .map(|(idx, (date, text))| {
                date.ok_or_else(|| CleanerError::InvalidDate {
                    column: name.to_string(),
                    row: idx + 1,
                    value: text,
                })
            })
            .collect()
    }
}

/// Columns the cleaner adds or rewrites, for callers that compare runs.
pub const ENRICHED_COLUMNS: [&str; 4] = [PROFIT_MARGIN, ORDER_YEAR, ORDER_MONTH, ORDER_QUARTER];
