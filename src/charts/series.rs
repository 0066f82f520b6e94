//! Chart Series Module
//! Pulls the per-chart data out of the enriched frame. Every chart reads its
//! own columns, so a missing column fails only the charts that need it.

use crate::data::schema::{
    self, SchemaError, CATEGORY, DISCOUNT, ORDER_DATE, PROFIT, REGION, SALES,
};
use chrono::NaiveDate;
use plotters::drawing::DrawingAreaErrorKind;
use polars::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Missing field for chart: {0}")]
    MissingField(String),
    #[error("Column '{column}' has unexpected type {dtype}")]
    UnexpectedType { column: String, dtype: String },
    #[error("No data to plot for {0}")]
    EmptyData(&'static str),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Drawing error: {0}")]
    Drawing(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SchemaError> for ChartError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::MissingColumn(name) => ChartError::MissingField(name),
            SchemaError::UnexpectedType { column, dtype, .. } => {
                ChartError::UnexpectedType { column, dtype }
            }
            SchemaError::PolarsError(e) => ChartError::PolarsError(e),
        }
    }
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Drawing(err.to_string())
    }
}

/// Result of one chart in a batch; a failure here never stops the others.
#[derive(Debug)]
pub struct ChartOutcome<T> {
    pub name: &'static str,
    pub result: Result<T, ChartError>,
}

impl<T> ChartOutcome<T> {
    pub fn new(name: &'static str, result: Result<T, ChartError>) -> Self {
        Self { name, result }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summed Sales by region (rows) and category (columns). Cells with no
/// orders stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesPivot {
    pub regions: Vec<String>,
    pub categories: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl SalesPivot {
    pub fn get(&self, region: &str, category: &str) -> Option<f64> {
        let r = self.regions.iter().position(|x| x == region)?;
        let c = self.categories.iter().position(|x| x == category)?;
        self.cells[r][c]
    }

    pub fn max(&self) -> f64 {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }
}

/// Sum a numeric column per text key; null keys and values are skipped.
fn sum_by_key(
    df: &DataFrame,
    key: &str,
    value: &str,
) -> Result<BTreeMap<String, f64>, ChartError> {
    let keys = schema::str_values(df, key)?;
    let values = schema::f64_values(df, value)?;
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for (k, v) in keys.into_iter().zip(values) {
        if let Some(k) = k {
            *sums.entry(k).or_insert(0.0) += v.unwrap_or(0.0);
        }
    }
    Ok(sums)
}

/// Total Sales per order date, in date order.
pub fn sales_by_date(df: &DataFrame) -> Result<Vec<(NaiveDate, f64)>, ChartError> {
    let dates = schema::date_values(df, ORDER_DATE)?;
    let sales = schema::f64_values(df, SALES)?;
    let mut sums: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (d, s) in dates.into_iter().zip(sales) {
        if let Some(d) = d {
            *sums.entry(d).or_insert(0.0) += s.unwrap_or(0.0);
        }
    }
    Ok(sums.into_iter().collect())
}

/// Total Sales per category, ascending by category name.
pub fn category_sales(df: &DataFrame) -> Result<Vec<(String, f64)>, ChartError> {
    Ok(sum_by_key(df, CATEGORY, SALES)?.into_iter().collect())
}

/// Total Sales per category, largest first.
pub fn category_sales_desc(df: &DataFrame) -> Result<Vec<(String, f64)>, ChartError> {
    let mut totals = category_sales(df)?;
    totals.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(totals)
}

/// Total Sales per region, ascending by region name.
pub fn region_sales(df: &DataFrame) -> Result<Vec<(String, f64)>, ChartError> {
    Ok(sum_by_key(df, REGION, SALES)?.into_iter().collect())
}

pub fn region_category_pivot(df: &DataFrame) -> Result<SalesPivot, ChartError> {
    let regions = schema::str_values(df, REGION)?;
    let categories = schema::str_values(df, CATEGORY)?;
    let sales = schema::f64_values(df, SALES)?;

    let mut sums: BTreeMap<(String, String), f64> = BTreeMap::new();
    for ((r, c), s) in regions.into_iter().zip(categories).zip(sales) {
        if let (Some(r), Some(c)) = (r, c) {
            *sums.entry((r, c)).or_insert(0.0) += s.unwrap_or(0.0);
        }
    }

    let mut region_keys: Vec<String> = sums.keys().map(|(r, _)| r.clone()).collect();
    region_keys.dedup();
    let mut category_keys: Vec<String> = sums.keys().map(|(_, c)| c.clone()).collect();
    category_keys.sort();
    category_keys.dedup();

    let cells = region_keys
        .iter()
        .map(|r| {
            category_keys
                .iter()
                .map(|c| sums.get(&(r.clone(), c.clone())).copied())
                .collect()
        })
        .collect();

    Ok(SalesPivot {
        regions: region_keys,
        categories: category_keys,
        cells,
    })
}

/// Raw (discount, profit) pairs, one per order line.
pub fn discount_profit_points(df: &DataFrame) -> Result<Vec<(f64, f64)>, ChartError> {
    let discounts = schema::f64_values(df, DISCOUNT)?;
    let profits = schema::f64_values(df, PROFIT)?;
    Ok(discounts
        .into_iter()
        .zip(profits)
        .filter_map(|(d, p)| Some((d?, p?)))
        .collect())
}

/// Small enriched frame shared by the chart tests.
#[cfg(test)]
pub(crate) fn sample_enriched_frame() -> DataFrame {
    let raw = df!(
        "Order Date" => &["2017-11-08", "2017-11-08", "2016-06-12", "2015-10-11"],
        "Ship Date" => &["2017-11-11", "2017-11-11", "2016-06-16", "2015-10-18"],
        "Category" => &["Furniture", "Technology", "Furniture", "Technology"],
        "Sub-Category" => &["Chairs", "Phones", "Tables", "Phones"],
        "Region" => &["South", "South", "West", "East"],
        "Segment" => &["Consumer", "Consumer", "Corporate", "Home Office"],
        "Sales" => &[100.0, 200.0, 50.0, 25.0],
        "Profit" => &[10.0, 40.0, -5.0, 2.5],
        "Discount" => &[0.0, 0.2, 0.45, 0.0],
        "Postal Code" => &["42420", "42420", "90036", "10024"]
    )
    .unwrap();
    crate::data::DataCleaner::default().clean(&raw).unwrap().frame().clone()
}
