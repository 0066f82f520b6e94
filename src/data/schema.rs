//! Superstore Column Schema
//! Column names and typed column extraction from Polars frames.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use thiserror::Error;

pub const ORDER_DATE: &str = "Order Date";
pub const SHIP_DATE: &str = "Ship Date";
pub const CATEGORY: &str = "Category";
pub const SUB_CATEGORY: &str = "Sub-Category";
pub const REGION: &str = "Region";
pub const SEGMENT: &str = "Segment";
pub const SALES: &str = "Sales";
pub const PROFIT: &str = "Profit";
pub const DISCOUNT: &str = "Discount";
pub const POSTAL_CODE: &str = "Postal Code";

// Derived during cleaning
pub const PROFIT_MARGIN: &str = "Profit Margin";
pub const ORDER_YEAR: &str = "Order Year";
pub const ORDER_MONTH: &str = "Order Month";
pub const ORDER_QUARTER: &str = "Order Quarter";

/// Columns every input file must provide.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    ORDER_DATE,
    SHIP_DATE,
    CATEGORY,
    SUB_CATEGORY,
    REGION,
    SEGMENT,
    SALES,
    PROFIT,
    DISCOUNT,
    POSTAL_CODE,
];

pub const DATE_COLUMNS: [&str; 2] = [ORDER_DATE, SHIP_DATE];
pub const NUMERIC_COLUMNS: [&str; 3] = [SALES, PROFIT, DISCOUNT];

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Column '{column}' has type {dtype}, expected {expected}")]
    UnexpectedType {
        column: String,
        dtype: String,
        expected: &'static str,
    },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Check that every named column is present, reporting the first absent one.
pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<(), SchemaError> {
    let present = df.get_column_names();
    for &name in columns {
        if !present.iter().any(|c| c.as_str() == name) {
            return Err(SchemaError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, SchemaError> {
    df.column(name)
        .map_err(|_| SchemaError::MissingColumn(name.to_string()))
}

/// Numeric column as `f64` values; non-numeric cells become `None`.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, SchemaError> {
    let values = column(df, name)?.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

/// Text column values. Numeric columns are rendered without a trailing `.0`
/// when integral, so postal codes read back as they were written.
pub fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, SchemaError> {
    let col = column(df, name)?;
    match col.dtype() {
        DataType::Float32 | DataType::Float64 => {
            let values = col.cast(&DataType::Float64)?;
            Ok(values
                .f64()?
                .into_iter()
                .map(|v| v.map(format_number))
                .collect())
        }
        _ => {
            let values = col.cast(&DataType::String)?;
            Ok(values
                .str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect())
        }
    }
}

/// Date column values. The column must already be typed as a date.
pub fn date_values(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>, SchemaError> {
    let col = column(df, name)?;
    let col = match col.dtype() {
        DataType::Date => col.clone(),
        DataType::Datetime(_, _) => col.cast(&DataType::Date)?,
        other => {
            return Err(SchemaError::UnexpectedType {
                column: name.to_string(),
                dtype: other.to_string(),
                expected: "date",
            })
        }
    };
    let days = col.cast(&DataType::Int32)?;
    Ok(days
        .i32()?
        .into_iter()
        .map(|d| d.and_then(date_from_epoch_days))
        .collect())
}

pub fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

pub fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Build a Polars date column from calendar dates.
pub fn date_column(name: &str, dates: &[Option<NaiveDate>]) -> Result<Column, SchemaError> {
    let days: Vec<Option<i32>> = dates.iter().map(|d| d.map(epoch_days)).collect();
    Ok(Column::new(name.into(), days).cast(&DataType::Date)?)
}

pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}
