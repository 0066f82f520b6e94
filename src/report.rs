//! Summary Report
//! Prints aggregate views to stdout and exports them as JSON.

use crate::stats::{AggregateTable, AggregateView, AggregateViews};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const AGGREGATES_FILE: &str = "aggregates.json";

/// Views in print order, with their headings.
const SUMMARY_SECTIONS: [AggregateView; 3] = [
    AggregateView::SalesByCategory,
    AggregateView::ProfitByRegion,
    AggregateView::CustomerSegmentSales,
];

const INSIGHT_SECTIONS: [AggregateView; 3] = [
    AggregateView::TopProductsBySales,
    AggregateView::DiscountImpact,
    AggregateView::RegionalPerformance,
];

fn heading(view: AggregateView, table: &AggregateTable) -> String {
    match view {
        AggregateView::TopProductsBySales => format!("Top {} Products by Sales", table.rows.len()),
        other => other.title().to_string(),
    }
}

fn write_table<W: Write>(out: &mut W, title: &str, table: &AggregateTable) -> io::Result<()> {
    writeln!(out, "\n{}:", title)?;
    match table.to_dataframe() {
        Ok(df) => writeln!(out, "{}", df),
        Err(e) => writeln!(out, "  <unavailable: {}>", e),
    }
}

/// Write the summary tables followed by the key insights.
pub fn write_summary<W: Write>(out: &mut W, views: &AggregateViews) -> io::Result<()> {
    writeln!(out, "\nSummary Statistics:")?;
    for view in SUMMARY_SECTIONS {
        if let Some(table) = views.get(&view) {
            write_table(out, &heading(view, table), table)?;
        }
    }

    writeln!(out, "\nKey Insights:")?;
    for view in INSIGHT_SECTIONS {
        if let Some(table) = views.get(&view) {
            write_table(out, &heading(view, table), table)?;
        }
    }
    Ok(())
}

pub fn print_summary(views: &AggregateViews) -> io::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_summary(&mut lock, views)
}

/// Aggregate views keyed by view name.
pub fn views_to_json(views: &AggregateViews) -> serde_json::Result<Value> {
    let mut map = Map::new();
    for (view, table) in views {
        map.insert(view.name().to_string(), serde_json::to_value(table)?);
    }
    Ok(Value::Object(map))
}

pub fn export_json(views: &AggregateViews, path: &Path) -> io::Result<PathBuf> {
    let value = views_to_json(views)?;
    fs::write(path, serde_json::to_string_pretty(&value)?)?;
    info!(path = %path.display(), views = views.len(), "aggregates exported");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataCleaner;
    use crate::stats::Aggregator;
    use polars::prelude::*;

    fn views() -> AggregateViews {
        let raw = df!(
            "Order Date" => &["2017-11-08", "2016-06-12", "2015-10-11"],
            "Ship Date" => &["2017-11-11", "2016-06-16", "2015-10-18"],
            "Category" => &["Furniture", "Furniture", "Technology"],
            "Sub-Category" => &["Chairs", "Tables", "Phones"],
            "Region" => &["South", "West", "South"],
            "Segment" => &["Consumer", "Corporate", "Consumer"],
            "Sales" => &[100.0, 50.0, 200.0],
            "Profit" => &[10.0, -5.0, 40.0],
            "Discount" => &[0.0, 0.2, 0.0],
            "Postal Code" => &["42420", "90036", "10024"]
        )
        .unwrap();
        let table = DataCleaner::default().clean(&raw).unwrap();
        Aggregator::default().compute_all(&table)
    }

    #[test]
    fn test_summary_sections_in_order() {
        let mut out = Vec::new();
        write_summary(&mut out, &views()).unwrap();
        let text = String::from_utf8(out).unwrap();

        let positions: Vec<usize> = [
            "Sales by Category:",
            "Profit by Region:",
            "Customer Segment Analysis:",
            "Top 3 Products by Sales:",
            "Average Profit by Discount Level:",
            "Regional Performance Summary:",
        ]
        .iter()
        .map(|h| text.find(h).unwrap_or_else(|| panic!("missing heading {}", h)))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_views_to_json() {
        let json = views_to_json(&views()).unwrap();
        let category = &json["sales_by_category"];
        assert_eq!(category["key_column"], "Category");
        assert_eq!(category["rows"][0]["key"], "Furniture");
        assert_eq!(category["rows"][0]["values"][0], 150.0);
        assert_eq!(json.as_object().unwrap().len(), 6);
    }
}
