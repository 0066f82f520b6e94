//! Interactive Chart Plotter
//! Builds Plotly figures (JSON) for the dashboard. Figures are returned
//! to the caller; `write_dashboard` embeds them into a standalone HTML page.

use super::series::{self, ChartError, ChartOutcome};
use super::style::ChartStyle;
use polars::prelude::DataFrame;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DASHBOARD_FILE: &str = "dashboard.html";
const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// One interactive chart: a Plotly figure with `data` and `layout`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractiveChart {
    pub id: &'static str,
    pub title: String,
    pub figure: Value,
}

impl InteractiveChart {
    fn new(id: &'static str, title: &str, data: Value, layout: Value) -> Self {
        Self {
            id,
            title: title.to_string(),
            figure: json!({ "data": data, "layout": layout }),
        }
    }

    /// Trace list of the figure.
    pub fn traces(&self) -> &[Value] {
        self.figure["data"].as_array().map(Vec::as_slice).unwrap_or(&[])
    }
}

pub struct ChartPlotter;

impl ChartPlotter {
    fn layout(
        style: &ChartStyle,
        title: &str,
        x_title: Option<&str>,
        y_title: Option<&str>,
    ) -> Value {
        let mut layout = json!({
            "title": { "text": title },
            "colorway": style.hex_palette(),
            "font": { "family": style.font_family, "size": style.font_size },
            "height": style.height,
        });
        if let Some(x) = x_title {
            layout["xaxis"] = json!({ "title": { "text": x } });
        }
        if let Some(y) = y_title {
            layout["yaxis"] = json!({ "title": { "text": y } });
        }
        layout
    }

    /// Line chart of summed Sales per order date.
    pub fn sales_trend(df: &DataFrame, style: &ChartStyle) -> Result<InteractiveChart, ChartError> {
        let points = series::sales_by_date(df)?;
        let x: Vec<String> = points
            .iter()
            .map(|(d, _)| d.format("%Y-%m-%d").to_string())
            .collect();
        let y: Vec<f64> = points.iter().map(|(_, v)| *v).collect();

        let title = "Interactive Sales Trend";
        Ok(InteractiveChart::new(
            "sales_trend",
            title,
            json!([{ "type": "scatter", "mode": "lines", "name": "Sales", "x": x, "y": y }]),
            Self::layout(style, title, Some("Order Date"), Some("Sales")),
        ))
    }

    /// Bar chart of summed Sales per category.
    pub fn category_sales(
        df: &DataFrame,
        style: &ChartStyle,
    ) -> Result<InteractiveChart, ChartError> {
        let totals = series::category_sales(df)?;
        let x: Vec<&str> = totals.iter().map(|(c, _)| c.as_str()).collect();
        let y: Vec<f64> = totals.iter().map(|(_, v)| *v).collect();

        let title = "Sales by Category";
        Ok(InteractiveChart::new(
            "category_sales",
            title,
            json!([{ "type": "bar", "name": "Sales", "x": x, "y": y }]),
            Self::layout(style, title, Some("Category"), Some("Sales")),
        ))
    }

    /// Pie chart of each region's share of total Sales.
    pub fn regional_share(
        df: &DataFrame,
        style: &ChartStyle,
    ) -> Result<InteractiveChart, ChartError> {
        let totals = series::region_sales(df)?;
        let labels: Vec<&str> = totals.iter().map(|(r, _)| r.as_str()).collect();
        let values: Vec<f64> = totals.iter().map(|(_, v)| *v).collect();

        let title = "Sales Distribution by Region";
        Ok(InteractiveChart::new(
            "regional_share",
            title,
            json!([{ "type": "pie", "labels": labels, "values": values }]),
            Self::layout(style, title, None, None),
        ))
    }

    /// Build all dashboard charts; each one succeeds or fails on its own.
    pub fn build_dashboard(
        df: &DataFrame,
        style: &ChartStyle,
    ) -> Vec<ChartOutcome<InteractiveChart>> {
        let outcomes = vec![
            ChartOutcome::new("sales_trend", Self::sales_trend(df, style)),
            ChartOutcome::new("category_sales", Self::category_sales(df, style)),
            ChartOutcome::new("regional_share", Self::regional_share(df, style)),
        ];
        for outcome in &outcomes {
            if let Err(e) = &outcome.result {
                warn!(chart = outcome.name, error = %e, "interactive chart failed");
            }
        }
        outcomes
    }

    /// Standalone HTML page with one Plotly div per chart.
    pub fn dashboard_html(charts: &[InteractiveChart]) -> Result<String, ChartError> {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str("<title>Superstore Sales Dashboard</title>\n");
        html.push_str(&format!("<script src=\"{}\"></script>\n", PLOTLY_JS));
        html.push_str("</head>\n<body>\n<h1>Superstore Sales Dashboard</h1>\n");

        for chart in charts {
            // "</" inside a script block would end it early
            let figure = serde_json::to_string(&chart.figure)?.replace("</", "<\\/");
            html.push_str(&format!("<div id=\"{}\" class=\"chart\"></div>\n", chart.id));
            html.push_str("<script>\n(function () {\n");
            html.push_str(&format!("  var fig = {};\n", figure));
            html.push_str(&format!(
                "  Plotly.newPlot(\"{}\", fig.data, fig.layout, {{responsive: true}});\n",
                chart.id
            ));
            html.push_str("})();\n</script>\n");
        }

        html.push_str("</body>\n</html>\n");
        Ok(html)
    }

    pub fn write_dashboard(
        charts: &[InteractiveChart],
        path: &Path,
    ) -> Result<PathBuf, ChartError> {
        fs::write(path, Self::dashboard_html(charts)?)?;
        info!(path = %path.display(), charts = charts.len(), "dashboard saved");
        Ok(path.to_path_buf())
    }
}
