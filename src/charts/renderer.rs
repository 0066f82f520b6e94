//! Static Chart Renderer
//! Draws the report charts as PNG files with plotters.
//!
//! Charts:
//! 1. Sales trend: summed Sales per order date
//! 2. Category sales: bars sorted by total Sales, largest first
//! 3. Region x Category heatmap of summed Sales, annotated
//! 4. Discount vs Profit scatter, one translucent point per order line

use super::series::{self, ChartError, ChartOutcome};
use super::style::ChartStyle;
use chrono::Duration;
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const SALES_TREND_FILE: &str = "sales_trend.png";
pub const CATEGORY_SALES_FILE: &str = "category_sales.png";
pub const HEATMAP_FILE: &str = "region_category_heatmap.png";
pub const DISCOUNT_PROFIT_FILE: &str = "discount_vs_profit.png";

const EMPTY_CELL: RGBColor = RGBColor(235, 235, 235);

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every static chart into `out_dir`. Each chart succeeds or fails
    /// on its own.
    pub fn render_all(
        df: &DataFrame,
        style: &ChartStyle,
        out_dir: &Path,
    ) -> Vec<ChartOutcome<PathBuf>> {
        let outcomes = vec![
            ChartOutcome::new(
                "sales_trend",
                Self::render_sales_trend(df, style, &out_dir.join(SALES_TREND_FILE)),
            ),
            ChartOutcome::new(
                "category_sales",
                Self::render_category_sales(df, style, &out_dir.join(CATEGORY_SALES_FILE)),
            ),
            ChartOutcome::new(
                "region_category_heatmap",
                Self::render_region_category_heatmap(df, style, &out_dir.join(HEATMAP_FILE)),
            ),
            ChartOutcome::new(
                "discount_vs_profit",
                Self::render_discount_impact(df, style, &out_dir.join(DISCOUNT_PROFIT_FILE)),
            ),
        ];

        for outcome in &outcomes {
            match &outcome.result {
                Ok(path) => info!(chart = outcome.name, path = %path.display(), "chart saved"),
                Err(e) => warn!(chart = outcome.name, error = %e, "chart failed"),
            }
        }
        outcomes
    }

    pub fn render_sales_trend(
        df: &DataFrame,
        style: &ChartStyle,
        path: &Path,
    ) -> Result<PathBuf, ChartError> {
        let points = series::sales_by_date(df)?;
        let (start, _) = *points.first().ok_or(ChartError::EmptyData("sales trend"))?;

        // x is days since the first order date
        let xy: Vec<(f64, f64)> = points
            .iter()
            .map(|(d, v)| ((*d - start).num_days() as f64, *v))
            .collect();
        let x_max = xy.last().map(|p| p.0).unwrap_or(0.0).max(1.0);
        let y_max = xy.iter().map(|p| p.1).fold(0.0, f64::max).max(1.0) * 1.1;

        let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Monthly Sales Trend", style.caption_font())
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Sales ($)")
            .x_label_formatter(&|x| {
                (start + Duration::days(x.round() as i64))
                    .format("%Y-%m")
                    .to_string()
            })
            .axis_desc_style(style.label_font())
            .label_style(style.label_font())
            .draw()?;

        chart.draw_series(LineSeries::new(xy, &style.color(0)))?;

        root.present()?;
        Ok(path.to_path_buf())
    }

    pub fn render_category_sales(
        df: &DataFrame,
        style: &ChartStyle,
        path: &Path,
    ) -> Result<PathBuf, ChartError> {
        let totals = series::category_sales_desc(df)?;
        if totals.is_empty() {
            return Err(ChartError::EmptyData("category sales"));
        }
        let names: Vec<String> = totals.iter().map(|(n, _)| n.clone()).collect();
        let y_max = totals.iter().map(|t| t.1).fold(0.0, f64::max).max(1.0) * 1.1;

        let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Sales by Category", style.caption_font())
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d((0..totals.len()).into_segmented(), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Category")
            .y_desc("Total Sales ($)")
            .x_label_formatter(&|v| segment_label(&names, v))
            .axis_desc_style(style.label_font())
            .label_style(style.label_font())
            .draw()?;

        chart.draw_series(totals.iter().enumerate().map(|(i, (_, v))| {
            Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
                style.color(i).filled(),
            )
        }))?;

        root.present()?;
        Ok(path.to_path_buf())
    }

    pub fn render_region_category_heatmap(
        df: &DataFrame,
        style: &ChartStyle,
        path: &Path,
    ) -> Result<PathBuf, ChartError> {
        let pivot = series::region_category_pivot(df)?;
        if pivot.regions.is_empty() {
            return Err(ChartError::EmptyData("region/category heatmap"));
        }
        let max = pivot.max().max(1.0);

        let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Sales Heatmap by Region and Category", style.caption_font())
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(120)
            .build_cartesian_2d(
                (0..pivot.categories.len()).into_segmented(),
                (0..pivot.regions.len()).into_segmented(),
            )?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("Category")
            .y_desc("Region")
            .x_label_formatter(&|v| segment_label(&pivot.categories, v))
            .y_label_formatter(&|v| segment_label(&pivot.regions, v))
            .axis_desc_style(style.label_font())
            .label_style(style.label_font())
            .draw()?;

        let cells: Vec<(usize, usize, Option<f64>)> = pivot
            .cells
            .iter()
            .enumerate()
            .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, v)| (r, c, *v)))
            .collect();

        chart.draw_series(cells.iter().map(|&(r, c, v)| {
            let fill = match v {
                Some(v) => ChartStyle::heat_color(v / max),
                None => EMPTY_CELL,
            };
            Rectangle::new(
                [
                    (SegmentValue::Exact(c), SegmentValue::Exact(r)),
                    (SegmentValue::Exact(c + 1), SegmentValue::Exact(r + 1)),
                ],
                fill.filled(),
            )
        }))?;

        let centered = Pos::new(HPos::Center, VPos::Center);
        chart.draw_series(cells.iter().filter_map(|&(r, c, v)| {
            let v = v?;
            let color = if v / max > 0.6 { &WHITE } else { &BLACK };
            let font = TextStyle::from(style.annotation_font())
                .color(color)
                .pos(centered);
            Some(Text::new(
                format!("{:.0}", v),
                (SegmentValue::CenterOf(c), SegmentValue::CenterOf(r)),
                font,
            ))
        }))?;

        root.present()?;
        Ok(path.to_path_buf())
    }

    pub fn render_discount_impact(
        df: &DataFrame,
        style: &ChartStyle,
        path: &Path,
    ) -> Result<PathBuf, ChartError> {
        let points = series::discount_profit_points(df)?;
        if points.is_empty() {
            return Err(ChartError::EmptyData("discount impact"));
        }

        let x_max = points.iter().map(|p| p.0).fold(0.0, f64::max) + 0.05;
        let y_min = points.iter().map(|p| p.1).fold(0.0, f64::min);
        let y_max = points.iter().map(|p| p.1).fold(0.0, f64::max);
        let pad = ((y_max - y_min) * 0.1).max(1.0);

        let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Impact of Discount on Profit", style.caption_font())
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(-0.05f64..x_max, (y_min - pad)..(y_max + pad))?;

        chart
            .configure_mesh()
            .x_desc("Discount (%)")
            .y_desc("Profit ($)")
            .axis_desc_style(style.label_font())
            .label_style(style.label_font())
            .draw()?;

        let fill = style.color(0).mix(style.point_alpha).filled();
        chart.draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 4, fill)))?;

        root.present()?;
        Ok(path.to_path_buf())
    }
}

/// Label segment centers with their names; segment edges stay blank.
fn segment_label(names: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(i) => names.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::series::sample_enriched_frame;
    use crate::data::schema::{DISCOUNT, ORDER_DATE};
    use tempfile::tempdir;

    #[test]
    fn test_segment_label() {
        let names = vec!["Furniture".to_string(), "Technology".to_string()];
        assert_eq!(segment_label(&names, &SegmentValue::CenterOf(1)), "Technology");
        assert_eq!(segment_label(&names, &SegmentValue::Exact(1)), "");
        assert_eq!(segment_label(&names, &SegmentValue::CenterOf(5)), "");
    }

    #[test]
    fn test_missing_field_fails_before_drawing() {
        let df = sample_enriched_frame().drop(DISCOUNT).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join(DISCOUNT_PROFIT_FILE);

        let style = ChartStyle::default();
        let result = StaticChartRenderer::render_discount_impact(&df, &style, &path);
        assert!(matches!(result, Err(ChartError::MissingField(ref f)) if f == DISCOUNT));
        assert!(!path.exists());
    }

    #[test]
    fn test_render_all_isolates_failures() {
        let df = sample_enriched_frame().drop(ORDER_DATE).unwrap();
        let dir = tempdir().unwrap();
        let outcomes = StaticChartRenderer::render_all(&df, &ChartStyle::default(), dir.path());

        assert_eq!(outcomes.len(), 4);
        let trend = outcomes.iter().find(|o| o.name == "sales_trend").unwrap();
        assert!(matches!(trend.result, Err(ChartError::MissingField(_))));
        // The other charts were still attempted and none of them report a
        // missing field.
        assert!(outcomes
            .iter()
            .filter(|o| o.name != "sales_trend")
            .all(|o| !matches!(o.result, Err(ChartError::MissingField(_)))));
    }

    #[test]
    #[ignore = "needs system fonts for text rendering"]
    fn test_render_all_writes_png_files() {
        let df = sample_enriched_frame();
        let dir = tempdir().unwrap();
        let outcomes = StaticChartRenderer::render_all(&df, &ChartStyle::default(), dir.path());
        for outcome in outcomes {
            let path = outcome.result.unwrap();
            assert!(path.exists());
        }
    }
}
