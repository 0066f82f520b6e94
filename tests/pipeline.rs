//! Integration tests for the superstore report pipeline

use chrono::NaiveDate;
use polars::prelude::DataType;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use superstore_insights::charts::{ChartStyle, StaticChartRenderer, DASHBOARD_FILE};
use superstore_insights::data::{CleanerError, DataCleaner, DataLoader, LoaderError};
use superstore_insights::report::AGGREGATES_FILE;
use superstore_insights::stats::{AggregateView, Aggregator};
use superstore_insights::{pipeline, PipelineConfig, PipelineError};
use tempfile::TempDir;

const HEADER: &str =
    "Order Date,Ship Date,Category,Sub-Category,Region,Segment,Sales,Profit,Discount,Postal Code";

/// Write a CSV with the superstore header plus the given data lines
fn write_csv(dir: &Path, lines: &[&str]) -> PathBuf {
    let path = dir.join("orders.csv");
    let mut file = fs::File::create(&path).unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    path
}

fn sample_lines() -> Vec<&'static str> {
    vec![
        // Furniture
        "2017-11-08,2017-11-11,Furniture,Chairs,South,Consumer,100,10,0,42420",
        "2016-06-12,2016-06-16,Furniture,Tables,West,Corporate,50,-5,0.2,",
        // Technology
        "2015-10-11,2015-10-18,Technology,Phones,South,Consumer,200,40,,10024",
        "2015-10-11,2015-10-15,Office Supplies,Binders,East,Home Office,0,,0.5,19140",
    ]
}

/// Path of a checked-in test fixture
fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn config_for(dir: &TempDir, input: PathBuf) -> PipelineConfig {
    PipelineConfig {
        input_path: input,
        output_dir: dir.path().join("output"),
        ..PipelineConfig::default()
    }
}

#[test]
fn test_load_clean_aggregate_csv() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), &sample_lines());

    let mut loader = DataLoader::new();
    let raw = loader.load(&path).unwrap();
    assert_eq!(raw.height(), 4);

    let table = DataCleaner::default().clean(raw).unwrap();
    assert_eq!(table.height(), 4);

    let records = table.records();
    // Missing values take the fill rules
    assert_eq!(records[1].postal_code, "Unknown");
    assert_eq!(records[2].discount, 0.0);
    assert_eq!(records[3].profit, 0.0);
    // Zero sales leave the margin empty
    assert_eq!(records[3].profit_margin, None);
    assert_eq!(records[0].profit_margin, Some(10.0));
    assert_eq!(records[0].order_year, 2017);
    assert_eq!(records[0].order_quarter, 4);

    let views = Aggregator::default().compute_all(&table);
    assert_eq!(views.len(), AggregateView::ALL.len());

    let by_category = &views[&AggregateView::SalesByCategory];
    assert_eq!(by_category.value("Furniture", "sum"), Some(150.0));
    assert_eq!(by_category.value("Furniture", "mean"), Some(75.0));
    assert_eq!(by_category.value("Furniture", "count"), Some(2.0));
    assert_eq!(by_category.value("Technology", "sum"), Some(200.0));
}

#[test]
fn test_load_clean_xlsx_workbook() {
    let mut loader = DataLoader::new();
    let raw = loader.load(&fixture("orders.xlsx")).unwrap();
    assert_eq!(raw.height(), 3);
    assert_eq!(raw.width(), 10);

    // Numeric columns are floats; dates and postal codes are text
    assert_eq!(raw.column("Sales").unwrap().dtype(), &DataType::Float64);
    assert_eq!(raw.column("Order Date").unwrap().dtype(), &DataType::String);
    assert_eq!(raw.column("Postal Code").unwrap().dtype(), &DataType::String);

    // Excel date cells and a text date both come out as ISO text
    let order_dates: Vec<Option<&str>> = raw
        .column("Order Date")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(
        order_dates,
        vec![Some("2017-11-08"), Some("2016-06-12"), Some("2017-11-08")]
    );

    // Row 3 stops before the postal code; row 4 skips the profit cell
    let postal_codes: Vec<Option<&str>> = raw
        .column("Postal Code")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(postal_codes, vec![Some("42420"), None, Some("10024")]);
    let profits: Vec<Option<f64>> = raw
        .column("Profit")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(profits, vec![Some(41.91), Some(6.87), None]);

    let table = DataCleaner::default().clean(raw).unwrap();
    let records = table.records();
    assert_eq!(records[0].ship_date, NaiveDate::from_ymd_opt(2017, 11, 11).unwrap());
    assert_eq!(records[0].sales, Some(261.96));
    assert_eq!(records[1].postal_code, "Unknown");
    assert_eq!(records[1].discount, 0.2);
    assert_eq!(records[2].profit, 0.0);
    assert_eq!(records[2].ship_date, NaiveDate::from_ymd_opt(2017, 11, 13).unwrap());
}

#[test]
fn test_every_category_appears_once() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), &sample_lines());

    let mut loader = DataLoader::new();
    let table = DataCleaner::default().clean(loader.load(&path).unwrap()).unwrap();
    let views = Aggregator::default().compute_all(&table);

    let keys = views[&AggregateView::SalesByCategory].keys();
    assert_eq!(keys, vec!["Furniture", "Office Supplies", "Technology"]);

    let total: f64 = views[&AggregateView::SalesByCategory]
        .column_values("sum")
        .iter()
        .sum();
    assert!((total - table.total_sales()).abs() < 1e-9);

    let top = &views[&AggregateView::TopProductsBySales];
    assert_eq!(top.keys()[0], "Phones");
    assert!(top.rows.len() <= 5);
}

#[test]
fn test_full_run_writes_outputs() {
    let dir = TempDir::new().unwrap();
    let input = write_csv(dir.path(), &sample_lines());
    let config = config_for(&dir, input);

    let report = pipeline::run(&config).unwrap();
    assert_eq!(report.rows, 4);
    assert_eq!(report.views.len(), AggregateView::ALL.len());
    assert_eq!(report.static_charts.len(), 4);
    assert_eq!(report.interactive_charts.len(), 3);

    let aggregates = config.output_dir.join(AGGREGATES_FILE);
    assert_eq!(report.aggregates_file.as_deref(), Some(aggregates.as_path()));
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&aggregates).unwrap()).unwrap();
    assert!(json.get("regional_performance").is_some());

    let dashboard = config.output_dir.join(DASHBOARD_FILE);
    assert!(dashboard.exists());
    assert!(fs::read_to_string(dashboard).unwrap().contains("category_sales"));
}

#[test]
fn test_missing_input_stops_before_output() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, dir.path().join("missing.xlsx"));

    match pipeline::run(&config) {
        Err(PipelineError::Load(LoaderError::NotFound(path))) => {
            assert_eq!(path, dir.path().join("missing.xlsx"));
        }
        other => panic!("expected load failure, got {:?}", other.map(|r| r.rows)),
    }
    assert!(!config.output_dir.exists());
}

#[test]
fn test_malformed_date_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = write_csv(
        dir.path(),
        &[
            "2017-11-08,2017-11-11,Furniture,Chairs,South,Consumer,100,10,0,42420",
            "2017-11-08,someday,Furniture,Tables,West,Corporate,50,-5,0.2,90036",
        ],
    );
    let config = config_for(&dir, input);

    match pipeline::run(&config) {
        Err(PipelineError::Clean(CleanerError::InvalidDate { column, row, .. })) => {
            assert_eq!(column, "Ship Date");
            assert_eq!(row, 2);
        }
        other => panic!("expected invalid date, got {:?}", other.map(|r| r.rows)),
    }
    assert!(!config.output_dir.exists());
}

#[test]
fn test_chart_missing_field_does_not_stop_others() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), &sample_lines());

    let mut loader = DataLoader::new();
    let table = DataCleaner::default().clean(loader.load(&path).unwrap()).unwrap();
    let frame = table.frame().drop("Discount").unwrap();

    let outcomes = StaticChartRenderer::render_all(&frame, &ChartStyle::default(), dir.path());
    let discount = outcomes
        .iter()
        .find(|o| o.name == "discount_vs_profit")
        .unwrap();
    assert!(!discount.is_ok());
    assert!(!dir.path().join("discount_vs_profit.png").exists());
    assert_eq!(outcomes.len(), 4);
}
