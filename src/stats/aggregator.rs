//! Aggregate Views Module
//! Grouped sums, means and counts over the enriched order records.

use crate::data::{round2, EnrichedTable, OrderRecord};
use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fmt;

/// Number of sub-categories kept by the top products view.
pub const DEFAULT_TOP_PRODUCTS: usize = 5;

/// Discount keys are grouped at basis-point resolution.
const DISCOUNT_SCALE: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateView {
    SalesByCategory,
    ProfitByRegion,
    CustomerSegmentSales,
    DiscountImpact,
    TopProductsBySales,
    RegionalPerformance,
}

impl AggregateView {
    pub const ALL: [AggregateView; 6] = [
        AggregateView::SalesByCategory,
        AggregateView::ProfitByRegion,
        AggregateView::CustomerSegmentSales,
        AggregateView::DiscountImpact,
        AggregateView::TopProductsBySales,
        AggregateView::RegionalPerformance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AggregateView::SalesByCategory => "sales_by_category",
            AggregateView::ProfitByRegion => "profit_by_region",
            AggregateView::CustomerSegmentSales => "customer_segment",
            AggregateView::DiscountImpact => "discount_impact",
            AggregateView::TopProductsBySales => "top_products",
            AggregateView::RegionalPerformance => "regional_performance",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AggregateView::SalesByCategory => "Sales by Category",
            AggregateView::ProfitByRegion => "Profit by Region",
            AggregateView::CustomerSegmentSales => "Customer Segment Analysis",
            AggregateView::DiscountImpact => "Average Profit by Discount Level",
            AggregateView::TopProductsBySales => "Top Products by Sales",
            AggregateView::RegionalPerformance => "Regional Performance Summary",
        }
    }
}

impl fmt::Display for AggregateView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One group of an aggregate view; `values` line up with the table's columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub values: Vec<f64>,
}

/// A grouped summary over one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    pub key_column: String,
    pub columns: Vec<String>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    fn new(key_column: &str, columns: &[&str]) -> Self {
        Self {
            key_column: key_column.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, key: String, values: Vec<f64>) {
        self.rows.push(AggregateRow {
            key,
            values: values.into_iter().map(round2).collect(),
        });
    }

    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.key.as_str()).collect()
    }

    /// Look up one cell by group key and column name.
    pub fn value(&self, key: &str, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|r| r.key == key)
            .and_then(|r| r.values.get(idx).copied())
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, column: &str) -> Vec<f64> {
        let Some(idx) = self.columns.iter().position(|c| c == column) else {
            return Vec::new();
        };
        self.rows.iter().filter_map(|r| r.values.get(idx).copied()).collect()
    }

    /// Convert to a Polars frame for tabular display.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        let keys: Vec<&str> = self.keys();
        columns.push(Column::new(self.key_column.as_str().into(), keys));
        for (idx, name) in self.columns.iter().enumerate() {
            let values: Vec<f64> = self
                .rows
                .iter()
                .map(|r| r.values.get(idx).copied().unwrap_or(f64::NAN))
                .collect();
            columns.push(Column::new(name.as_str().into(), values));
        }
        DataFrame::new(columns)
    }
}

pub type AggregateViews = BTreeMap<AggregateView, AggregateTable>;

/// Sum, mean and count of one measure within a group.
#[derive(Debug, Clone, Default)]
struct Measure {
    values: Vec<f64>,
}

impl Measure {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| !v.is_nan()) {
            self.values.push(v);
        }
    }

    /// Starts from +0.0; an empty group sums to 0, not -0.
    fn sum(&self) -> f64 {
        self.values.iter().fold(0.0, |acc, v| acc + v)
    }

    fn mean(&self) -> f64 {
        self.values.iter().mean()
    }

    fn count(&self) -> f64 {
        self.values.len() as f64
    }
}

/// Computes every aggregate view from an enriched table.
pub struct Aggregator {
    top_products: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_PRODUCTS)
    }
}

impl Aggregator {
    pub fn new(top_products: usize) -> Self {
        Self { top_products }
    }

    pub fn compute_all(&self, table: &EnrichedTable) -> AggregateViews {
        let records = table.records();
        AggregateView::ALL
            .iter()
            .map(|&view| (view, self.compute(view, records)))
            .collect()
    }

    pub fn compute(&self, view: AggregateView, records: &[OrderRecord]) -> AggregateTable {
        match view {
            AggregateView::SalesByCategory => Self::sales_by_category(records),
            AggregateView::ProfitByRegion => Self::profit_by_region(records),
            AggregateView::CustomerSegmentSales => Self::customer_segment_sales(records),
            AggregateView::DiscountImpact => Self::discount_impact(records),
            AggregateView::TopProductsBySales => self.top_products_by_sales(records),
            AggregateView::RegionalPerformance => Self::regional_performance(records),
        }
    }

    /// Group one measure by a text key, ascending by key. Rows with no key are
    /// left out.
    fn group_by_text<K, V>(records: &[OrderRecord], key: K, value: V) -> BTreeMap<String, Measure>
    where
        K: Fn(&OrderRecord) -> Option<&String>,
        V: Fn(&OrderRecord) -> Option<f64>,
    {
        let mut groups: BTreeMap<String, Measure> = BTreeMap::new();
        for record in records {
            if let Some(k) = key(record) {
                groups.entry(k.clone()).or_default().push(value(record));
            }
        }
        groups
    }

    pub fn sales_by_category(records: &[OrderRecord]) -> AggregateTable {
        let mut table = AggregateTable::new("Category", &["sum", "mean", "count"]);
        for (key, m) in Self::group_by_text(records, |r| r.category.as_ref(), |r| r.sales) {
            table.push(key, vec![m.sum(), m.mean(), m.count()]);
        }
        table
    }

    pub fn profit_by_region(records: &[OrderRecord]) -> AggregateTable {
        let mut table = AggregateTable::new("Region", &["sum", "mean"]);
        for (key, m) in Self::group_by_text(records, |r| r.region.as_ref(), |r| Some(r.profit)) {
            table.push(key, vec![m.sum(), m.mean()]);
        }
        table
    }

    pub fn customer_segment_sales(records: &[OrderRecord]) -> AggregateTable {
        let mut table = AggregateTable::new("Segment", &["sum", "count"]);
        for (key, m) in Self::group_by_text(records, |r| r.segment.as_ref(), |r| r.sales) {
            table.push(key, vec![m.sum(), m.count()]);
        }
        table
    }

    pub fn discount_impact(records: &[OrderRecord]) -> AggregateTable {
        let mut groups: BTreeMap<i64, Measure> = BTreeMap::new();
        for record in records {
            let key = (record.discount * DISCOUNT_SCALE).round() as i64;
            groups.entry(key).or_default().push(Some(record.profit));
        }

        let mut table = AggregateTable::new("Discount", &["sum", "mean"]);
        for (key, m) in groups {
            let discount = key as f64 / DISCOUNT_SCALE;
            table.push(discount.to_string(), vec![m.sum(), m.mean()]);
        }
        table
    }

    /// Highest summed Sales first, ties broken by sub-category name.
    pub fn top_products_by_sales(&self, records: &[OrderRecord]) -> AggregateTable {
        let sales = Self::group_by_text(records, |r| r.sub_category.as_ref(), |r| r.sales);
        let profit =
            Self::group_by_text(records, |r| r.sub_category.as_ref(), |r| Some(r.profit));

        let mut ranked: Vec<(String, f64, f64)> = sales
            .into_iter()
            .map(|(key, m)| {
                let p = profit.get(&key).map(Measure::sum).unwrap_or(0.0);
                (key, m.sum(), p)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut table = AggregateTable::new("Sub-Category", &["Sales", "Profit"]);
        for (key, s, p) in ranked.into_iter().take(self.top_products) {
            table.push(key, vec![s, p]);
        }
        table
    }

    fn region_of(record: &OrderRecord) -> Option<&String> {
        record.region.as_ref()
    }

    pub fn regional_performance(records: &[OrderRecord]) -> AggregateTable {
        let sales = Self::group_by_text(records, Self::region_of, |r| r.sales);
        let profit = Self::group_by_text(records, Self::region_of, |r| Some(r.profit));
        let margin = Self::group_by_text(records, Self::region_of, |r| r.profit_margin);

        let mut table = AggregateTable::new("Region", &["Sales", "Profit", "Profit Margin"]);
        for (key, s) in sales {
            let p = profit.get(&key).map(Measure::sum).unwrap_or(0.0);
            let pm = margin.get(&key).map(Measure::mean).unwrap_or(f64::NAN);
            table.push(key, vec![s.sum(), p, pm]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(category: &str, sub: &str, region: &str, sales: f64, profit: f64) -> OrderRecord {
        let date = NaiveDate::from_ymd_opt(2017, 11, 8).unwrap();
        OrderRecord {
            order_date: date,
            ship_date: date,
            category: Some(category.to_string()),
            sub_category: Some(sub.to_string()),
            region: Some(region.to_string()),
            segment: Some("Consumer".to_string()),
            sales: Some(sales),
            profit,
            discount: 0.0,
            postal_code: "Unknown".to_string(),
            profit_margin: crate::data::profit_margin(profit, Some(sales)),
            order_year: 2017,
            order_month: 11,
            order_quarter: 4,
        }
    }

    fn sample() -> Vec<OrderRecord> {
        vec![
            record("Furniture", "Chairs", "South", 100.0, 10.0),
            record("Furniture", "Tables", "West", 50.0, -5.0),
            record("Technology", "Phones", "South", 200.0, 40.0),
        ]
    }

    #[test]
    fn test_sales_by_category() {
        let table = Aggregator::sales_by_category(&sample());
        assert_eq!(table.keys(), vec!["Furniture", "Technology"]);
        assert_eq!(table.value("Furniture", "sum"), Some(150.0));
        assert_eq!(table.value("Furniture", "mean"), Some(75.0));
        assert_eq!(table.value("Furniture", "count"), Some(2.0));
        assert_eq!(table.value("Technology", "sum"), Some(200.0));
    }

    #[test]
    fn test_category_sums_cover_total_sales() {
        let records = sample();
        let table = Aggregator::sales_by_category(&records);
        let total: f64 = records.iter().filter_map(|r| r.sales).sum();
        let grouped: f64 = table.column_values("sum").iter().sum();
        assert!((total - grouped).abs() < 1e-9);
    }

    #[test]
    fn test_profit_by_region_rounds() {
        let mut records = sample();
        records.push(record("Office Supplies", "Paper", "West", 10.0, 1.0 / 3.0));
        let table = Aggregator::profit_by_region(&records);
        assert_eq!(table.keys(), vec!["South", "West"]);
        assert_eq!(table.value("South", "sum"), Some(50.0));
        assert_eq!(table.value("West", "sum"), Some(-4.67));
        assert_eq!(table.value("West", "mean"), Some(-2.33));
    }

    #[test]
    fn test_null_keys_and_sales_are_skipped() {
        let mut records = sample();
        let mut orphan = record("Furniture", "Chairs", "East", 999.0, 1.0);
        orphan.category = None;
        records.push(orphan);
        let mut unsold = record("Technology", "Phones", "East", 0.0, 0.0);
        unsold.sales = None;
        records.push(unsold);

        let table = Aggregator::sales_by_category(&records);
        assert_eq!(table.keys(), vec!["Furniture", "Technology"]);
        assert_eq!(table.value("Furniture", "sum"), Some(150.0));
        assert_eq!(table.value("Technology", "count"), Some(1.0));
    }

    #[test]
    fn test_group_without_sales_sums_to_positive_zero() {
        let mut unsold = record("Technology", "Phones", "East", 0.0, 0.0);
        unsold.sales = None;

        let table = Aggregator::sales_by_category(&[unsold]);
        let sum = table.value("Technology", "sum").unwrap();
        assert_eq!(sum, 0.0);
        assert!(sum.is_sign_positive());
        assert_eq!(table.value("Technology", "count"), Some(0.0));
    }

    #[test]
    fn test_discount_impact_orders_numerically() {
        let mut records = sample();
        records[0].discount = 0.2;
        records[1].discount = 0.05;
        records[2].discount = 0.2;
        let table = Aggregator::discount_impact(&records);
        assert_eq!(table.keys(), vec!["0.05", "0.2"]);
        assert_eq!(table.value("0.2", "sum"), Some(50.0));
        assert_eq!(table.value("0.2", "mean"), Some(25.0));
    }

    #[test]
    fn test_top_products_limit_and_order() {
        let records: Vec<OrderRecord> = [
            ("Binders", 30.0),
            ("Chairs", 90.0),
            ("Phones", 120.0),
            ("Tables", 60.0),
            ("Paper", 10.0),
            ("Art", 60.0),
            ("Copiers", 5.0),
        ]
        .iter()
        .map(|&(sub, sales)| record("Furniture", sub, "South", sales, 1.0))
        .collect();

        let table = Aggregator::new(5).top_products_by_sales(&records);
        assert_eq!(
            table.keys(),
            vec!["Phones", "Chairs", "Art", "Tables", "Binders"]
        );
        let sales = table.column_values("Sales");
        assert!(sales.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(table.value("Chairs", "Profit"), Some(1.0));
    }

    #[test]
    fn test_top_products_with_few_groups() {
        let table = Aggregator::default().top_products_by_sales(&sample());
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.keys()[0], "Phones");
    }

    #[test]
    fn test_regional_performance_skips_undefined_margins() {
        let mut records = sample();
        records.push(record("Technology", "Phones", "West", 0.0, 5.0));
        let table = Aggregator::regional_performance(&records);
        assert_eq!(table.value("West", "Sales"), Some(50.0));
        assert_eq!(table.value("West", "Profit"), Some(0.0));
        assert_eq!(table.value("West", "Profit Margin"), Some(-10.0));
        assert_eq!(table.value("South", "Profit Margin"), Some(15.0));
    }

    #[test]
    fn test_to_dataframe_shape() {
        let table = Aggregator::sales_by_category(&sample());
        let df = table.to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 4);
    }
}
