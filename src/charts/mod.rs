//! Charts module - static PNG rendering and interactive dashboard figures

mod plotter;
mod renderer;
mod series;
mod style;

pub use plotter::{ChartPlotter, InteractiveChart, DASHBOARD_FILE};
pub use renderer::{
    StaticChartRenderer, CATEGORY_SALES_FILE, DISCOUNT_PROFIT_FILE, HEATMAP_FILE,
    SALES_TREND_FILE,
};
pub use series::{
    category_sales, category_sales_desc, discount_profit_points, region_category_pivot,
    region_sales, sales_by_date, ChartError, ChartOutcome, SalesPivot,
};
pub use style::ChartStyle;
