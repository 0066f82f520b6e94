//! Data module - loading, schema and cleaning

mod cleaner;
mod loader;
pub mod schema;

pub use cleaner::{
    parse_date, profit_margin, quarter_of, round2, CleanerError, DataCleaner, EnrichedTable,
    FillRules, OrderRecord, ENRICHED_COLUMNS,
};
pub use loader::{DataLoader, InputFormat, LoaderError};
