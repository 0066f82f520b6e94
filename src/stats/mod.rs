//! Stats module - aggregate views over the enriched table

mod aggregator;

pub use aggregator::{
    AggregateRow, AggregateTable, AggregateView, AggregateViews, Aggregator,
    DEFAULT_TOP_PRODUCTS,
};
