//! Day-bucketed time series built from per-day stats queries

pub mod aggregator;
pub mod cache;
pub mod cumulative;
pub mod days;
pub mod models;

pub use aggregator::TimeSeriesAggregator;
pub use cache::QueryCache;
pub use cumulative::cumulative;
pub use days::{expand_days, DateRange, DayBucket, InvalidDateRange};
pub use models::{AggregateState, ErrorInfo, TimeSeriesPoint};
