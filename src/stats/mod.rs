pub mod client;
pub mod metric;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{StatsClient, StatsError, StatsResult, StatsSource};
pub use metric::extract_metric_value;
