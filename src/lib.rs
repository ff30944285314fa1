pub mod api;
pub mod config;
pub mod proxy;
pub mod query;
pub mod stats;
pub mod timeseries;
