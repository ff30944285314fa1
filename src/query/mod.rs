//! Query construction for the analytics provider

pub mod builder;
pub mod filter;
pub mod model;

pub use builder::{build_filters, Directionality, EventFilter};
pub use filter::{FilterExpression, LogicalOp};
pub use model::{DateRangeParam, Query};
