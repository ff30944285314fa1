use serde::{Deserialize, Serialize};

use super::builder::{build_filters, EventFilter};
use super::filter::FilterExpression;

pub const DEFAULT_PERIOD: &str = "30d";
pub const EVENTS_METRIC: &str = "events";

/// Date range of a single query: a provider period keyword or a custom pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateRangeParam {
    Period(String),
    Custom(String, String),
}

impl Default for DateRangeParam {
    fn default() -> Self {
        DateRangeParam::Period(DEFAULT_PERIOD.to_string())
    }
}

/// One outbound stats request. Also serves as its own cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Query {
    pub site_id: String,
    pub metrics: Vec<String>,
    pub date_range: DateRangeParam,
    pub filters: Vec<FilterExpression>,
}

impl Query {
    /// Event-count query for the given range and optional event filter
    pub fn events(
        site_id: impl Into<String>,
        date_range: DateRangeParam,
        filter: Option<&EventFilter>,
    ) -> Self {
        Self {
            site_id: site_id.into(),
            metrics: vec![EVENTS_METRIC.to_string()],
            date_range,
            filters: build_filters(filter),
        }
    }
}
