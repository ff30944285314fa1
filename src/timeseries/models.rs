use serde::{Deserialize, Serialize};

use crate::stats::StatsError;

/// One day of a chart series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// Display label, e.g. "Mar 05"
    pub date: String,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&StatsError> for ErrorInfo {
    fn from(err: &StatsError) -> Self {
        Self {
            message: err.to_string(),
            status: err.status(),
        }
    }
}

/// Loading/error/data snapshot for one fetch set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateState {
    pub is_loading: bool,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<TimeSeriesPoint>>,
}

impl AggregateState {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Default::default()
        }
    }

    /// Series values in order, or an empty slice while nothing has settled
    pub fn points(&self) -> &[TimeSeriesPoint] {
        self.data.as_deref().unwrap_or(&[])
    }
}
