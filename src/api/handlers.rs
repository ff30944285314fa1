use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::query::{DateRangeParam, Directionality, EventFilter};
use crate::stats::StatsError;
use crate::timeseries::{
    cumulative, AggregateState, DateRange, TimeSeriesAggregator, TimeSeriesPoint,
};

/// Window used when a request names no dates
pub const DEFAULT_WINDOW_DAYS: u32 = 30;
/// Longest range the series endpoint expands into per-day queries
pub const MAX_SERIES_DAYS: u64 = 366;
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct AppState {
    pub aggregator: Arc<TimeSeriesAggregator>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Upstream(#[from] StatsError),
    #[error("selection superseded")]
    Superseded,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message, None),
            ApiError::Upstream(err) => (
                StatusCode::BAD_GATEWAY,
                "Plausible API error".to_string(),
                Some(err.to_string()),
            ),
            ApiError::Superseded => (
                StatusCode::CONFLICT,
                "Selection superseded".to_string(),
                None,
            ),
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

/// Dashboard selection: dates, event filter and an optional view id
#[derive(Debug, Default, Deserialize)]
pub struct SelectionParams {
    pub start: Option<String>,
    pub end: Option<String>,
    /// Provider period keyword, only used by the aggregate endpoint
    pub period: Option<String>,
    pub event: Option<String>,
    pub network: Option<String>,
    pub direction: Option<Directionality>,
    pub view: Option<String>,
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| ApiError::BadRequest(format!("{field} must be a YYYY-MM-DD date")))
}

impl SelectionParams {
    /// Requested range; missing bounds fall back to the default window
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange, ApiError> {
        let start = self.start.as_deref().map(|s| parse_date("start", s)).transpose()?;
        let end = self.end.as_deref().map(|s| parse_date("end", s)).transpose()?;

        let range = match (start, end) {
            (None, None) => Ok(DateRange::last_days(DEFAULT_WINDOW_DAYS, today)),
            (Some(start), None) => DateRange::new(start, today.max(start)),
            (None, Some(end)) => DateRange::new(
                end.checked_sub_days(Days::new(u64::from(DEFAULT_WINDOW_DAYS)))
                    .unwrap_or(NaiveDate::MIN),
                end,
            ),
            (Some(start), Some(end)) => DateRange::new(start, end),
        };

        range.map_err(|e| ApiError::BadRequest(e.to_string()))
    }

    /// Requested range, refused when it would fan out into too many day queries
    pub fn series_range(&self, today: NaiveDate) -> Result<DateRange, ApiError> {
        let range = self.date_range(today)?;
        if range.day_count() > MAX_SERIES_DAYS {
            return Err(ApiError::BadRequest(format!(
                "date range spans {} days; at most {MAX_SERIES_DAYS} are allowed",
                range.day_count()
            )));
        }
        Ok(range)
    }

    pub fn event_filter(&self) -> Option<EventFilter> {
        let event_name = self.event.as_ref().filter(|name| !name.is_empty())?;
        Some(EventFilter {
            event_name: event_name.clone(),
            network: self.network.clone().filter(|n| !n.is_empty()),
            directionality: self.direction,
        })
    }

    fn aggregate_range(&self) -> Result<DateRangeParam, ApiError> {
        match (&self.start, &self.end) {
            (Some(_), Some(_)) => Ok(self.date_range(Utc::now().date_naive())?.as_param()),
            _ => Ok(self
                .period
                .clone()
                .map(DateRangeParam::Period)
                .unwrap_or_default()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub daily: AggregateState,
    pub cumulative: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Serialize)]
pub struct TotalResponse {
    pub value: Option<f64>,
}

/// Daily and cumulative series for a selection
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> Result<Json<SeriesResponse>, ApiError> {
    let range = params.series_range(Utc::now().date_naive())?;
    let filter = params.event_filter();

    let daily = match params.view.as_deref() {
        Some(view) => state
            .aggregator
            .select(view, &range, filter.as_ref())
            .await
            .ok_or(ApiError::Superseded)?,
        None => state.aggregator.fetch_series(&range, filter.as_ref()).await,
    };
    let cumulative = cumulative(daily.points());

    Ok(Json(SeriesResponse { daily, cumulative }))
}

/// Single aggregate event count for a selection
pub async fn get_total(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> Result<Json<TotalResponse>, ApiError> {
    let date_range = params.aggregate_range()?;
    let filter = params.event_filter();

    let value = state
        .aggregator
        .fetch_total(date_range, filter.as_ref())
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch aggregate stats: {}", err);
            ApiError::from(err)
        })?;

    Ok(Json(TotalResponse { value }))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
