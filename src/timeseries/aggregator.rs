//! Per-day fan-out and aggregation
//!
//! A date range is split into UTC day buckets, one query per day is issued
//! concurrently, and the settled results are stitched back into a series in
//! calendar order. A failed or empty day contributes 0; the first failure
//! (in day order) is surfaced through the aggregate error flag.
//!
//! Views identify a consumer's current selection. Each `select` stamps the
//! view with a fresh generation, and a fetch set only commits its result if
//! no newer selection arrived while it was in flight. Superseded requests
//! are not cancelled; their results are dropped on arrival.
//!
//! View slots live in a bounded cache: idle views expire and the number of
//! retained views is capped.

use futures::future::join_all;
use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::cache::QueryCache;
use super::days::{DateRange, DayBucket};
use super::models::{AggregateState, ErrorInfo, TimeSeriesPoint};
use crate::query::{DateRangeParam, EventFilter, Query};
use crate::stats::{extract_metric_value, StatsError};

/// Views kept at most, across all consumers
pub const DEFAULT_MAX_VIEWS: u64 = 1_000;
/// A view untouched for this long is dropped
pub const DEFAULT_VIEW_IDLE: Duration = Duration::from_secs(30 * 60);

#[derive(Clone)]
struct ViewSlot {
    generation: u64,
    state: AggregateState,
}

pub struct TimeSeriesAggregator {
    site_id: String,
    cache: Arc<QueryCache>,
    views: Cache<String, ViewSlot>,
    next_generation: AtomicU64,
}

fn view_cache(max_views: u64, idle: Duration) -> Cache<String, ViewSlot> {
    Cache::builder()
        .max_capacity(max_views)
        .time_to_idle(idle)
        .build()
}

impl TimeSeriesAggregator {
    pub fn new(site_id: impl Into<String>, cache: Arc<QueryCache>) -> Self {
        Self {
            site_id: site_id.into(),
            cache,
            views: view_cache(DEFAULT_MAX_VIEWS, DEFAULT_VIEW_IDLE),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Replace the view bounds; existing views are dropped
    pub fn with_view_limits(mut self, max_views: u64, idle: Duration) -> Self {
        self.views = view_cache(max_views, idle);
        self
    }

    /// Fetch one value per day of `range` and settle them into a series
    pub async fn fetch_series(
        &self,
        range: &DateRange,
        filter: Option<&EventFilter>,
    ) -> AggregateState {
        let buckets: Vec<DayBucket> = range.days().into_iter().map(DayBucket::for_day).collect();
        let queries: Vec<Query> = buckets
            .iter()
            .map(|bucket| Query::events(&self.site_id, bucket.date_range(), filter))
            .collect();

        debug!(days = queries.len(), "issuing per-day stats queries");

        let results = join_all(queries.iter().map(|query| self.cache.fetch(query))).await;

        assemble(&buckets, results)
    }

    /// Single aggregate value for a whole range or period
    pub async fn fetch_total(
        &self,
        date_range: DateRangeParam,
        filter: Option<&EventFilter>,
    ) -> Result<Option<f64>, StatsError> {
        let query = Query::events(&self.site_id, date_range, filter);
        self.cache
            .fetch(&query)
            .await
            .map(|response| extract_metric_value(Some(&response)))
            .map_err(|err| (*err).clone())
    }

    /// Replace the selection of `view` and fetch it.
    ///
    /// Returns `None` when a newer selection for the same view was made
    /// before this one settled; the stale result is discarded.
    pub async fn select(
        &self,
        view: &str,
        range: &DateRange,
        filter: Option<&EventFilter>,
    ) -> Option<AggregateState> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.views.insert(
            view.to_string(),
            ViewSlot {
                generation,
                state: AggregateState::loading(),
            },
        );

        let state = self.fetch_series(range, filter).await;

        // A slot evicted mid-flight has no newer selection, so it is recreated
        let outcome = self
            .views
            .entry_by_ref(view)
            .and_compute_with(|current| match current {
                Some(slot) if slot.value().generation != generation => Op::Nop,
                _ => Op::Put(ViewSlot {
                    generation,
                    state: state.clone(),
                }),
            });

        if let CompResult::Unchanged(_) = outcome {
            warn!(view, generation, "discarding superseded selection");
            return None;
        }
        Some(state)
    }

    /// Latest snapshot for `view`
    pub fn state(&self, view: &str) -> Option<AggregateState> {
        self.views.get(view).map(|slot| slot.state)
    }
}

fn assemble(
    buckets: &[DayBucket],
    results: Vec<Result<Arc<Value>, Arc<StatsError>>>,
) -> AggregateState {
    let mut error: Option<ErrorInfo> = None;

    let data = buckets
        .iter()
        .zip(results)
        .map(|(bucket, result)| {
            let value = match result {
                Ok(response) => extract_metric_value(Some(&response)),
                Err(err) => {
                    warn!(day = %bucket.date, error = %err, "day query failed; using 0");
                    error.get_or_insert_with(|| ErrorInfo::from(&*err));
                    None
                }
            };
            TimeSeriesPoint::new(bucket.label(), value.unwrap_or(0.0))
        })
        .collect();

    AggregateState {
        is_loading: false,
        is_error: error.is_some(),
        error,
        data: Some(data),
    }
}
