//! Scripted stats source for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::{StatsError, StatsResult, StatsSource};
use crate::query::{DateRangeParam, Query};

/// Answers by the start of the query's date range.
///
/// Unscripted ranges answer with an empty result set.
#[derive(Default)]
pub struct ScriptedSource {
    answers: HashMap<String, StatsResult<Value>>,
    /// Queries filtering on this event name sleep before answering
    slow_event: Option<(String, Duration)>,
    /// Remaining failures to inject before answering normally
    flaky_failures: Mutex<usize>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(mut self, range_start: &str, value: u64) -> Self {
        self.answers.insert(
            range_start.to_string(),
            Ok(json!({"results": [{"metrics": [value], "dimensions": []}]})),
        );
        self
    }

    pub fn fail(mut self, range_start: &str, status: u16) -> Self {
        self.answers.insert(
            range_start.to_string(),
            Err(StatsError::Upstream {
                status,
                body: format!("scripted failure {status}"),
            }),
        );
        self
    }

    pub fn slow(mut self, event_name: &str, delay: Duration) -> Self {
        self.slow_event = Some((event_name.to_string(), delay));
        self
    }

    pub fn flaky(self, failures: usize) -> Self {
        *self.flaky_failures.lock().unwrap() = failures;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn range_start(query: &Query) -> &str {
    match &query.date_range {
        DateRangeParam::Period(period) => period,
        DateRangeParam::Custom(start, _) => start,
    }
}

#[async_trait]
impl StatsSource for ScriptedSource {
    async fn fetch_stats(&self, query: &Query) -> StatsResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some((event, delay)) = &self.slow_event {
            let filters = serde_json::to_string(&query.filters).unwrap();
            if filters.contains(event.as_str()) {
                tokio::time::sleep(*delay).await;
            }
        }

        {
            let mut remaining = self.flaky_failures.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StatsError::Network("connection reset".to_string()));
            }
        }

        self.answers
            .get(range_start(query))
            .cloned()
            .unwrap_or_else(|| Ok(json!({"results": []})))
    }
}
