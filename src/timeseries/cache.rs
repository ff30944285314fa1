//! Keyed query cache with a freshness window
//!
//! Entries are keyed by the full `Query` (site, date range, filters). A hit
//! inside the TTL never touches the network. Concurrent misses on the same
//! key share a single upstream call, and failures are never cached.

use moka::future::Cache;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::CacheConfig;
use crate::query::Query;
use crate::stats::{StatsError, StatsResult, StatsSource};

pub struct QueryCache {
    source: Arc<dyn StatsSource>,
    entries: Cache<Query, Arc<Value>>,
    /// Extra attempts after a failed fetch
    retries: u32,
}

impl QueryCache {
    pub fn new(source: Arc<dyn StatsSource>, config: &CacheConfig) -> Self {
        Self::with_ttl(
            source,
            Duration::from_secs(config.ttl_secs),
            config.max_entries,
            config.retries,
        )
    }

    pub fn with_ttl(
        source: Arc<dyn StatsSource>,
        ttl: Duration,
        max_entries: u64,
        retries: u32,
    ) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self {
            source,
            entries,
            retries,
        }
    }

    /// Fresh cached response, or a fetch (with retries) on miss
    pub async fn fetch(&self, query: &Query) -> Result<Arc<Value>, Arc<StatsError>> {
        if let Some(hit) = self.entries.get(query).await {
            debug!(date_range = ?query.date_range, "query cache hit");
            return Ok(hit);
        }

        self.entries
            .try_get_with(query.clone(), self.fetch_with_retry(query))
            .await
    }

    pub async fn invalidate(&self, query: &Query) {
        self.entries.invalidate(query).await;
    }

    async fn fetch_with_retry(&self, query: &Query) -> StatsResult<Arc<Value>> {
        let mut attempt = 0;
        loop {
            match self.source.fetch_stats(query).await {
                Ok(value) => return Ok(Arc::new(value)),
                Err(err) if attempt < self.retries => {
                    attempt += 1;
                    debug!(attempt, error = %err, "retrying stats query");
                }
                Err(err) => return Err(err),
            }
        }
    }
}
