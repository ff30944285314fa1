use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bridge_stats::api;
use bridge_stats::config::Config;
use bridge_stats::proxy::{self, ProxyState, PROXY_PATH};
use bridge_stats::stats::{StatsClient, StatsSource};
use bridge_stats::timeseries::{QueryCache, TimeSeriesAggregator};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    if config.plausible.site_id.is_empty() {
        warn!("PLAUSIBLE_SITE_ID is not set; dashboard queries will target an empty site id");
    }

    // Proxy relays browser queries with the server-held key
    let proxy_state = Arc::new(ProxyState::from_config(&config.plausible)?);

    // Dashboard endpoints query upstream directly through the cache
    let source: Arc<dyn StatsSource> = Arc::new(StatsClient::new(
        config.plausible.upstream_url.clone(),
        config.plausible.api_key.clone(),
        config.plausible.timeout_secs.map(Duration::from_secs),
    )?);
    let cache = Arc::new(QueryCache::new(source, &config.cache));
    let aggregator = Arc::new(TimeSeriesAggregator::new(
        config.plausible.site_id.clone(),
        cache,
    ));
    info!(
        "Query cache: ttl {}s, max {} entries, {} retries",
        config.cache.ttl_secs, config.cache.max_entries, config.cache.retries
    );

    let app = api::create_api_router(aggregator).merge(proxy::create_proxy_router(proxy_state));

    let addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Server listening on http://{}", addr);
    info!("   - Plausible proxy at http://{}{}", addr, PROXY_PATH);
    info!("   - Dashboard data at http://{}/api/series and /api/stats", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
