use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::timeseries::TimeSeriesAggregator;

use super::handlers::{get_series, get_total, health_check, AppState};

pub fn create_api_router(aggregator: Arc<TimeSeriesAggregator>) -> Router {
    let state = Arc::new(AppState { aggregator });

    let dashboard_routes = Router::new()
        .route("/api/series", get(get_series))
        .route("/api/stats", get(get_total))
        .layer(CorsLayer::permissive())
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .merge(dashboard_routes)
}
