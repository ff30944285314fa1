use axum::{routing::any, Router};
use std::sync::Arc;

use super::handlers::{relay, ProxyState};

pub const PROXY_PATH: &str = "/api/plausible";

pub fn create_proxy_router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route(PROXY_PATH, any(relay))
        .with_state(state)
}
