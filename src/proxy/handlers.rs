use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use super::error::ProxyError;
use crate::config::PlausibleConfig;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

pub struct ProxyState {
    /// Credential injected into every forwarded request
    pub api_key: Option<String>,
    pub upstream_url: String,
    pub client: Client,
}

impl ProxyState {
    pub fn from_config(config: &PlausibleConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder().user_agent("bridge-stats-proxy/0.1.0");
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .context("failed to build HTTP client for the Plausible proxy")?;

        Ok(Self {
            api_key: config.api_key.clone(),
            upstream_url: config.upstream_url.clone(),
            client,
        })
    }
}

/// Single-hop relay to the stats provider
pub async fn relay(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    body: Bytes,
) -> Response {
    let mut response = if method == Method::OPTIONS {
        preflight()
    } else {
        match forward(&state, &method, body).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    };

    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    response
}

fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
        ],
    )
        .into_response()
}

async fn forward(state: &ProxyState, method: &Method, body: Bytes) -> Result<Response, ProxyError> {
    if *method != Method::POST {
        return Err(ProxyError::MethodNotAllowed);
    }

    let Some(api_key) = state.api_key.as_deref() else {
        error!("Plausible API key not found in configuration");
        return Err(ProxyError::Configuration);
    };

    let is_object = serde_json::from_slice::<Value>(&body)
        .map(|payload| payload.is_object())
        .unwrap_or(false);
    if !is_object {
        return Err(ProxyError::Validation);
    }

    debug!(bytes = body.len(), "forwarding stats query");

    let upstream = state
        .client
        .post(&state.upstream_url)
        .bearer_auth(api_key)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| {
            error!(error = %e, "failed to reach Plausible");
            ProxyError::Network(e.to_string())
        })?;

    let status = upstream.status();
    info!(status = status.as_u16(), "Plausible API response");

    if !status.is_success() {
        let body = upstream.text().await.unwrap_or_default();
        error!(status = status.as_u16(), body = %body, "Plausible API error");
        return Err(ProxyError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    let data: Value = upstream.json().await.map_err(|e| {
        error!(error = %e, "failed to decode Plausible response");
        ProxyError::Network(e.to_string())
    })?;

    Ok((StatusCode::OK, Json(data)).into_response())
}
