use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::query::Query;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StatsError {
    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl StatsError {
    /// HTTP status reported by upstream, if the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            StatsError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type StatsResult<T> = Result<T, StatsError>;

/// Anything that can execute a single stats query
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Execute one query and return the parsed response body unchanged
    async fn fetch_stats(&self, query: &Query) -> StatsResult<Value>;
}

/// HTTP stats client.
///
/// Points either at the proxy (no credential) or directly at the provider,
/// in which case it attaches the API key as a bearer token.
#[derive(Clone)]
pub struct StatsClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl StatsClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = Client::builder().user_agent("bridge-stats/0.1.0");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .context("failed to build HTTP client for stats queries")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl StatsSource for StatsClient {
    async fn fetch_stats(&self, query: &Query) -> StatsResult<Value> {
        let mut request = self.client.post(&self.endpoint).json(query);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StatsError::Network(e.to_string()))?;

        let status = response.status();
        debug!(endpoint = %self.endpoint, status = status.as_u16(), "stats query answered");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StatsError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StatsError::Network(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| StatsError::Decode(e.to_string()))
    }
}
