use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_UPSTREAM_URL: &str = "https://plausible.io/api/v2/query";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_server: ServerConfig,
    pub plausible: PlausibleConfig,
    pub cache: CacheConfig,
    /// Where clients send queries when they do not talk to upstream directly
    pub proxy_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlausibleConfig {
    /// Server-held credential. Absence is reported per request, not at startup.
    #[serde(default)]
    pub api_key: Option<String>,
    pub site_id: String,
    pub upstream_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "CacheConfig::default_max_entries")]
    pub max_entries: u64,
    #[serde(default = "CacheConfig::default_retries")]
    pub retries: u32,
}

impl CacheConfig {
    const fn default_ttl_secs() -> u64 {
        300
    }

    const fn default_max_entries() -> u64 {
        10_000
    }

    const fn default_retries() -> u32 {
        2
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: Self::default_ttl_secs(),
            max_entries: Self::default_max_entries(),
            retries: Self::default_retries(),
        }
    }
}

/// First non-empty value among the given environment variables.
fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{name} has an invalid value '{raw}'")),
        Err(_) => Ok(None),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = env_parse::<u16>("API_PORT")?.unwrap_or(8080);

        let api_key = env_any(&["PLAUSIBLE_API_KEY", "VITE_PLAUSIBLE_API_KEY"]);
        if api_key.is_none() {
            tracing::warn!(
                "PLAUSIBLE_API_KEY is not set; proxied queries will fail with a configuration error"
            );
        }

        let site_id = env_any(&["PLAUSIBLE_SITE_ID", "VITE_PLAUSIBLE_SITE_ID"]).unwrap_or_default();
        let upstream_url = std::env::var("PLAUSIBLE_UPSTREAM_URL")
            .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string());
        let timeout_secs = env_parse::<u64>("PLAUSIBLE_TIMEOUT_SECS")?;

        let proxy_url = std::env::var("PROXY_URL")
            .unwrap_or_else(|_| format!("http://{api_host}:{api_port}/api/plausible"));

        let cache = CacheConfig {
            ttl_secs: env_parse("CACHE_TTL_SECS")?.unwrap_or_else(CacheConfig::default_ttl_secs),
            max_entries: env_parse("CACHE_MAX_ENTRIES")?
                .unwrap_or_else(CacheConfig::default_max_entries),
            retries: env_parse("QUERY_RETRIES")?.unwrap_or_else(CacheConfig::default_retries),
        };

        Ok(Config {
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            plausible: PlausibleConfig {
                api_key,
                site_id,
                upstream_url,
                timeout_secs,
            },
            cache,
            proxy_url,
        })
    }
}
