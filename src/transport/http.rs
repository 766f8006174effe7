use crate::error_kind::ErrorKind;
use crate::Result;
use reqwest::Proxy;
use serde::de::DeserializeOwned;
use std::env;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Longest slice of an error body kept in `Error::Remote`.
const MAX_ERROR_BODY: usize = 256;

/// Thin JSON-over-HTTP GET transport.
///
/// Non-2xx responses are turned into `Error::Remote` with the status already
/// classified, so resolvers can hand them to the batch runner unchanged.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

/// Proxy for every scheme, or `None` when unset or unusable.
fn proxy_from(value: Option<String>) -> Option<Proxy> {
    let proxy_url = value?;
    match Proxy::all(&proxy_url) {
        Ok(proxy) => Some(proxy),
        Err(e) => {
            warn!(proxy = %proxy_url, error = %e, "ignoring invalid ANIME_PROXY_URL");
            None
        }
    }
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(
                env::var("ANIME_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(16),
            )
            .user_agent(concat!("anime-enrich/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = proxy_from(env::var("ANIME_PROXY_URL").ok()) {
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client })
    }

    /// Build with the timeout from `ANIME_HTTP_TIMEOUT_SECS` (default 30s).
    pub fn from_env() -> Result<Self> {
        let timeout_secs = env::var("ANIME_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);
        Self::new(Duration::from_secs(timeout_secs))
    }

    /// GET `url` and decode the JSON body as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| crate::Error::Transport(TransportError::Http(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(crate::Error::Remote {
                status: status.as_u16(),
                kind: ErrorKind::from_http_status(status.as_u16()),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| crate::Error::Transport(TransportError::Http(e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Join `path` onto `base` and append `query` pairs.
///
/// `base` must end with `/` (see `AppConfig`), and `path` must be relative.
pub fn endpoint_url(base: &Url, path: &str, query: &[(&str, String)]) -> Result<Url> {
    let mut url = base.join(path).map_err(|e| {
        crate::Error::runtime(
            format!("cannot build endpoint URL for {path:?}"),
            crate::ErrorContext::new()
                .with_details(e.to_string())
                .with_source(base.as_str()),
        )
    })?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in query {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Http(e) if e.is_timeout())
    }
}
