//! Application configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file named by
//! `ANIME_ENRICH_CONFIG`, then individual environment overrides:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `ANIME_CATALOG_URL` | `catalog_base_url` |
//! | `ANIME_BACKEND_URL` | `backend_base_url` |
//! | `ANIME_USER_SERVICE_URL` | `user_service_url` |
//! | `ANIME_HTTP_TIMEOUT_SECS` | `http_timeout_secs` |
//! | `ANIME_BATCH_CONCURRENCY` | `batch.concurrency` |
//! | `ANIME_BATCH_DELAY_MS` | `batch.inter_batch_delay` |
//! | `ANIME_BATCH_MAX_RETRIES` | `batch.max_retries` |

use crate::batch::BatchConfig;
use crate::error::ErrorContext;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_CATALOG_URL: &str = "https://api.jikan.moe/v4";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:1000/api/v2/hianime";
pub const DEFAULT_USER_SERVICE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog_base_url: String,
    pub backend_base_url: String,
    pub user_service_url: String,
    pub http_timeout_secs: u64,
    /// Entries kept by the detail cache; 0 disables caching.
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    pub batch: BatchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: DEFAULT_CATALOG_URL.to_string(),
            backend_base_url: DEFAULT_BACKEND_URL.to_string(),
            user_service_url: DEFAULT_USER_SERVICE_URL.to_string(),
            http_timeout_secs: 30,
            cache_capacity: 256,
            cache_ttl_secs: 600,
            batch: BatchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `ANIME_ENRICH_CONFIG`, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("ANIME_ENRICH_CONFIG") {
            Ok(path) => Self::from_yaml_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ANIME_CATALOG_URL") {
            self.catalog_base_url = v;
        }
        if let Some(v) = lookup("ANIME_BACKEND_URL") {
            self.backend_base_url = v;
        }
        if let Some(v) = lookup("ANIME_USER_SERVICE_URL") {
            self.user_service_url = v;
        }
        if let Some(v) = lookup("ANIME_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = parse_var("ANIME_HTTP_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("ANIME_BATCH_CONCURRENCY") {
            self.batch.concurrency = parse_var("ANIME_BATCH_CONCURRENCY", &v)?;
        }
        if let Some(v) = lookup("ANIME_BATCH_DELAY_MS") {
            self.batch.inter_batch_delay =
                Duration::from_millis(parse_var("ANIME_BATCH_DELAY_MS", &v)?);
        }
        if let Some(v) = lookup("ANIME_BATCH_MAX_RETRIES") {
            self.batch.max_retries = parse_var("ANIME_BATCH_MAX_RETRIES", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.catalog_url()?;
        self.backend_url()?;
        self.user_service_url()?;
        if self.http_timeout_secs == 0 {
            return Err(Error::invalid_config(
                "HTTP timeout must be positive",
                ErrorContext::new().with_field_path("http_timeout_secs"),
            ));
        }
        self.batch.validate()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn catalog_url(&self) -> Result<Url> {
        parse_base_url("catalog_base_url", &self.catalog_base_url)
    }

    pub fn backend_url(&self) -> Result<Url> {
        parse_base_url("backend_base_url", &self.backend_base_url)
    }

    pub fn user_service_url(&self) -> Result<Url> {
        parse_base_url("user_service_url", &self.user_service_url)
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        Error::invalid_config(
            format!("cannot parse {name}"),
            ErrorContext::new()
                .with_field_path(name)
                .with_details(format!("{value:?}: {e}"))
                .with_source("environment"),
        )
    })
}

/// Parse a base URL and make sure it ends in `/` so relative joins keep the path.
pub(crate) fn parse_base_url(field: &str, raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|e| {
        Error::invalid_config(
            format!("invalid URL in {field}"),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(format!("{raw:?}: {e}")),
        )
    })
}
