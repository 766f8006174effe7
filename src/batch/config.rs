//! Batch run configuration.

use crate::error::ErrorContext;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for one batch run. Immutable for the duration of the run.
///
/// Durations are written in milliseconds when (de)serialized, so a YAML
/// config reads `inter_batch_delay_ms: 1000`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum resolver calls in flight; also the wave size.
    pub concurrency: usize,
    /// Pause between waves.
    #[serde(rename = "inter_batch_delay_ms", with = "duration_ms")]
    pub inter_batch_delay: Duration,
    /// Extra attempts allowed for a retryable failure.
    pub max_retries: u32,
    /// Fixed pause before each retry of a single item.
    #[serde(rename = "retry_backoff_ms", with = "duration_ms")]
    pub retry_backoff: Duration,
    /// Upper bound on one resolver attempt.
    #[serde(rename = "item_timeout_ms", with = "opt_duration_ms")]
    pub item_timeout: Option<Duration>,
    /// Also wait `inter_batch_delay` after the final wave.
    pub trailing_delay: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            inter_batch_delay: Duration::from_millis(1000),
            max_retries: 0,
            retry_backoff: Duration::from_millis(2000),
            item_timeout: None,
            trailing_delay: true,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }
    pub fn with_inter_batch_delay(mut self, d: Duration) -> Self {
        self.inter_batch_delay = d;
        self
    }
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }
    pub fn with_retry_backoff(mut self, d: Duration) -> Self {
        self.retry_backoff = d;
        self
    }
    pub fn with_item_timeout(mut self, d: Duration) -> Self {
        self.item_timeout = Some(d);
        self
    }
    pub fn with_trailing_delay(mut self, enabled: bool) -> Self {
        self.trailing_delay = enabled;
        self
    }

    /// Reject settings the runner cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency < 1 {
            return Err(Error::invalid_config(
                "concurrency must be at least 1",
                ErrorContext::new()
                    .with_field_path("batch.concurrency")
                    .with_details(format!("got {}", self.concurrency)),
            ));
        }
        if self.item_timeout == Some(Duration::ZERO) {
            return Err(Error::invalid_config(
                "item timeout must be positive",
                ErrorContext::new().with_field_path("batch.item_timeout_ms"),
            ));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

mod opt_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
