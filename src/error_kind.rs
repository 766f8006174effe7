//! Failure classification shared by the batch runner and the API clients.
//!
//! Every per-item failure is reduced to one [`ErrorKind`]. The kind decides
//! whether the batch runner may retry the item, and is what ends up in a
//! `Failure` outcome.
//!
//! | Kind | Retryable | Typical source |
//! |------|-----------|----------------|
//! | `RateLimited` | yes | HTTP 429 from the catalog API |
//! | `NotFound` | no | HTTP 404 |
//! | `DetailUnavailable` | no | payload missing a required field |
//! | `Network` | only when marked | connection errors, 5xx |
//! | `Timeout` | no | per-item timeout expired, HTTP 408/504 |
//! | `Cancelled` | no | run cancelled before the item settled |
//! | `Unknown` | no | anything else |
//!
//! ## Example
//!
//! ```rust
//! use anime_enrich::error_kind::ErrorKind;
//!
//! let kind = ErrorKind::from_http_status(429);
//! assert_eq!(kind, ErrorKind::RateLimited);
//! assert!(kind.retryable());
//! assert_eq!(kind.name(), "rate_limited");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Upstream asked us to slow down
    RateLimited,
    /// The requested record does not exist
    NotFound,
    /// The record exists but lacks the fields we need
    DetailUnavailable,
    /// Connection-level failure or upstream server error
    Network,
    /// The attempt did not finish in time
    Timeout,
    /// The run was cancelled before this item settled
    Cancelled,
    Unknown,
}

impl ErrorKind {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::DetailUnavailable => "detail_unavailable",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this kind is retried without the resolver asking for it.
    ///
    /// Only rate limiting qualifies. `Network` failures are retried when the
    /// resolver marks the error retryable explicitly.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Maps an HTTP status code to the most likely kind.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            408 | 504 => Self::Timeout,
            429 => Self::RateLimited,
            500..=599 => Self::Network,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
