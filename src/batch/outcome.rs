//! Per-item outcomes and resolver errors.

use crate::error_kind::ErrorKind;
use serde::Serialize;

/// Error returned by a resolver for one key.
///
/// The runner retries it when the kind is retryable on its own
/// (`RateLimited`) or when the resolver marked it with [`retryable`](Self::retryable).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ResolveError {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ResolveError {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            retryable: false,
        }
    }
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn detail_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::DetailUnavailable, msg)
    }
    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, msg)
    }

    /// Mark this error as safe to retry regardless of its kind.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    pub fn should_retry(&self) -> bool {
        self.retryable || self.kind.retryable()
    }
}

impl From<crate::Error> for ResolveError {
    fn from(e: crate::Error) -> Self {
        Self::new(e.kind(), e.to_string())
    }
}

/// Terminal result for one input key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolveOutcome<K, V> {
    Success {
        key: K,
        value: V,
    },
    Failure {
        key: K,
        reason: ErrorKind,
        message: String,
    },
}

impl<K, V> ResolveOutcome<K, V> {
    pub fn key(&self) -> &K {
        match self {
            ResolveOutcome::Success { key, .. } | ResolveOutcome::Failure { key, .. } => key,
        }
    }
    pub fn is_success(&self) -> bool {
        matches!(self, ResolveOutcome::Success { .. })
    }
    pub fn value(&self) -> Option<&V> {
        match self {
            ResolveOutcome::Success { value, .. } => Some(value),
            ResolveOutcome::Failure { .. } => None,
        }
    }
    pub fn reason(&self) -> Option<ErrorKind> {
        match self {
            ResolveOutcome::Success { .. } => None,
            ResolveOutcome::Failure { reason, .. } => Some(*reason),
        }
    }
    pub fn into_value(self) -> Option<V> {
        match self {
            ResolveOutcome::Success { value, .. } => Some(value),
            ResolveOutcome::Failure { .. } => None,
        }
    }
}

/// Success values in input order; failures are dropped.
pub fn into_values<K, V>(outcomes: Vec<ResolveOutcome<K, V>>) -> Vec<V> {
    outcomes
        .into_iter()
        .filter_map(ResolveOutcome::into_value)
        .collect()
}

/// Counts over a finished run, used to pick between full, partial and empty rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rate_limited: usize,
    pub cancelled: usize,
}

impl BatchSummary {
    pub fn from_outcomes<K, V>(outcomes: &[ResolveOutcome<K, V>]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.reason() {
                None => summary.succeeded += 1,
                Some(reason) => {
                    summary.failed += 1;
                    match reason {
                        ErrorKind::RateLimited => summary.rate_limited += 1,
                        ErrorKind::Cancelled => summary.cancelled += 1,
                        _ => {}
                    }
                }
            }
        }
        summary
    }

    /// Some but not all items failed.
    pub fn is_partial(&self) -> bool {
        self.failed > 0 && self.succeeded > 0
    }

    pub fn is_total_failure(&self) -> bool {
        self.total > 0 && self.succeeded == 0
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total as f64
        }
    }
}
