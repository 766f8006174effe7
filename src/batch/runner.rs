//! Wave-based batch runner.

use super::config::BatchConfig;
use super::outcome::{BatchSummary, ResolveError, ResolveOutcome};
use crate::error_kind::ErrorKind;
use crate::Result;
use futures::future::join_all;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs a resolver over every key in fixed-size waves.
///
/// A wave holds at most `concurrency` keys and is awaited as a whole before
/// the next one starts, with `inter_batch_delay` in between. A key whose
/// attempt fails with a retryable error is retried on its own after
/// `retry_backoff`, inside its wave slot, so the in-flight bound holds.
pub struct BatchRunner {
    config: BatchConfig,
    cancel: Option<CancellationToken>,
}

impl BatchRunner {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Stop starting new waves and retries once `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Resolve every key and return one outcome per key, in input order.
    ///
    /// Fails only when the configuration is invalid, before any resolver call.
    pub async fn run<K, V, F, Fut>(
        &self,
        items: Vec<K>,
        resolve: F,
    ) -> Result<Vec<ResolveOutcome<K, V>>>
    where
        K: Clone + fmt::Debug,
        F: Fn(K) -> Fut,
        Fut: Future<Output = std::result::Result<V, ResolveError>>,
    {
        self.config.validate()?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let total = items.len();
        let wave_size = self.config.concurrency;
        let wave_count = total.div_ceil(wave_size);
        let mut outcomes = Vec::with_capacity(total);

        for (wave_index, wave) in items.chunks(wave_size).enumerate() {
            if self.is_cancelled() {
                debug!(wave = wave_index, keys = wave.len(), "run cancelled, skipping wave");
                outcomes.extend(wave.iter().cloned().map(cancelled));
                continue;
            }

            debug!(wave = wave_index, of = wave_count, keys = wave.len(), "starting wave");
            let settled = join_all(wave.iter().cloned().map(|key| self.resolve_one(key, &resolve))).await;
            outcomes.extend(settled);

            let is_last = wave_index + 1 == wave_count;
            if !is_last || self.config.trailing_delay {
                self.pause(self.config.inter_batch_delay).await;
            }
        }

        let summary = BatchSummary::from_outcomes(&outcomes);
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            rate_limited = summary.rate_limited,
            success_rate = summary.success_rate(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch run complete"
        );
        Ok(outcomes)
    }

    async fn resolve_one<K, V, F, Fut>(&self, key: K, resolve: &F) -> ResolveOutcome<K, V>
    where
        K: Clone + fmt::Debug,
        F: Fn(K) -> Fut,
        Fut: Future<Output = std::result::Result<V, ResolveError>>,
    {
        let mut retries_left = self.config.max_retries;
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match self.attempt(key.clone(), resolve).await {
                Ok(value) => return ResolveOutcome::Success { key, value },
                Err(e) => e,
            };

            if !err.should_retry() || retries_left == 0 {
                warn!(key = ?key, attempt, kind = %err.kind, error = %err.message, "item failed");
                return ResolveOutcome::Failure {
                    key,
                    reason: err.kind,
                    message: err.message,
                };
            }
            if self.is_cancelled() {
                return cancelled(key);
            }

            retries_left -= 1;
            debug!(key = ?key, attempt, retries_left, kind = %err.kind, "retry scheduled");
            if !self.pause(self.config.retry_backoff).await {
                return cancelled(key);
            }
        }
    }

    async fn attempt<K, V, F, Fut>(&self, key: K, resolve: &F) -> std::result::Result<V, ResolveError>
    where
        F: Fn(K) -> Fut,
        Fut: Future<Output = std::result::Result<V, ResolveError>>,
    {
        match self.config.item_timeout {
            Some(limit) => match tokio::time::timeout(limit, resolve(key)).await {
                Ok(result) => result,
                Err(_) => Err(ResolveError::new(
                    ErrorKind::Timeout,
                    format!("no result within {}ms", limit.as_millis()),
                )),
            },
            None => resolve(key).await,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Sleep for `d`; returns false if cancelled first.
    async fn pause(&self, d: Duration) -> bool {
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => false,
                    _ = tokio::time::sleep(d) => true,
                }
            }
            None => {
                tokio::time::sleep(d).await;
                true
            }
        }
    }
}

fn cancelled<K, V>(key: K) -> ResolveOutcome<K, V> {
    ResolveOutcome::Failure {
        key,
        reason: ErrorKind::Cancelled,
        message: "batch run cancelled".to_string(),
    }
}

/// Run `resolve` over `items` with `config`. See [`BatchRunner::run`].
pub async fn run_batched<K, V, F, Fut>(
    items: Vec<K>,
    resolve: F,
    config: &BatchConfig,
) -> Result<Vec<ResolveOutcome<K, V>>>
where
    K: Clone + fmt::Debug,
    F: Fn(K) -> Fut,
    Fut: Future<Output = std::result::Result<V, ResolveError>>,
{
    BatchRunner::new(config.clone()).run(items, resolve).await
}
