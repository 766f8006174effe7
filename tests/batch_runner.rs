//! Batch runner behaviour under paused tokio time.

use anime_enrich::batch::{into_values, BatchConfig, BatchRunner, BatchSummary, ResolveError};
use anime_enrich::ErrorKind;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

/// Elapsed time on the paused clock, to the millisecond.
fn whole_ms(d: Duration) -> u128 {
    d.as_millis()
}

fn config(concurrency: usize) -> BatchConfig {
    BatchConfig::new()
        .with_concurrency(concurrency)
        .with_inter_batch_delay(Duration::from_millis(1000))
        .with_retry_backoff(Duration::from_millis(2000))
}

/// Counts attempts per key.
#[derive(Default)]
struct Attempts(Mutex<HashMap<u32, u32>>);

impl Attempts {
    fn bump(&self, key: u32) -> u32 {
        let mut map = self.0.lock().unwrap();
        let n = map.entry(key).or_insert(0);
        *n += 1;
        *n
    }

    fn get(&self, key: u32) -> u32 {
        self.0.lock().unwrap().get(&key).copied().unwrap_or(0)
    }
}

#[tokio::test(start_paused = true)]
async fn test_outcomes_follow_input_order_not_completion_order() {
    let keys: Vec<u32> = (0..8).collect();
    let out = BatchRunner::new(config(4))
        .run(keys.clone(), |k| async move {
            // earlier keys finish last within each wave
            sleep(Duration::from_millis(u64::from(10 - k) * 10)).await;
            Ok::<_, ResolveError>(k * 2)
        })
        .await
        .unwrap();

    assert_eq!(out.len(), keys.len());
    let seen: Vec<u32> = out.iter().map(|o| *o.key()).collect();
    assert_eq!(seen, keys);
    assert_eq!(into_values(out), vec![0, 2, 4, 6, 8, 10, 12, 14]);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_never_exceeds_concurrency() {
    let in_flight = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);

    let out = BatchRunner::new(config(3))
        .run((0..10u32).collect(), |k| {
            let in_flight = &in_flight;
            let peak = &peak;
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_millis(50)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, ResolveError>(k)
            }
        })
        .await
        .unwrap();

    assert_eq!(out.len(), 10);
    assert_eq!(peak.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_waves_start_one_delay_apart() {
    let start = Instant::now();
    let started: Mutex<Vec<(u32, Duration)>> = Mutex::new(Vec::new());

    let out = BatchRunner::new(config(2))
        .run(vec![1, 2, 3, 4, 5, 6], |k| {
            started.lock().unwrap().push((k, start.elapsed()));
            async move { Ok::<_, ResolveError>(k) }
        })
        .await
        .unwrap();

    assert!(out.iter().all(|o| o.is_success()));
    let started = started.into_inner().unwrap();
    let at = |key: u32| {
        started
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, d)| whole_ms(*d))
            .unwrap()
    };
    assert_eq!([at(1), at(2)], [0, 0]);
    assert_eq!([at(3), at(4)], [1000, 1000]);
    assert_eq!([at(5), at(6)], [2000, 2000]);
    // trailing delay after the third wave
    assert_eq!(whole_ms(start.elapsed()), 3000);
}

#[tokio::test(start_paused = true)]
async fn test_trailing_delay_can_be_disabled() {
    let start = Instant::now();
    BatchRunner::new(config(5).with_trailing_delay(false))
        .run(vec![1, 2, 3], |k| async move { Ok::<_, ResolveError>(k) })
        .await
        .unwrap();
    assert_eq!(whole_ms(start.elapsed()), 0);

    let start = Instant::now();
    BatchRunner::new(config(5))
        .run(vec![1, 2, 3], |k| async move { Ok::<_, ResolveError>(k) })
        .await
        .unwrap();
    assert_eq!(whole_ms(start.elapsed()), 1000);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_key_recovers_within_retry_budget() {
    let attempts = Attempts::default();
    let out = BatchRunner::new(config(5).with_max_retries(2))
        .run(vec![7u32], |k| {
            let n = attempts.bump(k);
            async move {
                if n <= 2 {
                    Err(ResolveError::rate_limited("429"))
                } else {
                    Ok(k)
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(out[0].value(), Some(&7));
    assert_eq!(attempts.get(7), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_caps_attempts() {
    let attempts = Attempts::default();
    let start = Instant::now();
    let out = BatchRunner::new(config(5).with_max_retries(2).with_trailing_delay(false))
        .run(vec![7u32], |k| {
            attempts.bump(k);
            async { Err::<u32, _>(ResolveError::rate_limited("429")) }
        })
        .await
        .unwrap();

    assert_eq!(out[0].reason(), Some(ErrorKind::RateLimited));
    assert_eq!(attempts.get(7), 3);
    // two backoffs between three attempts
    assert_eq!(whole_ms(start.elapsed()), 4000);
}

#[tokio::test(start_paused = true)]
async fn test_two_keys_one_rate_limited_once() {
    let attempts = Attempts::default();
    let out = BatchRunner::new(config(5).with_max_retries(1))
        .run(vec![10u32, 20], |k| {
            let n = attempts.bump(k);
            async move {
                if k == 20 && n == 1 {
                    Err(ResolveError::rate_limited("429"))
                } else {
                    Ok(format!("anime-{k}"))
                }
            }
        })
        .await
        .unwrap();

    let summary = BatchSummary::from_outcomes(&out);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(into_values(out), vec!["anime-10".to_string(), "anime-20".to_string()]);
    assert_eq!(attempts.get(10), 1);
    assert_eq!(attempts.get(20), 2);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_key_does_not_affect_sibling() {
    let attempts = Attempts::default();
    let out = BatchRunner::new(config(5).with_max_retries(2))
        .run(vec![10u32, 20], |k| {
            attempts.bump(k);
            async move {
                if k == 10 {
                    Err(ResolveError::rate_limited("429"))
                } else {
                    Ok(k)
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(attempts.get(10), 3);
    assert_eq!(attempts.get(20), 1);
    assert_eq!(out[0].reason(), Some(ErrorKind::RateLimited));
    assert_eq!(out[1].value(), Some(&20));
    let summary = BatchSummary::from_outcomes(&out);
    assert_eq!((summary.succeeded, summary.rate_limited), (1, 1));
}

#[tokio::test(start_paused = true)]
async fn test_failures_are_kept_per_key() {
    let out = BatchRunner::new(config(2))
        .run(vec![1u32, 2, 3, 4], |k| async move {
            match k {
                2 => Err(ResolveError::not_found("no such anime")),
                4 => Err(ResolveError::detail_unavailable("missing mal_id")),
                _ => Ok(k),
            }
        })
        .await
        .unwrap();

    let summary = BatchSummary::from_outcomes(&out);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.failed, 2);
    assert!(summary.is_partial());
    assert_eq!(out[1].reason(), Some(ErrorKind::NotFound));
    assert_eq!(out[3].reason(), Some(ErrorKind::DetailUnavailable));

    let json = serde_json::to_value(&out[1]).unwrap();
    assert_eq!(json["status"], "failure");
    assert_eq!(json["reason"], "not_found");
    assert_eq!(json["key"], 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_skips_remaining_waves() {
    let token = CancellationToken::new();
    let calls = AtomicU32::new(0);

    let out = BatchRunner::new(config(2))
        .with_cancellation(token.clone())
        .run(vec![1u32, 2, 3, 4, 5, 6], |k| {
            calls.fetch_add(1, Ordering::SeqCst);
            if k == 1 {
                token.cancel();
            }
            async move { Ok::<_, ResolveError>(k) }
        })
        .await
        .unwrap();

    assert_eq!(out.len(), 6);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(out[0].is_success() && out[1].is_success());
    for outcome in &out[2..] {
        assert_eq!(outcome.reason(), Some(ErrorKind::Cancelled));
    }
    assert_eq!(BatchSummary::from_outcomes(&out).cancelled, 4);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_retry_backoff() {
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        sleep(Duration::from_secs(3)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let out = BatchRunner::new(
        config(1)
            .with_max_retries(10)
            .with_retry_backoff(Duration::from_secs(10)),
    )
    .with_cancellation(token)
    .run(vec![1u32], |_| async {
        Err::<u32, _>(ResolveError::rate_limited("429"))
    })
    .await
    .unwrap();

    assert_eq!(out[0].reason(), Some(ErrorKind::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_slow_resolver_times_out_without_retry() {
    let calls = AtomicU32::new(0);
    let out = BatchRunner::new(
        config(3)
            .with_max_retries(3)
            .with_item_timeout(Duration::from_millis(500)),
    )
    .run(vec![1u32, 2], |k| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if k == 2 {
                sleep(Duration::from_secs(5)).await;
            }
            Ok::<_, ResolveError>(k)
        }
    })
    .await
    .unwrap();

    assert!(out[0].is_success());
    assert_eq!(out[1].reason(), Some(ErrorKind::Timeout));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
