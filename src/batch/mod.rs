//! Bounded-concurrency batch enrichment.
//!
//! List screens hand this module a page of keys and a resolver that looks up
//! the detail record for one key. The runner fans the keys out in fixed-size
//! waves, retries rate-limited lookups, and returns exactly one outcome per
//! key in input order.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`BatchRunner`] | Executes resolvers in waves with optional cancellation |
//! | [`run_batched`] | One-shot convenience wrapper around [`BatchRunner`] |
//! | [`BatchConfig`] | Wave size, delays, retry budget, per-item timeout |
//! | [`ResolveOutcome`] | `Success` or `Failure` for one key |
//! | [`ResolveError`] | Classified resolver failure |
//! | [`BatchSummary`] | Counts used to choose full, partial or empty rendering |
//!
//! ## Example
//!
//! ```rust
//! use anime_enrich::batch::{run_batched, BatchConfig, ResolveError};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anime_enrich::Result<()> {
//! let config = BatchConfig::new()
//!     .with_concurrency(2)
//!     .with_inter_batch_delay(Duration::ZERO);
//!
//! let outcomes = run_batched(
//!     vec![1u32, 2, 3],
//!     |id| async move { Ok::<_, ResolveError>(format!("item-{id}")) },
//!     &config,
//! )
//! .await?;
//!
//! assert_eq!(outcomes.len(), 3);
//! assert_eq!(outcomes[2].value().map(String::as_str), Some("item-3"));
//! # Ok(())
//! # }
//! ```

mod config;
mod outcome;
mod runner;

pub use config::BatchConfig;
pub use outcome::{into_values, BatchSummary, ResolveError, ResolveOutcome};
pub use runner::{run_batched, BatchRunner};
