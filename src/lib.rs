//! # anime-enrich
//!
//! Client runtime for the anime companion app: fetches anime and character
//! lists from the public catalog API (Jikan v4) and the companion backend,
//! then enriches list items with detail lookups under a bounded, rate-limit
//! aware batch runner.
//!
//! ## Overview
//!
//! Screens in the app never talk to HTTP directly. Each one owns a view model
//! from [`views`] that pulls a page from a list source, fans the page out
//! through [`batch::BatchRunner`], drops items that could not be resolved and
//! exposes the result together with loading and pagination state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anime_enrich::backend::BackendClient;
//! use anime_enrich::catalog::CatalogClient;
//! use anime_enrich::config::AppConfig;
//! use anime_enrich::views::LastWatchView;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anime_enrich::Result<()> {
//!     let config = AppConfig::load()?;
//!     let catalog = Arc::new(CatalogClient::new(&config)?);
//!     let backend = Arc::new(BackendClient::new(&config)?);
//!
//!     let mut view = LastWatchView::new(backend, catalog, Some("user-42".into()));
//!     view.load().await;
//!     for record in view.items() {
//!         println!("{} {}", record.mal_id, record.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`batch`] | Wave-based batch runner with retry and cancellation |
//! | [`error_kind`] | Failure classification shared across the crate |
//! | [`catalog`] | Jikan catalog client and validated response models |
//! | [`backend`] | Companion backend client (A-Z list, anime info, watch history) |
//! | [`cache`] | Pluggable response cache |
//! | [`views`] | Per-screen view models |
//! | [`config`] | Configuration from defaults, YAML and environment |
//! | [`logging`] | tracing subscriber setup |

pub mod backend;
pub mod batch;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error_kind;
pub mod logging;
pub mod transport;
pub mod views;

pub use batch::{run_batched, BatchConfig, BatchRunner, BatchSummary, ResolveError, ResolveOutcome};
pub use error_kind::ErrorKind;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
