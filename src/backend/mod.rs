//! Companion backend: streaming catalogue listings and the user service.
//!
//! Listings are keyed by the backend's own slugs. The app needs MAL ids to
//! talk to the public catalog, so every listed item is enriched through
//! [`AnimeDirectory::anime_mal_id`].

mod client;
mod types;

pub use client::BackendClient;
pub use types::{AnimeSummary, EpisodeCounts, ListPage};

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AnimeDirectory: Send + Sync {
    async fn azlist_page(&self, page: u32) -> Result<ListPage>;

    /// Most popular titles, paginated like the A-Z listing.
    async fn most_popular(&self, page: u32) -> Result<ListPage>;

    /// Latest updated titles. Not paginated.
    async fn recently_updated(&self) -> Result<Vec<AnimeSummary>>;

    /// `Ok(None)` when the entry exists but carries no MAL id.
    async fn anime_mal_id(&self, anime_id: &str) -> Result<Option<u64>>;
}

#[async_trait]
pub trait WatchHistory: Send + Sync {
    /// Watched MAL ids, oldest first.
    async fn last_watch_ids(&self, user_id: &str) -> Result<Vec<u64>>;
}
