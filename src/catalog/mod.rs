//! Public anime catalog (Jikan v4).
//!
//! [`CatalogClient`] covers the endpoints the app uses; [`AnimeCatalog`] is
//! the narrow seam the view models depend on, so they can be driven by a fake
//! in tests.

mod client;
mod types;

pub use client::{CatalogClient, Season, TopFilter};
pub use types::{
    Anime, AnimeRef, CastEntry, Character, ImageUrls, Images, Page, Pagination, Recommendation,
    VoiceActor, UNTITLED,
};

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AnimeCatalog: Send + Sync {
    /// Detail record for one MAL id.
    async fn anime_by_id(&self, mal_id: u64) -> Result<Anime>;

    /// One page of the most favourited characters.
    async fn top_characters(&self, page: u32) -> Result<Page<Character>>;
}
