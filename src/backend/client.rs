//! Companion backend client.

use super::types::{BackendEnvelope, ListPage, RawAnimeInfo, RawLastWatch, RawList};
use super::AnimeSummary;
use crate::config::{parse_base_url, AppConfig};
use crate::transport::{endpoint_url, HttpTransport};
use crate::Result;
use url::Url;

/// Client for the streaming backend (`backend_base_url`) and the user
/// service that stores watch history (`user_service_url`).
pub struct BackendClient {
    transport: HttpTransport,
    backend_url: Url,
    user_service_url: Url,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config.http_timeout())?,
            backend_url: config.backend_url()?,
            user_service_url: config.user_service_url()?,
        })
    }

    pub fn with_parts(
        backend_url: &str,
        user_service_url: &str,
        transport: HttpTransport,
    ) -> Result<Self> {
        Ok(Self {
            transport,
            backend_url: parse_base_url("backend_base_url", backend_url)?,
            user_service_url: parse_base_url("user_service_url", user_service_url)?,
        })
    }

    async fn list(&self, path: &str, page: u32) -> Result<ListPage> {
        let url = endpoint_url(&self.backend_url, path, &[("page", page.to_string())])?;
        let env: BackendEnvelope<RawList> = self.transport.get_json(url).await?;
        Ok(env.into_data()?.into_page(page))
    }

    /// One page of the A-Z listing.
    pub async fn azlist_page(&self, page: u32) -> Result<ListPage> {
        self.list("azlist/all", page).await
    }

    pub async fn most_popular(&self, page: u32) -> Result<ListPage> {
        self.list("category/most-popular", page).await
    }

    pub async fn recently_updated(&self) -> Result<Vec<AnimeSummary>> {
        let url = endpoint_url(&self.backend_url, "category/recently-updated", &[])?;
        let env: BackendEnvelope<RawList> = self.transport.get_json(url).await?;
        Ok(env.into_data()?.into_page(1).animes)
    }

    /// MAL id for a backend slug, `None` when the backend does not know it.
    pub async fn anime_mal_id(&self, anime_id: &str) -> Result<Option<u64>> {
        let url = endpoint_url(&self.backend_url, &format!("anime/{anime_id}"), &[])?;
        let env: BackendEnvelope<RawAnimeInfo> = self.transport.get_json(url).await?;
        Ok(env.into_data()?.mal_id())
    }

    /// Watched MAL ids for `user_id`, oldest first.
    pub async fn last_watch_ids(&self, user_id: &str) -> Result<Vec<u64>> {
        let url = endpoint_url(
            &self.user_service_url,
            "last-watch",
            &[("userId", user_id.to_string())],
        )?;
        let raw: RawLastWatch = self.transport.get_json(url).await?;
        raw.into_ids()
    }
}

#[async_trait::async_trait]
impl super::AnimeDirectory for BackendClient {
    async fn azlist_page(&self, page: u32) -> Result<ListPage> {
        BackendClient::azlist_page(self, page).await
    }

    async fn most_popular(&self, page: u32) -> Result<ListPage> {
        BackendClient::most_popular(self, page).await
    }

    async fn recently_updated(&self) -> Result<Vec<AnimeSummary>> {
        BackendClient::recently_updated(self).await
    }

    async fn anime_mal_id(&self, anime_id: &str) -> Result<Option<u64>> {
        BackendClient::anime_mal_id(self, anime_id).await
    }
}

#[async_trait::async_trait]
impl super::WatchHistory for BackendClient {
    async fn last_watch_ids(&self, user_id: &str) -> Result<Vec<u64>> {
        BackendClient::last_watch_ids(self, user_id).await
    }
}
