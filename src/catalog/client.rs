//! Jikan catalog client.

use super::types::{
    validate_list, validate_one, validate_page, Anime, CastEntry, Character, Envelope, Page,
    RawAnime, RawCastEntry, RawCharacter, RawRecommendation, Recommendation,
};
use crate::cache::JsonCache;
use crate::config::{parse_base_url, AppConfig};
use crate::transport::{endpoint_url, HttpTransport};
use crate::Result;
use url::Url;

/// Ranking filters accepted by `top/anime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopFilter {
    All,
    ByPopularity,
    Upcoming,
    Airing,
}

impl TopFilter {
    fn as_query(&self) -> Option<&'static str> {
        match self {
            TopFilter::All => None,
            TopFilter::ByPopularity => Some("bypopularity"),
            TopFilter::Upcoming => Some("upcoming"),
            TopFilter::Airing => Some("airing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }
}

pub struct CatalogClient {
    transport: HttpTransport,
    base_url: Url,
    cache: JsonCache,
}

impl CatalogClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let cache = if config.cache_capacity == 0 {
            JsonCache::disabled()
        } else {
            JsonCache::memory(config.cache_capacity, config.cache_ttl())
        };
        Ok(Self {
            transport: HttpTransport::new(config.http_timeout())?,
            base_url: config.catalog_url()?,
            cache,
        })
    }

    /// Client against `base_url` with caller-supplied transport and cache.
    pub fn with_parts(base_url: &str, transport: HttpTransport, cache: JsonCache) -> Result<Self> {
        Ok(Self {
            transport,
            base_url: parse_base_url("catalog_base_url", base_url)?,
            cache,
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = endpoint_url(&self.base_url, path, query)?;
        self.transport.get_json(url).await
    }

    /// Full anime record. Served from cache when present.
    pub async fn anime_by_id(&self, mal_id: u64) -> Result<Anime> {
        let key = format!("anime:{mal_id}");
        if let Some(anime) = self.cache.get::<Anime>(&key).await {
            return Ok(anime);
        }
        let env: Envelope<RawAnime> = self.get(&format!("anime/{mal_id}"), &[]).await?;
        let anime: Anime = validate_one(env)?;
        self.cache.set(&key, &anime).await;
        Ok(anime)
    }

    pub async fn search_anime(&self, query: &str) -> Result<Page<Anime>> {
        let env: Envelope<Vec<RawAnime>> = self.get("anime", &[("q", query.to_string())]).await?;
        validate_page(env)
    }

    pub async fn top_anime(&self, filter: TopFilter) -> Result<Page<Anime>> {
        let query: Vec<(&str, String)> = filter
            .as_query()
            .map(|f| vec![("filter", f.to_string())])
            .unwrap_or_default();
        let env: Envelope<Vec<RawAnime>> = self.get("top/anime", &query).await?;
        validate_page(env)
    }

    pub async fn top_characters(&self, page: u32) -> Result<Page<Character>> {
        let env: Envelope<Vec<RawCharacter>> = self
            .get("top/characters", &[("page", page.to_string())])
            .await?;
        validate_page(env)
    }

    pub async fn anime_characters(&self, mal_id: u64) -> Result<Vec<CastEntry>> {
        let env: Envelope<Vec<RawCastEntry>> =
            self.get(&format!("anime/{mal_id}/characters"), &[]).await?;
        Ok(validate_list(env.data.unwrap_or_default()))
    }

    pub async fn character_by_id(&self, character_id: u64) -> Result<Character> {
        let env: Envelope<RawCharacter> =
            self.get(&format!("characters/{character_id}"), &[]).await?;
        validate_one(env)
    }

    pub async fn season(&self, year: u32, season: Season) -> Result<Page<Anime>> {
        let env: Envelope<Vec<RawAnime>> = self
            .get(&format!("seasons/{year}/{}", season.as_str()), &[])
            .await?;
        validate_page(env)
    }

    pub async fn upcoming_season(&self) -> Result<Page<Anime>> {
        let env: Envelope<Vec<RawAnime>> = self.get("seasons/upcoming", &[]).await?;
        validate_page(env)
    }

    pub async fn recommendations(&self) -> Result<Vec<Recommendation>> {
        let env: Envelope<Vec<RawRecommendation>> =
            self.get("recommendations/anime", &[]).await?;
        Ok(env
            .data
            .unwrap_or_default()
            .into_iter()
            .map(Recommendation::from)
            .filter(|r| !r.entries.is_empty())
            .collect())
    }
}

#[async_trait::async_trait]
impl super::AnimeCatalog for CatalogClient {
    async fn anime_by_id(&self, mal_id: u64) -> Result<Anime> {
        CatalogClient::anime_by_id(self, mal_id).await
    }

    async fn top_characters(&self, page: u32) -> Result<Page<Character>> {
        CatalogClient::top_characters(self, page).await
    }
}
