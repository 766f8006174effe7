//! Companion backend response models.

use crate::error::ErrorContext;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeCounts {
    #[serde(default)]
    pub sub: Option<u32>,
    #[serde(default)]
    pub dub: Option<u32>,
}

/// List entry as served by the streaming backend. `id` is the backend's slug,
/// not a MAL id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeSummary {
    pub id: String,
    pub name: String,
    pub poster: Option<String>,
    pub kind: Option<String>,
    pub episodes: EpisodeCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListPage {
    pub animes: Vec<AnimeSummary>,
    pub current_page: u32,
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BackendEnvelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
}

impl<T> BackendEnvelope<T> {
    /// Payload of a successful response.
    pub(crate) fn into_data(self) -> Result<T> {
        if !self.success {
            return Err(Error::validation(
                "upstream reported failure",
                ErrorContext::new()
                    .with_field_path("success")
                    .with_source("backend"),
            ));
        }
        self.data.ok_or_else(|| {
            Error::validation(
                "backend response is missing data",
                ErrorContext::new().with_field_path("data").with_source("backend"),
            )
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSummary {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    episodes: Option<EpisodeCounts>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawList {
    #[serde(default)]
    animes: Vec<RawSummary>,
    #[serde(default)]
    current_page: Option<u32>,
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInfo {
    #[serde(default)]
    mal_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawInfoAnime {
    #[serde(default)]
    info: Option<RawInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAnimeInfo {
    #[serde(default)]
    anime: Option<RawInfoAnime>,
}

impl RawAnimeInfo {
    /// MAL id, treating absent and zero alike.
    pub(crate) fn mal_id(&self) -> Option<u64> {
        self.anime
            .as_ref()
            .and_then(|a| a.info.as_ref())
            .and_then(|i| i.mal_id)
            .filter(|id| *id != 0)
    }
}

/// Watch-history ids come as numbers or numeric strings depending on who wrote them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Num(u64),
    Str(String),
}

impl RawId {
    fn parse(&self) -> Option<u64> {
        match self {
            RawId::Num(n) => Some(*n),
            RawId::Str(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawLastWatch {
    #[serde(default)]
    anime_ids: Option<Vec<RawId>>,
}

impl RawLastWatch {
    /// Ids in stored order (oldest first). Unparseable ids are skipped.
    pub(crate) fn into_ids(self) -> Result<Vec<u64>> {
        let ids = self.anime_ids.ok_or_else(|| {
            Error::validation(
                "last-watch response is missing animeIds",
                ErrorContext::new()
                    .with_field_path("animeIds")
                    .with_source("user_service"),
            )
        })?;
        Ok(ids.iter().filter_map(RawId::parse).collect())
    }
}

impl RawSummary {
    fn validate(self) -> Option<AnimeSummary> {
        let id = self.id.filter(|s| !s.is_empty())?;
        Some(AnimeSummary {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            poster: self.poster,
            kind: self.kind,
            episodes: self.episodes.unwrap_or_default(),
        })
    }
}

impl RawList {
    pub(crate) fn into_page(self, requested_page: u32) -> ListPage {
        ListPage {
            animes: self
                .animes
                .into_iter()
                .filter_map(RawSummary::validate)
                .collect(),
            current_page: self.current_page.unwrap_or(requested_page),
            has_next_page: self.has_next_page,
        }
    }
}
