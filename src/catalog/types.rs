//! Catalog response models.
//!
//! Every payload is first decoded into a `Raw*` struct where each field is
//! optional, then validated into the public type. A missing required field
//! becomes `Error::Validation`, which the batch runner reports as
//! `DetailUnavailable`.

use crate::error::ErrorContext;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Title shown when the catalog has neither a default nor an English title.
pub const UNTITLED: &str = "No Title";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrls {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: Option<ImageUrls>,
    #[serde(default)]
    pub webp: Option<ImageUrls>,
}

impl Images {
    /// Largest available image, preferring jpg.
    pub fn best_url(&self) -> Option<&str> {
        [self.jpg.as_ref(), self.webp.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|set| {
                set.large_image_url
                    .as_deref()
                    .or(set.image_url.as_deref())
                    .or(set.small_image_url.as_deref())
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub last_visible_page: u32,
    #[serde(default)]
    pub has_next_page: bool,
}

/// One page of a list endpoint. Entries that failed validation are dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    pub mal_id: u64,
    pub title: String,
    pub title_english: Option<String>,
    pub images: Images,
    pub score: Option<f64>,
    pub episodes: Option<u32>,
    pub status: Option<String>,
    pub year: Option<u32>,
    pub synopsis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub mal_id: u64,
    pub name: String,
    pub images: Images,
    pub favorites: Option<u64>,
    pub about: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceActor {
    pub mal_id: u64,
    pub name: String,
    pub language: Option<String>,
}

/// A character's appearance in one anime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastEntry {
    pub character: Character,
    pub role: Option<String>,
    pub voice_actors: Vec<VoiceActor>,
}

/// Short anime reference used inside recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeRef {
    pub mal_id: u64,
    pub title: String,
    pub images: Images,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub entries: Vec<AnimeRef>,
    pub content: Option<String>,
}

// Raw wire shapes.

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawAnime {
    #[serde(default)]
    mal_id: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    title_english: Option<String>,
    #[serde(default)]
    images: Option<Images>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    episodes: Option<u32>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    synopsis: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCharacter {
    #[serde(default)]
    mal_id: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    images: Option<Images>,
    #[serde(default)]
    favorites: Option<u64>,
    #[serde(default)]
    about: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPerson {
    #[serde(default)]
    mal_id: Option<u64>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawVoiceActor {
    #[serde(default)]
    person: Option<RawPerson>,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCastEntry {
    #[serde(default)]
    character: Option<RawCharacter>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    voice_actors: Vec<RawVoiceActor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRecommendation {
    #[serde(default)]
    entry: Vec<RawAnime>,
    #[serde(default)]
    content: Option<String>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| {
        Error::validation(
            format!("catalog response is missing {field}"),
            ErrorContext::new()
                .with_field_path(field)
                .with_source("catalog"),
        )
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl TryFrom<RawAnime> for Anime {
    type Error = Error;

    fn try_from(raw: RawAnime) -> Result<Self> {
        let mal_id = required(raw.mal_id, "data.mal_id")?;
        let title_english = non_empty(raw.title_english);
        let title = non_empty(raw.title)
            .or_else(|| title_english.clone())
            .unwrap_or_else(|| UNTITLED.to_string());
        Ok(Anime {
            mal_id,
            title,
            title_english,
            images: raw.images.unwrap_or_default(),
            score: raw.score,
            episodes: raw.episodes,
            status: raw.status,
            year: raw.year,
            synopsis: raw.synopsis,
        })
    }
}

impl TryFrom<RawAnime> for AnimeRef {
    type Error = Error;

    fn try_from(raw: RawAnime) -> Result<Self> {
        let anime = Anime::try_from(raw)?;
        Ok(AnimeRef {
            mal_id: anime.mal_id,
            title: anime.title,
            images: anime.images,
        })
    }
}

impl TryFrom<RawCharacter> for Character {
    type Error = Error;

    fn try_from(raw: RawCharacter) -> Result<Self> {
        Ok(Character {
            mal_id: required(raw.mal_id, "data.mal_id")?,
            name: required(non_empty(raw.name), "data.name")?,
            images: raw.images.unwrap_or_default(),
            favorites: raw.favorites,
            about: raw.about,
        })
    }
}

impl TryFrom<RawCastEntry> for CastEntry {
    type Error = Error;

    fn try_from(raw: RawCastEntry) -> Result<Self> {
        let character = Character::try_from(required(raw.character, "data.character")?)?;
        let voice_actors = raw
            .voice_actors
            .into_iter()
            .filter_map(|va| {
                let person = va.person?;
                Some(VoiceActor {
                    mal_id: person.mal_id?,
                    name: non_empty(person.name)?,
                    language: va.language,
                })
            })
            .collect();
        Ok(CastEntry {
            character,
            role: raw.role,
            voice_actors,
        })
    }
}

impl From<RawRecommendation> for Recommendation {
    fn from(raw: RawRecommendation) -> Self {
        Recommendation {
            entries: validate_list(raw.entry),
            content: raw.content,
        }
    }
}

/// Unwrap `data` from a single-record envelope and validate it.
pub(crate) fn validate_one<R, T>(envelope: Envelope<R>) -> Result<T>
where
    T: TryFrom<R, Error = Error>,
{
    T::try_from(required(envelope.data, "data")?)
}

/// Validate each entry of a list, dropping the ones that fail.
pub(crate) fn validate_list<R, T>(raw: Vec<R>) -> Vec<T>
where
    T: TryFrom<R, Error = Error>,
{
    raw.into_iter()
        .filter_map(|r| match T::try_from(r) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!(error = %e, "dropping invalid catalog entry");
                None
            }
        })
        .collect()
}

/// Validate a paginated list envelope.
pub(crate) fn validate_page<R, T>(envelope: Envelope<Vec<R>>) -> Result<Page<T>>
where
    T: TryFrom<R, Error = Error>,
{
    let raw = required(envelope.data, "data")?;
    Ok(Page {
        items: validate_list(raw),
        pagination: envelope.pagination.unwrap_or_default(),
    })
}
