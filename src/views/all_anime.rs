//! A-Z listing enriched with MAL ids.

use super::{error_message, runner, PageState, StateCell};
use crate::backend::{AnimeDirectory, AnimeSummary};
use crate::batch::{into_values, BatchConfig, BatchSummary, ResolveError};
use crate::error::ErrorContext;
use crate::{Error, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Listing entry whose MAL id is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedAnime {
    #[serde(flatten)]
    pub summary: AnimeSummary,
    pub mal_id: u64,
}

pub struct AllAnimeView {
    directory: Arc<dyn AnimeDirectory>,
    batch: BatchConfig,
    cancel: Option<CancellationToken>,
    items: Vec<EnrichedAnime>,
    state: StateCell,
}

impl AllAnimeView {
    pub fn new(directory: Arc<dyn AnimeDirectory>) -> Self {
        Self {
            directory,
            batch: Self::default_batch_config(),
            cancel: None,
            items: Vec::new(),
            state: StateCell::new(PageState::paginated()),
        }
    }

    /// No retries: a missing MAL id on a listing is not worth waiting for.
    pub fn default_batch_config() -> BatchConfig {
        BatchConfig::default().with_max_retries(0)
    }

    pub fn with_batch_config(mut self, config: BatchConfig) -> Self {
        self.batch = config;
        self
    }

    /// Token cancelled when the screen goes away.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn items(&self) -> &[EnrichedAnime] {
        &self.items
    }

    pub fn state(&self) -> PageState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<PageState> {
        self.state.subscribe()
    }

    /// Load `page`. Page 1 replaces the list, later pages append to it.
    pub async fn load(&mut self, page: u32) {
        let page = page.max(1);
        let first = page == 1;
        self.state.update(|s| {
            if first {
                s.loading = true;
            } else {
                s.loading_more = true;
            }
            s.error = None;
        });

        match self.fetch(page).await {
            Ok((enriched, has_next, summary)) => {
                debug!(page, kept = enriched.len(), "azlist page enriched");
                if first {
                    self.items = enriched;
                } else {
                    self.items.extend(enriched);
                }
                self.state.update(|s| {
                    s.page = page;
                    s.has_next_page = has_next;
                    s.record_batch(&summary);
                });
            }
            Err(err) => {
                warn!(page, error = %err, "azlist load failed");
                let message = error_message(&err);
                self.state.update(|s| s.error = Some(message));
            }
        }

        self.state.update(|s| {
            s.loading = false;
            s.loading_more = false;
        });
    }

    /// Load the page after the last one loaded, if there is one.
    pub async fn load_more(&mut self) {
        let state = self.state.get();
        if !state.has_next_page || state.is_busy() {
            return;
        }
        self.load(state.page + 1).await;
    }

    /// MAL id for a backend slug, used when the user opens a listing entry.
    pub async fn mal_id_for(&self, anime_id: &str) -> Result<u64> {
        if let Some(item) = self.items.iter().find(|i| i.summary.id == anime_id) {
            return Ok(item.mal_id);
        }
        self.directory.anime_mal_id(anime_id).await?.ok_or_else(|| {
            Error::validation(
                format!("{anime_id} has no MAL id"),
                ErrorContext::new()
                    .with_field_path("anime.info.malId")
                    .with_source("backend"),
            )
        })
    }

    async fn fetch(&self, page: u32) -> Result<(Vec<EnrichedAnime>, bool, BatchSummary)> {
        let listing = self.directory.azlist_page(page).await?;
        let directory: &dyn AnimeDirectory = self.directory.as_ref();

        let outcomes = runner(&self.batch, self.cancel.as_ref())
            .run(listing.animes, move |anime: AnimeSummary| async move {
                let mal_id = directory.anime_mal_id(&anime.id).await?;
                match mal_id {
                    Some(mal_id) => Ok::<_, ResolveError>(EnrichedAnime {
                        summary: anime,
                        mal_id,
                    }),
                    None => Err(ResolveError::detail_unavailable(format!(
                        "{} has no MAL id",
                        anime.id
                    ))),
                }
            })
            .await?;

        let summary = BatchSummary::from_outcomes(&outcomes);
        Ok((into_values(outcomes), listing.has_next_page, summary))
    }
}
