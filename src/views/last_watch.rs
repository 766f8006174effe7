//! "Continue watching" row: the user's watch history resolved against the catalog.

use super::{error_message, runner, PageState, StateCell};
use crate::backend::WatchHistory;
use crate::batch::{into_values, BatchConfig, BatchSummary, ResolveError};
use crate::catalog::{AnimeCatalog, Images};
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchRecord {
    pub mal_id: u64,
    pub title: String,
    pub images: Images,
}

pub struct LastWatchView {
    history: Arc<dyn WatchHistory>,
    catalog: Arc<dyn AnimeCatalog>,
    user_id: Option<String>,
    batch: BatchConfig,
    cancel: Option<CancellationToken>,
    items: Vec<WatchRecord>,
    state: StateCell,
}

impl LastWatchView {
    pub fn new(
        history: Arc<dyn WatchHistory>,
        catalog: Arc<dyn AnimeCatalog>,
        user_id: Option<String>,
    ) -> Self {
        Self {
            history,
            catalog,
            user_id,
            batch: Self::default_batch_config(),
            cancel: None,
            items: Vec::new(),
            state: StateCell::new(PageState::default()),
        }
    }

    /// The catalog rate-limits bursts, so each record gets three retries
    /// two seconds apart.
    pub fn default_batch_config() -> BatchConfig {
        BatchConfig::default()
            .with_max_retries(3)
            .with_retry_backoff(Duration::from_secs(2))
    }

    /// Apply an app-wide batch section to this row. Every field is taken
    /// from `base`, except that the retry budget never drops below the
    /// default three, since the row is built from rate-limited lookups.
    pub fn batch_config_from(base: &BatchConfig) -> BatchConfig {
        let floor = Self::default_batch_config().max_retries;
        base.clone().with_max_retries(base.max_retries.max(floor))
    }

    pub fn with_batch_config(mut self, config: BatchConfig) -> Self {
        self.batch = config;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Switch to another signed-in user (or none). Call [`load`](Self::load) afterwards.
    pub fn set_user(&mut self, user_id: Option<String>) {
        if self.user_id != user_id {
            self.user_id = user_id;
            self.items.clear();
            self.state.update(|s| {
                s.error = None;
                s.partial = false;
                s.failed_items = 0;
            });
        }
    }

    /// Most recently watched first.
    pub fn items(&self) -> &[WatchRecord] {
        &self.items
    }

    pub fn state(&self) -> PageState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<PageState> {
        self.state.subscribe()
    }

    pub async fn load(&mut self) {
        let Some(user_id) = self.user_id.clone() else {
            debug!("no signed-in user, last-watch row left empty");
            self.items.clear();
            self.state.update(|s| {
                s.loading = false;
                s.error = None;
                s.partial = false;
                s.failed_items = 0;
            });
            return;
        };

        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.fetch(&user_id).await {
            Ok((records, summary)) => {
                info!(user_id = %user_id, records = records.len(), "last-watch row loaded");
                self.items = records;
                self.state.update(|s| s.record_batch(&summary));
            }
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "last-watch load failed");
                let message = error_message(&err);
                self.state.update(|s| s.error = Some(message));
            }
        }

        self.state.update(|s| s.loading = false);
    }

    /// Pull-to-refresh.
    pub async fn refresh(&mut self) {
        self.state.update(|s| s.refreshing = true);
        self.load().await;
        self.state.update(|s| s.refreshing = false);
    }

    async fn fetch(&self, user_id: &str) -> Result<(Vec<WatchRecord>, BatchSummary)> {
        let mut ids = self.history.last_watch_ids(user_id).await?;
        if ids.is_empty() {
            return Ok((Vec::new(), BatchSummary::default()));
        }
        ids.reverse();

        let catalog: &dyn AnimeCatalog = self.catalog.as_ref();
        let outcomes = runner(&self.batch, self.cancel.as_ref())
            .run(ids, move |mal_id: u64| async move {
                let anime = catalog.anime_by_id(mal_id).await?;
                Ok::<_, ResolveError>(WatchRecord {
                    mal_id: anime.mal_id,
                    title: anime.title,
                    images: anime.images,
                })
            })
            .await?;

        let summary = BatchSummary::from_outcomes(&outcomes);
        Ok((into_values(outcomes), summary))
    }
}
