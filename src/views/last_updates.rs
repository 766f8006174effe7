//! Recently updated titles from the companion backend.

use super::{error_message, PageState, StateCell};
use crate::backend::{AnimeDirectory, AnimeSummary};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Single-page list, reloaded whole on refresh.
pub struct LastUpdatesView {
    directory: Arc<dyn AnimeDirectory>,
    items: Vec<AnimeSummary>,
    state: StateCell,
}

impl LastUpdatesView {
    pub fn new(directory: Arc<dyn AnimeDirectory>) -> Self {
        Self {
            directory,
            items: Vec::new(),
            state: StateCell::new(PageState::default()),
        }
    }

    pub fn items(&self) -> &[AnimeSummary] {
        &self.items
    }

    pub fn state(&self) -> PageState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<PageState> {
        self.state.subscribe()
    }

    pub async fn load(&mut self) {
        self.fetch(false).await;
    }

    /// Pull-to-refresh: same request, reported through `refreshing`.
    pub async fn refresh(&mut self) {
        self.fetch(true).await;
    }

    async fn fetch(&mut self, refresh: bool) {
        self.state.update(|s| {
            if refresh {
                s.refreshing = true;
            } else {
                s.loading = true;
            }
            s.error = None;
        });

        match self.directory.recently_updated().await {
            Ok(animes) => {
                debug!(count = animes.len(), "recently updated loaded");
                self.items = animes;
                self.state.update(|s| s.page = 1);
            }
            Err(err) => {
                warn!(error = %err, "recently updated load failed");
                let message = error_message(&err);
                self.state.update(|s| s.error = Some(message));
            }
        }

        self.state.update(|s| {
            s.loading = false;
            s.refreshing = false;
        });
    }
}
