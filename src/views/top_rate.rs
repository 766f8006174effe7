//! Most popular titles from the companion backend.

use super::{error_message, PageState, StateCell};
use crate::backend::{AnimeDirectory, AnimeSummary};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Paginated most-popular list. Entries are shown as the backend serves
/// them; opening one goes through [`AnimeDirectory::anime_mal_id`].
pub struct TopRateView {
    directory: Arc<dyn AnimeDirectory>,
    items: Vec<AnimeSummary>,
    state: StateCell,
}

impl TopRateView {
    pub fn new(directory: Arc<dyn AnimeDirectory>) -> Self {
        Self {
            directory,
            items: Vec::new(),
            state: StateCell::new(PageState::paginated()),
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

    /// Load `page`. Page 1 replaces the list, later pages append to it.
    pub async fn load(&mut self, page: u32) {
        if self.state.get().is_busy() {
            return;
        }
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

        match self.directory.most_popular(page).await {
            Ok(listing) => {
                debug!(page, count = listing.animes.len(), "most popular page loaded");
                if first {
                    self.items = listing.animes;
                } else {
                    self.items.extend(listing.animes);
                }
                self.state.update(|s| {
                    s.page = page;
                    s.has_next_page = listing.has_next_page;
                });
            }
            Err(err) => {
                warn!(page, error = %err, "most popular load failed");
                let message = error_message(&err);
                self.state.update(|s| s.error = Some(message));
            }
        }

        self.state.update(|s| {
            s.loading = false;
            s.loading_more = false;
        });
    }

    pub async fn load_more(&mut self) {
        let state = self.state.get();
        if !state.has_next_page || state.is_busy() {
            return;
        }
        self.load(state.page + 1).await;
    }
}
