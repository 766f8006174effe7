//! Infinite-scroll list of the most favourited characters.

use super::{error_message, PageState, StateCell};
use crate::catalog::{AnimeCatalog, Character};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

pub struct TopCharactersView {
    catalog: Arc<dyn AnimeCatalog>,
    items: Vec<Character>,
    seen: HashSet<u64>,
    state: StateCell,
}

impl TopCharactersView {
    pub fn new(catalog: Arc<dyn AnimeCatalog>) -> Self {
        Self {
            catalog,
            items: Vec::new(),
            seen: HashSet::new(),
            state: StateCell::new(PageState::paginated()),
        }
    }

    pub fn items(&self) -> &[Character] {
        &self.items
    }

    pub fn state(&self) -> PageState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<PageState> {
        self.state.subscribe()
    }

    /// Load `page`. Page 1 replaces the list; later pages append characters
    /// not already shown. An empty page ends the list.
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

        match self.catalog.top_characters(page).await {
            Ok(result) => {
                if first {
                    self.items.clear();
                    self.seen.clear();
                }
                let has_next = !result.items.is_empty() && result.pagination.has_next_page;
                let before = self.items.len();
                for character in result.items {
                    if self.seen.insert(character.mal_id) {
                        self.items.push(character);
                    }
                }
                debug!(page, added = self.items.len() - before, "top characters page loaded");
                self.state.update(|s| {
                    s.page = page;
                    s.has_next_page = has_next;
                });
            }
            Err(err) => {
                warn!(page, error = %err, "top characters load failed");
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
