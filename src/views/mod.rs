//! Per-screen view models.
//!
//! Each screen constructs its own view model on mount. A view model owns the
//! items it has loaded and a [`PageState`] that is published through a
//! `tokio::sync::watch` channel, so the presentation layer can render
//! loading spinners while a load is in progress.
//!
//! | View | Source | Enrichment |
//! |------|--------|------------|
//! | [`AllAnimeView`] | backend A-Z list | MAL id per item via [`crate::batch`] |
//! | [`LastWatchView`] | user service watch history | catalog record per id via [`crate::batch`] |
//! | [`TopRateView`] | backend most popular | none |
//! | [`LastUpdatesView`] | backend recently updated | none |
//! | [`TopCharactersView`] | catalog top characters | none, deduplicated by MAL id |

mod all_anime;
mod last_updates;
mod last_watch;
mod top_characters;
mod top_rate;

pub use all_anime::{AllAnimeView, EnrichedAnime};
pub use last_updates::LastUpdatesView;
pub use last_watch::{LastWatchView, WatchRecord};
pub use top_characters::TopCharactersView;
pub use top_rate::TopRateView;

use crate::batch::{BatchConfig, BatchRunner, BatchSummary};
use crate::Error;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Shown when the upstream answered but reported failure.
pub const FETCH_FAILED: &str = "Failed to fetch data.";
/// Shown when the request itself failed.
pub const FETCH_ERROR: &str = "An error occurred while fetching data.";
/// Non-blocking banner for partially loaded lists.
pub const PARTIAL_NOTICE: &str = "Some items could not be loaded";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageState {
    /// First page (or the only page) is loading.
    pub loading: bool,
    /// A follow-up page is loading.
    pub loading_more: bool,
    pub refreshing: bool,
    pub error: Option<String>,
    /// Last page successfully loaded; 0 before the first load.
    pub page: u32,
    pub has_next_page: bool,
    /// The last load dropped some items but kept others.
    pub partial: bool,
    /// Items dropped by the last load.
    pub failed_items: usize,
}

impl PageState {
    pub(crate) fn paginated() -> Self {
        Self {
            has_next_page: true,
            ..Self::default()
        }
    }

    pub fn is_busy(&self) -> bool {
        self.loading || self.loading_more
    }

    /// Banner text for the current state, if any.
    pub fn notice(&self) -> Option<&str> {
        match (&self.error, self.partial) {
            (Some(err), _) => Some(err.as_str()),
            (None, true) => Some(PARTIAL_NOTICE),
            (None, false) => None,
        }
    }

    pub(crate) fn record_batch(&mut self, summary: &BatchSummary) {
        self.partial = summary.is_partial();
        self.failed_items = summary.failed;
    }
}

pub(crate) fn error_message(err: &Error) -> String {
    match err {
        Error::Validation { .. } => FETCH_FAILED.to_string(),
        _ => FETCH_ERROR.to_string(),
    }
}

/// Watch-channel holder for a view's [`PageState`].
pub(crate) struct StateCell {
    tx: watch::Sender<PageState>,
}

impl StateCell {
    pub(crate) fn new(initial: PageState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub(crate) fn get(&self) -> PageState {
        self.tx.borrow().clone()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut PageState)) {
        self.tx.send_modify(f);
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<PageState> {
        self.tx.subscribe()
    }
}

pub(crate) fn runner(config: &BatchConfig, cancel: Option<&CancellationToken>) -> BatchRunner {
    let runner = BatchRunner::new(config.clone());
    match cancel {
        Some(token) => runner.with_cancellation(token.clone()),
        None => runner,
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    //! In-memory sources for view tests.

    use crate::backend::{AnimeDirectory, AnimeSummary, EpisodeCounts, ListPage, WatchHistory};
    use crate::catalog::{AnimeCatalog, Character, Images, Page, Pagination};
    use crate::catalog::Anime;
    use crate::error::ErrorContext;
    use crate::error_kind::ErrorKind;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    pub fn summary(id: &str) -> AnimeSummary {
        AnimeSummary {
            id: id.to_string(),
            name: id.to_uppercase(),
            poster: None,
            kind: Some("TV".into()),
            episodes: EpisodeCounts::default(),
        }
    }

    pub fn anime(mal_id: u64, title: &str) -> Anime {
        Anime {
            mal_id,
            title: title.to_string(),
            title_english: None,
            images: Images::default(),
            score: None,
            episodes: None,
            status: None,
            year: None,
            synopsis: None,
        }
    }

    pub fn character(mal_id: u64, name: &str) -> Character {
        Character {
            mal_id,
            name: name.to_string(),
            images: Images::default(),
            favorites: None,
            about: None,
        }
    }

    pub fn rate_limited() -> Error {
        Error::Remote {
            status: 429,
            kind: ErrorKind::RateLimited,
            message: "Too Many Requests".into(),
        }
    }

    pub fn connection_refused() -> Error {
        Error::Transport(crate::transport::TransportError::Other(
            "connection refused".into(),
        ))
    }

    fn upstream_failure() -> Error {
        Error::validation("upstream reported failure", ErrorContext::new())
    }

    #[derive(Default)]
    pub struct FakeDirectory {
        pub pages: HashMap<u32, ListPage>,
        pub popular_pages: HashMap<u32, ListPage>,
        pub recent: Vec<AnimeSummary>,
        pub mal_ids: HashMap<String, u64>,
        /// Page requests that fail with `success: false`, for either listing.
        pub failing_pages: Vec<u32>,
        /// Recently updated answers `success: false`.
        pub recent_rejected: bool,
        pub recent_unreachable: bool,
    }

    impl FakeDirectory {
        fn page_from(&self, pages: &HashMap<u32, ListPage>, page: u32) -> Result<ListPage> {
            if self.failing_pages.contains(&page) {
                return Err(upstream_failure());
            }
            Ok(pages.get(&page).cloned().unwrap_or(ListPage {
                animes: Vec::new(),
                current_page: page,
                has_next_page: false,
            }))
        }
    }

    #[async_trait]
    impl AnimeDirectory for FakeDirectory {
        async fn azlist_page(&self, page: u32) -> Result<ListPage> {
            self.page_from(&self.pages, page)
        }

        async fn most_popular(&self, page: u32) -> Result<ListPage> {
            self.page_from(&self.popular_pages, page)
        }

        async fn recently_updated(&self) -> Result<Vec<AnimeSummary>> {
            if self.recent_unreachable {
                return Err(connection_refused());
            }
            if self.recent_rejected {
                return Err(upstream_failure());
            }
            Ok(self.recent.clone())
        }

        async fn anime_mal_id(&self, anime_id: &str) -> Result<Option<u64>> {
            Ok(self.mal_ids.get(anime_id).copied())
        }
    }

    #[derive(Default)]
    pub struct FakeHistory {
        pub ids: HashMap<String, Vec<u64>>,
        pub unreachable: bool,
    }

    #[async_trait]
    impl WatchHistory for FakeHistory {
        async fn last_watch_ids(&self, user_id: &str) -> Result<Vec<u64>> {
            if self.unreachable {
                return Err(connection_refused());
            }
            Ok(self.ids.get(user_id).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    pub struct FakeCatalog {
        pub anime: HashMap<u64, Anime>,
        /// Remaining 429 answers per id.
        pub rate_limits: Mutex<HashMap<u64, u32>>,
        pub character_pages: HashMap<u32, Vec<Character>>,
        pub last_page: u32,
        pub calls: AtomicU32,
    }

    #[async_trait]
    impl AnimeCatalog for FakeCatalog {
        async fn anime_by_id(&self, mal_id: u64) -> Result<Anime> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            {
                let mut limits = self.rate_limits.lock().unwrap();
                if let Some(left) = limits.get_mut(&mal_id) {
                    if *left > 0 {
                        *left -= 1;
                        return Err(rate_limited());
                    }
                }
            }
            self.anime.get(&mal_id).cloned().ok_or(Error::Remote {
                status: 404,
                kind: ErrorKind::NotFound,
                message: "Not Found".into(),
            })
        }

        async fn top_characters(&self, page: u32) -> Result<Page<Character>> {
            let items = self.character_pages.get(&page).cloned().unwrap_or_default();
            Ok(Page {
                items,
                pagination: Pagination {
                    current_page: page,
                    last_visible_page: self.last_page,
                    has_next_page: page < self.last_page,
                },
            })
        }
    }
}
