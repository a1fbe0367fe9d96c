//! Debounced multi-category search
//!
//! Keystrokes restart a debounce timer. When it fires the query gets the next
//! sequence number and the request runs in its own task; its response is only
//! applied if no newer query has been issued since. Arrival order never
//! decides what is displayed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::error::{CatalogError, Result};
use crate::model::{Album, Artist, Category, Page, SearchBackend, SearchResponse, Track};

/// Items for one search category
#[derive(Clone, Debug)]
pub struct ResultBucket<T> {
    pub items: Vec<T>,
    pub total: u32,
    pub has_more: bool,
}

impl<T> Default for ResultBucket<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            has_more: false,
        }
    }
}

impl<T> ResultBucket<T> {
    fn fill(&mut self, page: Option<Page<T>>) {
        match page {
            Some(page) => {
                self.has_more = page.has_more();
                self.total = page.total;
                self.items = page.items;
            }
            None => *self = Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// What a view should show for the current search state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchView {
    /// Nothing typed yet
    Initial,
    Searching,
    Results,
    NoResults,
    Failed,
}

#[derive(Clone, Debug, Default)]
pub struct SearchState {
    /// Raw input as last set by the user
    pub query: String,
    /// Latest issued sequence number; responses carrying any other are stale
    pub sequence: u64,
    /// Query whose results are currently in the buckets
    pub results_for: Option<String>,
    pub loading: bool,
    pub error: Option<CatalogError>,
    pub tracks: ResultBucket<Track>,
    pub artists: ResultBucket<Artist>,
    pub albums: ResultBucket<Album>,
}

impl SearchState {
    pub fn has_results(&self) -> bool {
        !(self.tracks.is_empty() && self.artists.is_empty() && self.albums.is_empty())
    }

    pub fn view(&self) -> SearchView {
        if self.query.trim().is_empty() {
            SearchView::Initial
        } else if self.loading {
            SearchView::Searching
        } else if self.error.is_some() {
            SearchView::Failed
        } else if self.has_results() {
            SearchView::Results
        } else {
            SearchView::NoResults
        }
    }

    /// No request outstanding and the shown results (or error) belong to the
    /// current input.
    pub fn settled(&self) -> bool {
        let query = self.query.trim();
        !self.loading
            && (query.is_empty()
                || self.error.is_some()
                || self.results_for.as_deref() == Some(query))
    }

    fn clear_results(&mut self) {
        self.tracks = ResultBucket::default();
        self.artists = ResultBucket::default();
        self.albums = ResultBucket::default();
        self.results_for = None;
    }

    fn apply(&mut self, query: String, response: SearchResponse) {
        self.tracks.fill(response.tracks);
        self.artists.fill(response.artists);
        self.albums.fill(response.albums);
        self.results_for = Some(query);
    }
}

struct Inner {
    backend: Arc<dyn SearchBackend>,
    state: watch::Sender<SearchState>,
    debounce: Duration,
    limit: u32,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(pending) = self.timer.get_mut().take() {
            pending.abort();
        }
    }
}

/// Search coordinator shared between the input handler and result views
#[derive(Clone)]
pub struct SearchAggregator {
    inner: Arc<Inner>,
}

impl SearchAggregator {
    pub fn new(backend: Arc<dyn SearchBackend>, debounce: Duration, limit: u32) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            inner: Arc::new(Inner {
                backend,
                state,
                debounce,
                limit,
                timer: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    /// React to new input.
    ///
    /// A blank query clears every bucket before returning and never reaches the
    /// backend. Anything else (re)starts the debounce timer.
    pub async fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let mut timer = self.inner.timer.lock().await;
        if let Some(pending) = timer.take() {
            pending.abort();
        }

        if self.clear_if_blank(&query) {
            return;
        }

        self.inner.state.send_modify(|state| state.query = query.clone());

        let weak = Arc::downgrade(&self.inner);
        let debounce = self.inner.debounce;
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let this = SearchAggregator { inner };
            // Detached: aborting the timer must not cancel a sent request.
            tokio::spawn(async move { this.issue(query).await });
        }));
    }

    /// Issue a pending debounced search right away, then wait until the
    /// current query has settled.
    pub async fn flush(&self) {
        let pending = self.inner.timer.lock().await.take();
        if let Some(timer) = pending {
            if !timer.is_finished() {
                timer.abort();
                let query = self.inner.state.borrow().query.clone();
                self.issue(query).await;
                return;
            }
        }

        let mut rx = self.subscribe();
        let _ = rx.wait_for(SearchState::settled).await;
    }

    /// Search immediately, skipping the debounce window.
    pub async fn submit(&self, query: impl Into<String>) {
        let query = query.into();
        if let Some(pending) = self.inner.timer.lock().await.take() {
            pending.abort();
        }

        if self.clear_if_blank(&query) {
            return;
        }

        self.inner.state.send_modify(|state| state.query = query.clone());
        self.issue(query).await;
    }

    /// Re-run the current query, e.g. from a retry action after a failure.
    pub async fn retry(&self) {
        let query = self.inner.state.borrow().query.clone();
        self.submit(query).await;
    }

    fn clear_if_blank(&self, query: &str) -> bool {
        if !query.trim().is_empty() {
            return false;
        }
        self.inner.state.send_modify(|state| {
            state.query = query.to_string();
            // Retire whatever is in flight so it cannot refill the buckets.
            state.sequence += 1;
            state.loading = false;
            state.error = None;
            state.clear_results();
        });
        tracing::debug!("Search cleared");
        true
    }

    async fn issue(&self, query: String) {
        let query = query.trim().to_string();
        let mut sequence = 0;
        let current = self.inner.state.send_if_modified(|state| {
            if state.query.trim() != query {
                return false;
            }
            state.sequence += 1;
            sequence = state.sequence;
            state.loading = true;
            state.error = None;
            true
        });
        if !current {
            tracing::debug!(query = %query, "Input changed before the search was issued");
            return;
        }

        tracing::debug!(query = %query, sequence, "Issuing search");
        let result = self
            .inner
            .backend
            .search(&query, &Category::ALL, self.inner.limit)
            .await;
        self.apply(sequence, query, result);
    }

    fn apply(&self, sequence: u64, query: String, result: Result<SearchResponse>) {
        let mut current = 0;
        let applied = self.inner.state.send_if_modified(|state| {
            current = state.sequence;
            if state.sequence != sequence {
                return false;
            }
            state.loading = false;
            match result {
                Ok(response) => {
                    state.apply(query, response);
                }
                Err(e) => {
                    state.error = Some(e);
                }
            }
            true
        });

        if !applied {
            tracing::debug!(sequence, current, "Discarding stale search response");
            return;
        }

        let state = self.inner.state.borrow();
        match &state.error {
            Some(e) => tracing::error!(sequence, error = %e, "Search failed"),
            None => tracing::info!(
                sequence,
                tracks = state.tracks.len(),
                artists = state.artists.len(),
                albums = state.albums.len(),
                "Search completed successfully"
            ),
        }
    }
}
