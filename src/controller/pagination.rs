//! Offset-paginated collection with incremental loading
//!
//! One controller owns one collection. State lives in a `watch` channel so
//! views can hold a receiver and redraw on change, while every mutation goes
//! through `load` / `load_more`.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::CatalogError;
use crate::model::{Page, PageSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CollectionPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadingMore,
    Failed,
}

/// Snapshot of a paginated collection
#[derive(Clone, Debug)]
pub struct PaginationState<T> {
    pub phase: CollectionPhase,
    /// Offset of the most recently requested page
    pub offset: u32,
    pub limit: u32,
    pub items: Vec<T>,
    pub total: u32,
    pub has_more: bool,
    pub error: Option<CatalogError>,
}

impl<T> PaginationState<T> {
    fn new(limit: u32) -> Self {
        Self {
            phase: CollectionPhase::Idle,
            offset: 0,
            limit,
            items: Vec::new(),
            total: 0,
            has_more: false,
            error: None,
        }
    }

    pub fn loading(&self) -> bool {
        matches!(
            self.phase,
            CollectionPhase::Loading | CollectionPhase::LoadingMore
        )
    }

    /// Loaded successfully but nothing to show
    pub fn is_empty(&self) -> bool {
        self.phase == CollectionPhase::Loaded && self.items.is_empty()
    }
}

/// What a `load` / `load_more` call did
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// Page applied; `count` items arrived
    Applied { count: usize },
    /// Dropped because a fetch was already in flight
    Rejected,
    /// Nothing to do (collection exhausted or never loaded)
    Skipped,
    Failed(CatalogError),
}

/// Runs `on_cancel` when dropped, unless disarmed first.
///
/// Held across a fetch await so that a caller dropping the future (timeout,
/// `select!`, aborted task) cannot leave the state stuck in a loading phase.
pub(super) struct CancelGuard<F: FnOnce()> {
    on_cancel: Option<F>,
}

impl<F: FnOnce()> CancelGuard<F> {
    pub(super) fn new(on_cancel: F) -> Self {
        Self {
            on_cancel: Some(on_cancel),
        }
    }

    pub(super) fn disarm(mut self) {
        self.on_cancel = None;
    }
}

impl<F: FnOnce()> Drop for CancelGuard<F> {
    fn drop(&mut self) {
        if let Some(on_cancel) = self.on_cancel.take() {
            on_cancel();
        }
    }
}

pub struct PaginatedCollection<T> {
    name: &'static str,
    source: Arc<dyn PageSource<T>>,
    state: watch::Sender<PaginationState<T>>,
}

impl<T: Clone + Send + Sync + 'static> PaginatedCollection<T> {
    pub fn new(name: &'static str, source: Arc<dyn PageSource<T>>, limit: u32) -> Self {
        let (state, _) = watch::channel(PaginationState::new(limit.max(1)));
        Self {
            name,
            source,
            state,
        }
    }

    pub fn state(&self) -> PaginationState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PaginationState<T>> {
        self.state.subscribe()
    }

    /// Replace the collection with its first page.
    pub async fn load(&self) -> FetchOutcome {
        let mut limit = 0;
        let started = self.state.send_if_modified(|state| {
            if state.loading() {
                return false;
            }
            state.phase = CollectionPhase::Loading;
            state.offset = 0;
            state.items.clear();
            state.total = 0;
            state.has_more = false;
            state.error = None;
            limit = state.limit;
            true
        });
        if !started {
            tracing::debug!(collection = self.name, "Load dropped, fetch already in flight");
            return FetchOutcome::Rejected;
        }

        tracing::debug!(collection = self.name, limit, "Loading first page");
        let guard = CancelGuard::new(|| {
            tracing::debug!(collection = self.name, "Load cancelled before completion");
            self.state.send_modify(|state| {
                state.phase = CollectionPhase::Idle;
                state.offset = 0;
            });
        });
        let result = self.source.fetch_page(limit, 0).await;
        guard.disarm();

        match result {
            Ok(page) => {
                let count = page.items.len();
                self.state.send_modify(|state| {
                    state.has_more = page.has_more();
                    state.total = page.total;
                    state.items = page.items;
                    state.phase = CollectionPhase::Loaded;
                });
                tracing::info!(collection = self.name, count, "Collection loaded");
                FetchOutcome::Applied { count }
            }
            Err(e) => {
                tracing::error!(collection = self.name, error = %e, "Failed to load collection");
                self.state.send_modify(|state| {
                    state.phase = CollectionPhase::Failed;
                    state.error = Some(e.clone());
                });
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Append the next page.
    ///
    /// On failure the offset is rolled back and `has_more` is left alone, so
    /// calling again retries the same page.
    pub async fn load_more(&self) -> FetchOutcome {
        let mut request = None;
        let mut in_flight = false;
        self.state.send_if_modified(|state| {
            if state.loading() {
                in_flight = true;
                return false;
            }
            if !state.has_more {
                return false;
            }
            let previous_offset = state.offset;
            state.offset = previous_offset + state.limit;
            state.phase = CollectionPhase::LoadingMore;
            state.error = None;
            request = Some((previous_offset, state.offset, state.limit));
            true
        });

        let Some((previous_offset, offset, limit)) = request else {
            if in_flight {
                tracing::debug!(collection = self.name, "Load more dropped, fetch already in flight");
                return FetchOutcome::Rejected;
            }
            return FetchOutcome::Skipped;
        };

        tracing::debug!(collection = self.name, offset, limit, "Loading next page");
        let guard = CancelGuard::new(|| {
            tracing::debug!(
                collection = self.name,
                offset,
                "Load more cancelled, rolling back offset"
            );
            self.state.send_modify(|state| {
                state.offset = previous_offset;
                state.phase = CollectionPhase::Loaded;
            });
        });
        let result = self.source.fetch_page(limit, offset).await;
        guard.disarm();

        match result {
            Ok(page) => {
                let count = page.items.len();
                self.apply_next_page(page, offset);
                tracing::info!(collection = self.name, count, offset, "Appended page");
                FetchOutcome::Applied { count }
            }
            Err(e) => {
                tracing::error!(
                    collection = self.name,
                    offset,
                    error = %e,
                    "Failed to load more, rolling back offset"
                );
                self.state.send_modify(|state| {
                    state.offset = previous_offset;
                    state.phase = CollectionPhase::Loaded;
                    state.error = Some(e.clone());
                });
                FetchOutcome::Failed(e)
            }
        }
    }

    fn apply_next_page(&self, page: Page<T>, requested_offset: u32) {
        if page.offset != requested_offset {
            tracing::warn!(
                collection = self.name,
                requested_offset,
                returned_offset = page.offset,
                "Catalog returned a page for a different offset"
            );
        }
        self.state.send_modify(|state| {
            state.has_more = page.has_more();
            state.total = page.total;
            state.items.extend(page.items);
            state.phase = CollectionPhase::Loaded;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::model::mock::{self, ScriptedPages};
    use crate::model::Playlist;

    fn sample(prefix: &str, n: usize) -> Vec<Playlist> {
        (0..n).map(|i| mock::playlist(&format!("{}{}", prefix, i))).collect()
    }

    fn collection(source: &Arc<ScriptedPages<Playlist>>) -> PaginatedCollection<Playlist> {
        PaginatedCollection::new("playlists", source.clone(), 20)
    }

    #[tokio::test]
    async fn starts_idle_and_empty() {
        let source = Arc::new(ScriptedPages::new());
        let playlists = collection(&source);
        let state = playlists.state();
        assert_eq!(state.phase, CollectionPhase::Idle);
        assert!(state.items.is_empty());
        assert!(!state.has_more);
    }

    #[tokio::test]
    async fn load_replaces_items_and_derives_has_more() {
        let source = Arc::new(ScriptedPages::new());
        source.push_page(mock::page(sample("a", 20), 20, 0, 45)).await;
        let playlists = collection(&source);

        assert_eq!(playlists.load().await, FetchOutcome::Applied { count: 20 });

        let state = playlists.state();
        assert_eq!(state.phase, CollectionPhase::Loaded);
        assert_eq!(state.items.len(), 20);
        assert_eq!(state.offset, 0);
        assert_eq!(state.total, 45);
        assert!(state.has_more);
        assert_eq!(source.calls().await, vec![(20, 0)]);
    }

    #[tokio::test]
    async fn item_count_is_sum_of_applied_pages() {
        let source = Arc::new(ScriptedPages::new());
        source.push_page(mock::page(sample("a", 20), 20, 0, 47)).await;
        source.push_page(mock::page(sample("b", 20), 20, 20, 47)).await;
        source.push_page(mock::page(sample("c", 7), 20, 40, 47)).await;
        let playlists = collection(&source);

        playlists.load().await;
        playlists.load_more().await;
        playlists.load_more().await;

        let state = playlists.state();
        assert_eq!(state.items.len(), 20 + 20 + 7);
        assert_eq!(state.items[20].id, "b0");
        assert_eq!(state.items[46].id, "c6");
        assert!(!state.has_more);
        assert_eq!(state.offset, 40);
        assert_eq!(source.calls().await, vec![(20, 0), (20, 20), (20, 40)]);

        // Exhausted: further calls do nothing and hit no source.
        assert_eq!(playlists.load_more().await, FetchOutcome::Skipped);
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test]
    async fn failed_load_more_rolls_back_and_retry_succeeds() {
        let source = Arc::new(ScriptedPages::new());
        source.push_page(mock::page(sample("a", 20), 20, 0, 40)).await;
        source.push_error(CatalogError::network("connection reset")).await;
        source.push_page(mock::page(sample("b", 20), 20, 20, 40)).await;
        let playlists = collection(&source);

        playlists.load().await;
        let before = playlists.state();

        let outcome = playlists.load_more().await;
        assert!(matches!(outcome, FetchOutcome::Failed(CatalogError::Network { .. })));

        let after = playlists.state();
        assert_eq!(after.offset, before.offset);
        assert_eq!(after.has_more, before.has_more);
        assert_eq!(after.items, before.items);
        assert_eq!(after.phase, CollectionPhase::Loaded);
        assert!(after.error.is_some());

        assert_eq!(playlists.load_more().await, FetchOutcome::Applied { count: 20 });
        let retried = playlists.state();
        assert_eq!(retried.items.len(), 40);
        assert!(retried.error.is_none());
        assert!(!retried.has_more);
        // The retry asked for the same page as the failed attempt.
        assert_eq!(source.calls().await, vec![(20, 0), (20, 20), (20, 20)]);
    }

    #[tokio::test]
    async fn failed_load_leaves_collection_empty() {
        let source = Arc::new(ScriptedPages::new());
        source.push_page(mock::page(sample("a", 20), 20, 0, 40)).await;
        source.push_error(CatalogError::Auth { status: 401 }).await;
        let playlists = collection(&source);

        playlists.load().await;
        let outcome = playlists.load().await;
        assert_eq!(outcome, FetchOutcome::Failed(CatalogError::Auth { status: 401 }));

        let state = playlists.state();
        assert_eq!(state.phase, CollectionPhase::Failed);
        assert!(state.items.is_empty());
        assert!(!state.loading());
        assert!(state.error.as_ref().is_some_and(CatalogError::is_auth));

        // Nothing to extend after a failed reset.
        assert_eq!(playlists.load_more().await, FetchOutcome::Skipped);
    }

    #[tokio::test]
    async fn load_more_before_load_is_a_no_op() {
        let source = Arc::new(ScriptedPages::<Playlist>::new());
        let playlists = collection(&source);
        assert_eq!(playlists.load_more().await, FetchOutcome::Skipped);
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn second_call_while_in_flight_is_dropped() {
        let source = Arc::new(ScriptedPages::new());
        source.push_page(mock::page(sample("a", 20), 20, 0, 60)).await;
        let pending = source.push_deferred().await;
        let playlists = Arc::new(collection(&source));

        playlists.load().await;

        let background = playlists.clone();
        let first = tokio::spawn(async move { background.load_more().await });
        let mut rx = playlists.subscribe();
        rx.wait_for(|s| s.phase == CollectionPhase::LoadingMore).await.unwrap();

        assert!(playlists.state().loading());
        assert_eq!(playlists.load_more().await, FetchOutcome::Rejected);
        assert_eq!(playlists.load().await, FetchOutcome::Rejected);

        pending
            .send(Ok(mock::page(sample("b", 20), 20, 20, 60)))
            .unwrap();
        assert_eq!(first.await.unwrap(), FetchOutcome::Applied { count: 20 });

        let state = playlists.state();
        assert_eq!(state.items.len(), 40);
        assert_eq!(state.offset, 20);
        assert!(state.has_more);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn subscribers_see_loading_then_loaded() {
        let source = Arc::new(ScriptedPages::new());
        let pending = source.push_deferred().await;
        let playlists = Arc::new(collection(&source));
        let mut rx = playlists.subscribe();

        let background = playlists.clone();
        let task = tokio::spawn(async move { background.load().await });

        rx.wait_for(|s| s.phase == CollectionPhase::Loading).await.unwrap();
        pending.send(Ok(mock::page(sample("a", 3), 20, 0, 3))).unwrap();
        task.await.unwrap();

        let state = rx.wait_for(|s| s.phase == CollectionPhase::Loaded).await.unwrap().clone();
        assert_eq!(state.items.len(), 3);
        assert!(!state.has_more);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_load_more_rolls_back_and_can_be_retried() {
        let source = Arc::new(ScriptedPages::new());
        source.push_page(mock::page(sample("a", 20), 20, 0, 60)).await;
        let _unanswered = source.push_deferred().await;
        source.push_page(mock::page(sample("b", 20), 20, 20, 60)).await;
        let playlists = collection(&source);

        playlists.load().await;
        let timed_out = tokio::time::timeout(Duration::from_millis(50), playlists.load_more()).await;
        assert!(timed_out.is_err());

        let state = playlists.state();
        assert_eq!(state.phase, CollectionPhase::Loaded);
        assert_eq!(state.offset, 0);
        assert_eq!(state.items.len(), 20);
        assert!(state.has_more);
        assert!(!state.loading());

        assert_eq!(playlists.load_more().await, FetchOutcome::Applied { count: 20 });
        assert_eq!(playlists.state().items.len(), 40);
        assert_eq!(source.calls().await, vec![(20, 0), (20, 20), (20, 20)]);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_load_leaves_collection_loadable() {
        let source = Arc::new(ScriptedPages::new());
        let _unanswered = source.push_deferred().await;
        source.push_page(mock::page(sample("a", 5), 20, 0, 5)).await;
        let playlists = collection(&source);

        let timed_out = tokio::time::timeout(Duration::from_millis(50), playlists.load()).await;
        assert!(timed_out.is_err());
        assert_eq!(playlists.state().phase, CollectionPhase::Idle);

        assert_eq!(playlists.load().await, FetchOutcome::Applied { count: 5 });
        assert_eq!(playlists.state().phase, CollectionPhase::Loaded);
    }
}
