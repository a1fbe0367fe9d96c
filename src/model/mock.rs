//! Scripted sources for exercising controllers without a network.
//!
//! Each source replays queued replies in order. A reply can be ready
//! immediately or deferred until the test resolves it through a oneshot
//! sender, which makes it possible to control the order in which concurrent
//! requests complete.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, oneshot};

use crate::error::{CatalogError, Result};

use super::content::SearchResponse;
use super::source::{PageSource, ResourceSource, SearchBackend};
use super::types::{Album, AlbumRef, Artist, ArtistRef, Category, Page, Playlist, PlaylistOwner, Track, TrackCount};

enum Reply<R> {
    Ready(Result<R>),
    Deferred(oneshot::Receiver<Result<R>>),
}

struct Script<R> {
    replies: Mutex<VecDeque<Reply<R>>>,
    served: AtomicUsize,
}

impl<R> Script<R> {
    fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            served: AtomicUsize::new(0),
        }
    }

    async fn push(&self, reply: Reply<R>) {
        self.replies.lock().await.push_back(reply);
    }

    async fn push_deferred(&self) -> oneshot::Sender<Result<R>> {
        let (tx, rx) = oneshot::channel();
        self.push(Reply::Deferred(rx)).await;
        tx
    }

    async fn next(&self) -> Result<R> {
        self.served.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().await.pop_front();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Deferred(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(CatalogError::network("deferred reply was dropped"))),
            None => Err(CatalogError::network("no scripted reply left")),
        }
    }
}

/// Scripted page source recording every `(limit, offset)` it is asked for
pub struct ScriptedPages<T> {
    script: Script<Page<T>>,
    calls: Mutex<Vec<(u32, u32)>>,
}

impl<T: Send> ScriptedPages<T> {
    pub fn new() -> Self {
        Self {
            script: Script::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn push_page(&self, page: Page<T>) {
        self.script.push(Reply::Ready(Ok(page))).await;
    }

    pub async fn push_error(&self, err: CatalogError) {
        self.script.push(Reply::Ready(Err(err))).await;
    }

    pub async fn push_deferred(&self) -> oneshot::Sender<Result<Page<T>>> {
        self.script.push_deferred().await
    }

    pub async fn calls(&self) -> Vec<(u32, u32)> {
        self.calls.lock().await.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script.served.load(Ordering::SeqCst)
    }
}

impl<T: Send> Default for ScriptedPages<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send> PageSource<T> for ScriptedPages<T> {
    async fn fetch_page(&self, limit: u32, offset: u32) -> Result<Page<T>> {
        self.calls.lock().await.push((limit, offset));
        self.script.next().await
    }
}

/// Scripted search backend recording every query it receives
pub struct ScriptedSearch {
    script: Script<SearchResponse>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    pub fn new() -> Self {
        Self {
            script: Script::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub async fn push_response(&self, response: SearchResponse) {
        self.script.push(Reply::Ready(Ok(response))).await;
    }

    pub async fn push_error(&self, err: CatalogError) {
        self.script.push(Reply::Ready(Err(err))).await;
    }

    pub async fn push_deferred(&self) -> oneshot::Sender<Result<SearchResponse>> {
        self.script.push_deferred().await
    }

    pub async fn queries(&self) -> Vec<String> {
        self.queries.lock().await.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script.served.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for ScriptedSearch {
    async fn search(
        &self,
        query: &str,
        _categories: &[Category],
        _limit: u32,
    ) -> Result<SearchResponse> {
        self.queries.lock().await.push(query.to_string());
        self.script.next().await
    }
}

/// Scripted single-record source
pub struct ScriptedResource<T> {
    script: Script<T>,
}

impl<T: Send> ScriptedResource<T> {
    pub fn new() -> Self {
        Self {
            script: Script::new(),
        }
    }

    pub async fn push_value(&self, value: T) {
        self.script.push(Reply::Ready(Ok(value))).await;
    }

    pub async fn push_error(&self, err: CatalogError) {
        self.script.push(Reply::Ready(Err(err))).await;
    }

    pub async fn push_deferred(&self) -> oneshot::Sender<Result<T>> {
        self.script.push_deferred().await
    }

    pub fn call_count(&self) -> usize {
        self.script.served.load(Ordering::SeqCst)
    }
}

impl<T: Send> Default for ScriptedResource<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send> ResourceSource<T> for ScriptedResource<T> {
    async fn fetch(&self) -> Result<T> {
        self.script.next().await
    }
}

/// Page at `offset` out of `total` items; `next` is set while items remain.
pub fn page<T>(items: Vec<T>, limit: u32, offset: u32, total: u32) -> Page<T> {
    let end = offset + items.len() as u32;
    Page {
        next: (end < total).then(|| format!("offset={}&limit={}", end, limit)),
        previous: (offset > 0).then(|| format!("offset={}&limit={}", offset.saturating_sub(limit), limit)),
        items,
        total,
        limit,
        offset,
        href: None,
    }
}

pub fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        name: format!("Track {}", id),
        artists: vec![artist_ref("artist")],
        album: Some(AlbumRef {
            id: format!("album-of-{}", id),
            name: format!("Album of {}", id),
            images: Vec::new(),
        }),
        duration_ms: 180_000,
        explicit: false,
        popularity: None,
        uri: format!("spotify:track:{}", id),
    }
}

pub fn artist(id: &str) -> Artist {
    Artist {
        id: id.to_string(),
        name: format!("Artist {}", id),
        images: Vec::new(),
        genres: Vec::new(),
        followers: None,
        popularity: None,
        uri: format!("spotify:artist:{}", id),
    }
}

pub fn album(id: &str) -> Album {
    Album {
        id: id.to_string(),
        name: format!("Album {}", id),
        album_type: Some("album".to_string()),
        artists: vec![artist_ref("artist")],
        images: Vec::new(),
        release_date: Some("2001-03-12".to_string()),
        total_tracks: Some(14),
        uri: format!("spotify:album:{}", id),
    }
}

pub fn playlist(id: &str) -> Playlist {
    Playlist {
        id: id.to_string(),
        name: format!("Playlist {}", id),
        description: None,
        images: Vec::new(),
        owner: PlaylistOwner {
            id: "owner".to_string(),
            display_name: Some("Owner".to_string()),
        },
        tracks: Some(TrackCount {
            href: None,
            total: 10,
        }),
        public: Some(true),
        collaborative: false,
        uri: format!("spotify:playlist:{}", id),
    }
}

/// Search response with `n` generated records per category, ids prefixed by `tag`
pub fn search_response(tag: &str, tracks: usize, artists: usize, albums: usize) -> SearchResponse {
    let limit = 20;
    SearchResponse {
        tracks: Some(page(
            (0..tracks).map(|i| track(&format!("{}-t{}", tag, i))).collect(),
            limit,
            0,
            tracks as u32,
        )),
        artists: Some(page(
            (0..artists).map(|i| artist(&format!("{}-ar{}", tag, i))).collect(),
            limit,
            0,
            artists as u32,
        )),
        albums: Some(page(
            (0..albums).map(|i| album(&format!("{}-al{}", tag, i))).collect(),
            limit,
            0,
            albums as u32,
        )),
    }
}

fn artist_ref(id: &str) -> ArtistRef {
    ArtistRef {
        id: id.to_string(),
        name: format!("Artist {}", id),
    }
}
