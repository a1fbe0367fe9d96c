//! Seams between controllers and the catalog client
//!
//! Controllers only see these traits, so a scripted source can stand in for
//! the network in tests.

use async_trait::async_trait;

use crate::error::Result;

use super::catalog_client::CatalogApiClient;
use super::content::SearchResponse;
use super::types::{Album, Category, Page, Playlist, UserProfile};

/// Fetches one page of an offset-paginated collection
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch_page(&self, limit: u32, offset: u32) -> Result<Page<T>>;
}

/// Runs a multi-category search
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str, categories: &[Category], limit: u32)
    -> Result<SearchResponse>;
}

/// Fetches a single record
#[async_trait]
pub trait ResourceSource<T>: Send + Sync {
    async fn fetch(&self) -> Result<T>;
}

#[async_trait]
impl SearchBackend for CatalogApiClient {
    async fn search(
        &self,
        query: &str,
        categories: &[Category],
        limit: u32,
    ) -> Result<SearchResponse> {
        CatalogApiClient::search(self, query, categories, limit).await
    }
}

/// The signed-in user's playlists
pub struct UserPlaylists(pub CatalogApiClient);

#[async_trait]
impl PageSource<Playlist> for UserPlaylists {
    async fn fetch_page(&self, limit: u32, offset: u32) -> Result<Page<Playlist>> {
        self.0.fetch_user_playlists(limit, offset).await
    }
}

/// Newly released albums
pub struct NewReleases(pub CatalogApiClient);

#[async_trait]
impl PageSource<Album> for NewReleases {
    async fn fetch_page(&self, limit: u32, offset: u32) -> Result<Page<Album>> {
        self.0.fetch_new_releases(limit, offset).await
    }
}

/// The signed-in user's profile
pub struct CurrentUser(pub CatalogApiClient);

#[async_trait]
impl ResourceSource<UserProfile> for CurrentUser {
    async fn fetch(&self) -> Result<UserProfile> {
        self.0.fetch_user_profile().await
    }
}
