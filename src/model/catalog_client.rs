//! HTTP client for the catalog endpoints
//!
//! One attempt per call: no retries, no backoff. The status and body are
//! mapped onto `CatalogError` so callers can tell an expired credential from a
//! flaky connection.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::auth::RequestAuthorizer;
use crate::config::{CatalogConfig, validate_limit};
use crate::error::{CatalogError, Result};
use crate::{log_api_request, log_api_result};

use super::content::{NewReleasesResponse, SearchResponse, TrackSearchResponse};
use super::types::{Album, Category, Page, Playlist, Track, UserProfile};

const SEARCH_PATH: &str = "/v1/search";
const ME_PATH: &str = "/v1/me";
const MY_PLAYLISTS_PATH: &str = "/v1/me/playlists";
const NEW_RELEASES_PATH: &str = "/v1/browse/new-releases";

/// Catalog API client. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct CatalogApiClient {
    http: reqwest::Client,
    api_url: Arc<str>,
    authorizer: Arc<dyn RequestAuthorizer>,
}

impl CatalogApiClient {
    pub fn new(config: &CatalogConfig, authorizer: Arc<dyn RequestAuthorizer>) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        tracing::debug!(api_url = %config.api_url, "Catalog client initialized");

        Ok(Self {
            http,
            api_url: Arc::from(config.api_url.trim_end_matches('/')),
            authorizer,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Search the given categories in one request.
    ///
    /// The query must not be blank; a blank query is refused without touching
    /// the network.
    pub async fn search(
        &self,
        query: &str,
        categories: &[Category],
        limit: u32,
    ) -> Result<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::validation("search query must not be blank"));
        }
        if categories.is_empty() {
            return Err(CatalogError::validation("at least one category is required"));
        }
        validate_limit(limit)?;

        let types = Category::join(categories);
        log_api_request!("search", query, types = %types, limit);

        let result: Result<SearchResponse> = self
            .get_json(
                SEARCH_PATH,
                &[
                    ("q", query.to_string()),
                    ("type", types),
                    ("limit", limit.to_string()),
                ],
            )
            .await;
        log_api_result!("search", result);

        let response = result?;
        tracing::debug!(query, items = response.total_items(), "Search results received");
        Ok(response)
    }

    pub async fn search_tracks(&self, query: &str, limit: u32) -> Result<Page<Track>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::validation("search query must not be blank"));
        }
        validate_limit(limit)?;

        log_api_request!("search_tracks", query, limit);
        let result: Result<TrackSearchResponse> = self
            .get_json(
                SEARCH_PATH,
                &[
                    ("q", query.to_string()),
                    ("type", Category::Track.as_str().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await;
        log_api_result!("search_tracks", result);
        Ok(result?.tracks)
    }

    pub async fn fetch_new_releases(&self, limit: u32, offset: u32) -> Result<Page<Album>> {
        validate_limit(limit)?;

        log_api_request!("new_releases", limit, offset);
        let result: Result<NewReleasesResponse> = self
            .get_json(
                NEW_RELEASES_PATH,
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await;
        log_api_result!("new_releases", result);
        Ok(result?.albums)
    }

    pub async fn fetch_user_playlists(&self, limit: u32, offset: u32) -> Result<Page<Playlist>> {
        validate_limit(limit)?;

        log_api_request!("user_playlists", limit, offset);
        let result: Result<Page<Playlist>> = self
            .get_json(
                MY_PLAYLISTS_PATH,
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await;
        log_api_result!("user_playlists", result);
        result
    }

    pub async fn fetch_user_profile(&self) -> Result<UserProfile> {
        log_api_request!("user_profile");
        let result: Result<UserProfile> = self.get_json(ME_PATH, &[]).await;
        log_api_result!("user_profile", result);
        if let Ok(ref profile) = result {
            tracing::debug!(user_id = %profile.id, "Profile received");
        }
        result
    }

    async fn get_json<R: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<R> {
        let url = format!("{}{}", self.api_url, path);
        let request = self.http.get(&url).query(params);
        let request = self.authorizer.authorize(request).await;

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let err = CatalogError::from_status(status, &text);
            tracing::debug!(path, status = status.as_u16(), "Catalog returned error status");
            return Err(err);
        }

        serde_json::from_slice(&body).map_err(|e| {
            let excerpt: String = String::from_utf8_lossy(&body).chars().take(300).collect();
            tracing::warn!(
                path,
                error = %e,
                body = %excerpt,
                "Response did not match the expected shape"
            );
            CatalogError::malformed(path, e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::BearerToken;

    fn client() -> CatalogApiClient {
        // Nothing listens here; validation must fail before any connect attempt.
        let config = CatalogConfig::default().with_api_url("http://127.0.0.1:9");
        CatalogApiClient::new(&config, Arc::new(BearerToken::new("t"))).unwrap()
    }

    #[tokio::test]
    async fn blank_query_is_refused_locally() {
        let err = client().search("   ", &Category::ALL, 20).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn empty_category_list_is_refused() {
        let err = client().search("daft punk", &[], 20).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn oversized_limit_is_refused() {
        let err = client().fetch_user_playlists(51, 0).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let config = CatalogConfig::default().with_api_url("http://example.test/");
        let client = CatalogApiClient::new(&config, Arc::new(BearerToken::new("t"))).unwrap();
        assert_eq!(client.api_url(), "http://example.test");
    }
}
