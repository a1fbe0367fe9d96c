//! Controller module - Data-access state owned on behalf of the views
//!
//! Each controller owns the state for one screen area and is the only thing
//! that mutates it. Views subscribe to snapshots.
//!
//! - `pagination`: Offset-paginated collections (playlists, new releases)
//! - `search`: Debounced multi-category search
//! - `resource`: Single records such as the user profile

mod pagination;
mod resource;
mod search;

use std::sync::Arc;

pub use pagination::{CollectionPhase, FetchOutcome, PaginatedCollection, PaginationState};
pub use resource::{ResourceController, ResourceState};
pub use search::{ResultBucket, SearchAggregator, SearchState, SearchView};

use crate::config::CatalogConfig;
use crate::model::{
    Album, CatalogApiClient, CurrentUser, NewReleases, Playlist, UserPlaylists, UserProfile,
};

/// Every controller the catalog screens need, wired to one client
#[derive(Clone)]
pub struct CatalogController {
    pub playlists: Arc<PaginatedCollection<Playlist>>,
    pub new_releases: Arc<PaginatedCollection<Album>>,
    pub profile: Arc<ResourceController<UserProfile>>,
    pub search: SearchAggregator,
}

impl CatalogController {
    pub fn new(client: CatalogApiClient, config: &CatalogConfig) -> Self {
        Self {
            playlists: Arc::new(PaginatedCollection::new(
                "playlists",
                Arc::new(UserPlaylists(client.clone())),
                config.page_limit,
            )),
            new_releases: Arc::new(PaginatedCollection::new(
                "new_releases",
                Arc::new(NewReleases(client.clone())),
                config.page_limit,
            )),
            profile: Arc::new(ResourceController::new(
                "profile",
                Arc::new(CurrentUser(client.clone())),
            )),
            search: SearchAggregator::new(
                Arc::new(client),
                config.search_debounce,
                config.search_limit,
            ),
        }
    }

    /// Load the profile and the first page of each collection concurrently.
    pub async fn load_initial(&self) -> [FetchOutcome; 3] {
        tracing::info!("Loading initial catalog views");
        let (profile, playlists, new_releases) = futures::join!(
            self.profile.load(),
            self.playlists.load(),
            self.new_releases.load()
        );
        [profile, playlists, new_releases]
    }
}
