//! Model module - Catalog records and the client that fetches them
//!
//! - `types`: Record types and the `Page<T>` envelope
//! - `content`: Response envelopes (search, new releases)
//! - `catalog_client`: HTTP client for the catalog endpoints
//! - `source`: Traits the controllers fetch through, plus client adapters
//! - `mock`: Scripted sources for tests

mod types;
mod content;
mod catalog_client;
mod source;
pub mod mock;

// Re-export all public types for convenient access
pub use types::{
    Album, AlbumRef, Artist, ArtistRef, CatalogRecord, Category, ExplicitContent,
    ExternalUrls, Followers, Image, Page, Playlist, PlaylistOwner, Track, TrackCount,
    UserProfile,
};

pub use content::{NewReleasesResponse, SearchResponse, TrackSearchResponse};

pub use catalog_client::CatalogApiClient;

pub use source::{CurrentUser, NewReleases, PageSource, ResourceSource, SearchBackend, UserPlaylists};
