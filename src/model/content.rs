//! Response envelopes for search and browse endpoints

use std::collections::BTreeMap;

use serde::Deserialize;

use super::types::{Album, Artist, CatalogRecord, Category, Page, Track};

/// Body of `GET /v1/search`; only requested categories are present
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    pub tracks: Option<Page<Track>>,
    pub artists: Option<Page<Artist>>,
    pub albums: Option<Page<Album>>,
}

impl SearchResponse {
    /// Page for one category as generic records
    pub fn page(&self, category: Category) -> Option<Page<CatalogRecord>> {
        match category {
            Category::Track => self.tracks.clone().map(|p| p.map(CatalogRecord::Track)),
            Category::Artist => self.artists.clone().map(|p| p.map(CatalogRecord::Artist)),
            Category::Album => self.albums.clone().map(|p| p.map(CatalogRecord::Album)),
        }
    }

    pub fn into_pages(self) -> BTreeMap<Category, Page<CatalogRecord>> {
        let mut pages = BTreeMap::new();
        if let Some(page) = self.tracks {
            pages.insert(Category::Track, page.map(CatalogRecord::Track));
        }
        if let Some(page) = self.artists {
            pages.insert(Category::Artist, page.map(CatalogRecord::Artist));
        }
        if let Some(page) = self.albums {
            pages.insert(Category::Album, page.map(CatalogRecord::Album));
        }
        pages
    }

    pub fn total_items(&self) -> usize {
        self.tracks.as_ref().map_or(0, Page::len)
            + self.artists.as_ref().map_or(0, Page::len)
            + self.albums.as_ref().map_or(0, Page::len)
    }
}

/// Body of `GET /v1/browse/new-releases`
#[derive(Clone, Debug, Deserialize)]
pub struct NewReleasesResponse {
    pub albums: Page<Album>,
}

/// Body of a track-only search
#[derive(Clone, Debug, Deserialize)]
pub struct TrackSearchResponse {
    pub tracks: Page<Track>,
}
