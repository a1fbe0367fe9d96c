//! Catalog record types and the page envelope
//!
//! These mirror the upstream JSON objects. Fields the upstream may send as
//! `null` are either `Option` or, for arrays, collapse to an empty `Vec`.

use serde::{Deserialize, Deserializer, Serialize};

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One bounded slice of a larger offset-addressed collection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(deserialize_with = "null_as_empty")]
    pub items: Vec<T>,
    pub total: u32,
    pub limit: u32,
    pub offset: u32,
    pub next: Option<String>,
    pub previous: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

impl<T> Page<T> {
    /// An empty page, used when a category is missing from a response.
    pub fn empty(limit: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            limit,
            offset: 0,
            next: None,
            previous: None,
            href: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
            next: self.next,
            previous: self.previous,
            href: self.href,
        }
    }
}

/// Result categories a search can span
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Track,
    Artist,
    Album,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Track, Category::Artist, Category::Album];

    /// Value used in the `type` query parameter
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Track => "track",
            Category::Artist => "artist",
            Category::Album => "album",
        }
    }

    /// Key of this category in a search response body
    pub fn response_key(self) -> &'static str {
        match self {
            Category::Track => "tracks",
            Category::Artist => "artists",
            Category::Album => "albums",
        }
    }

    pub fn join(categories: &[Category]) -> String {
        categories
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Followers {
    pub href: Option<String>,
    pub total: u64,
}

/// Artist reference embedded in tracks and albums
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

/// Album reference embedded in a track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<Image>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub artists: Vec<ArtistRef>,
    pub album: Option<AlbumRef>,
    pub duration_ms: u64,
    #[serde(default)]
    pub explicit: bool,
    pub popularity: Option<u32>,
    pub uri: String,
}

impl Track {
    pub fn artist_names(&self) -> String {
        join_names(&self.artists)
    }

    /// Tracks carry no artwork of their own; the album cover stands in.
    pub fn image_url(&self) -> Option<&str> {
        self.album
            .as_ref()
            .and_then(|album| first_url(&album.images))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<Image>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genres: Vec<String>,
    pub followers: Option<Followers>,
    pub popularity: Option<u32>,
    pub uri: String,
}

impl Artist {
    pub fn image_url(&self) -> Option<&str> {
        first_url(&self.images)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub album_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub artists: Vec<ArtistRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<Image>,
    pub release_date: Option<String>,
    pub total_tracks: Option<u32>,
    pub uri: String,
}

impl Album {
    pub fn artist_names(&self) -> String {
        join_names(&self.artists)
    }

    pub fn image_url(&self) -> Option<&str> {
        first_url(&self.images)
    }

    pub fn release_year(&self) -> Option<&str> {
        self.release_date.as_deref().and_then(|date| date.get(..4))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackCount {
    pub href: Option<String>,
    pub total: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<Image>,
    pub owner: PlaylistOwner,
    pub tracks: Option<TrackCount>,
    pub public: Option<bool>,
    #[serde(default)]
    pub collaborative: bool,
    pub uri: String,
}

impl Playlist {
    pub fn image_url(&self) -> Option<&str> {
        first_url(&self.images)
    }

    pub fn owner_name(&self) -> &str {
        self.owner
            .display_name
            .as_deref()
            .unwrap_or(&self.owner.id)
    }

    pub fn track_total(&self) -> u32 {
        self.tracks.as_ref().map(|t| t.total).unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExplicitContent {
    pub filter_enabled: bool,
    pub filter_locked: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub product: Option<String>,
    pub followers: Option<Followers>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<Image>,
    pub explicit_content: Option<ExplicitContent>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    pub uri: String,
}

impl UserProfile {
    pub fn image_url(&self) -> Option<&str> {
        first_url(&self.images)
    }

    pub fn follower_count(&self) -> u64 {
        self.followers.as_ref().map(|f| f.total).unwrap_or(0)
    }
}

/// Any record the catalog can return
#[derive(Clone, Debug, PartialEq)]
pub enum CatalogRecord {
    Track(Track),
    Artist(Artist),
    Album(Album),
    Playlist(Playlist),
    UserProfile(UserProfile),
}

impl CatalogRecord {
    pub fn id(&self) -> &str {
        match self {
            CatalogRecord::Track(t) => &t.id,
            CatalogRecord::Artist(a) => &a.id,
            CatalogRecord::Album(a) => &a.id,
            CatalogRecord::Playlist(p) => &p.id,
            CatalogRecord::UserProfile(u) => &u.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CatalogRecord::Track(t) => &t.name,
            CatalogRecord::Artist(a) => &a.name,
            CatalogRecord::Album(a) => &a.name,
            CatalogRecord::Playlist(p) => &p.name,
            CatalogRecord::UserProfile(u) => u.display_name.as_deref().unwrap_or(&u.id),
        }
    }
}

fn first_url(images: &[Image]) -> Option<&str> {
    images.first().map(|image| image.url.as_str())
}

fn join_names(artists: &[ArtistRef]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn playlist_page_tolerates_null_images() {
        let page: Page<Playlist> = serde_json::from_value(json!({
            "href": "https://api.spotify.com/v1/me/playlists?offset=0&limit=20",
            "items": [{
                "id": "p1",
                "name": "Road trip",
                "description": null,
                "images": null,
                "owner": { "id": "u1", "display_name": null },
                "tracks": { "href": null, "total": 12 },
                "public": false,
                "collaborative": false,
                "uri": "spotify:playlist:p1"
            }],
            "total": 41,
            "limit": 20,
            "offset": 0,
            "next": "https://api.spotify.com/v1/me/playlists?offset=20&limit=20",
            "previous": null
        }))
        .unwrap();

        assert!(page.has_more());
        let playlist = &page.items[0];
        assert!(playlist.images.is_empty());
        assert_eq!(playlist.owner_name(), "u1");
        assert_eq!(playlist.track_total(), 12);
    }

    #[test]
    fn last_page_has_no_more() {
        let page: Page<Album> = serde_json::from_value(json!({
            "items": [],
            "total": 0,
            "limit": 20,
            "offset": 0,
            "next": null,
            "previous": null
        }))
        .unwrap();
        assert!(!page.has_more());
        assert!(page.is_empty());
    }

    #[test]
    fn track_helpers_read_embedded_references() {
        let track: Track = serde_json::from_value(json!({
            "id": "t1",
            "name": "One More Time",
            "artists": [{ "id": "a1", "name": "Daft Punk" }, { "id": "a2", "name": "Romanthony" }],
            "album": {
                "id": "al1",
                "name": "Discovery",
                "images": [{ "url": "https://i.scdn.co/cover", "height": 640, "width": 640 }]
            },
            "duration_ms": 320357,
            "explicit": false,
            "popularity": 80,
            "uri": "spotify:track:t1"
        }))
        .unwrap();

        assert_eq!(track.artist_names(), "Daft Punk, Romanthony");
        assert_eq!(track.image_url(), Some("https://i.scdn.co/cover"));
    }

    #[test]
    fn category_wire_names() {
        assert_eq!(Category::join(&Category::ALL), "track,artist,album");
        assert_eq!(Category::Album.response_key(), "albums");
    }

    #[test]
    fn map_preserves_envelope() {
        let page = Page {
            items: vec![1, 2, 3],
            total: 30,
            limit: 3,
            offset: 6,
            next: Some("next".to_string()),
            previous: Some("prev".to_string()),
            href: None,
        };
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20, 30]);
        assert_eq!((mapped.total, mapped.limit, mapped.offset), (30, 3, 6));
        assert!(mapped.has_more());
    }
}
