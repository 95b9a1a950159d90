//! Catalog backend wire types.
//!
//! Field names follow the backend's camelCase JSON. Unknown fields are
//! ignored and most optional fields default, since lookup results vary
//! widely in completeness.

use serde::{Deserialize, Serialize};

/// External artist lookup result. Transient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistCandidate {
    pub artist_name: String,
    /// External metadata id; the identity of an artist on the backend.
    pub foreign_artist_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default)]
    pub images: Vec<ArtistImage>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Ratings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistImage {
    #[serde(default)]
    pub cover_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    #[serde(default)]
    pub votes: i64,
    #[serde(default)]
    pub value: f64,
}

/// Artist known to the backend. Unique by `foreign_artist_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistRecord {
    pub id: i64,
    pub artist_name: String,
    pub foreign_artist_id: String,
    #[serde(default)]
    pub monitored: bool,
}

/// Album owned by an artist. Appears some time after the artist is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumRecord {
    pub id: i64,
    pub title: String,
    pub artist_id: i64,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_album_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootFolder {
    pub id: i64,
    pub path: String,
}

/// Quality or metadata profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Body of `POST /artist`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArtist {
    pub artist_name: String,
    pub foreign_artist_id: String,
    pub quality_profile_id: i64,
    pub metadata_profile_id: i64,
    pub root_folder_path: String,
    pub monitored: bool,
    pub add_options: AddArtistOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    pub images: Vec<ArtistImage>,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddArtistOptions {
    /// Which albums to monitor: "all" or "none".
    pub monitor: String,
    pub search_for_missing_albums: bool,
}

/// Body of `POST /command`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSearchCommand {
    pub name: String,
    pub album_ids: Vec<i64>,
}

impl AlbumSearchCommand {
    pub fn new(album_ids: Vec<i64>) -> Self {
        Self {
            name: "AlbumSearch".to_string(),
            album_ids,
        }
    }
}

/// Body of `PUT /album/monitor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorAlbums {
    pub album_ids: Vec<i64>,
    pub monitored: bool,
}

/// Command as acknowledged by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// One entry of `GET /queue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQueueItem {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub size: f64,
    #[serde(default, rename = "sizeleft")]
    pub size_left: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_id: Option<i64>,
}

/// Paged wrapper around queue entries.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QueuePage {
    #[serde(default)]
    pub records: Vec<CatalogQueueItem>,
    /// Queue length across all pages. Zero when the backend omits it.
    #[serde(default, rename = "totalRecords")]
    pub total_records: usize,
}
