//! Mock catalog backend for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::BackendError;
use crate::catalog::{
    AlbumRecord, ArtistCandidate, ArtistRecord, CatalogApi, CatalogQueueItem, CommandRecord,
    NewArtist, Profile, RootFolder,
};

/// A recorded call against [`MockCatalogApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    LookupArtists(String),
    ListArtists,
    /// Foreign id of the artist being created.
    CreateArtist(String),
    DeleteArtist(i64),
    ListAlbums(i64),
    MonitorAlbums(Vec<i64>, bool),
    AlbumSearch(Vec<i64>),
    ListRootFolders,
    ListQualityProfiles,
    ListMetadataProfiles,
    Queue,
    SystemStatus,
}

/// Operations that can be made to fail with [`MockCatalogApi::fail_on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOperation {
    LookupArtists,
    ListArtists,
    CreateArtist,
    DeleteArtist,
    ListAlbums,
    MonitorAlbums,
    AlbumSearch,
    ListRootFolders,
    Queue,
    SystemStatus,
}

/// Album that becomes visible after a number of `list_albums` calls.
#[derive(Debug, Clone)]
struct PendingAlbum {
    album: AlbumRecord,
    misses_left: u32,
}

#[derive(Debug)]
struct MockCatalogState {
    lookup_results: Vec<ArtistCandidate>,
    artists: Vec<ArtistRecord>,
    albums: Vec<AlbumRecord>,
    pending_albums: Vec<PendingAlbum>,
    /// Albums that appear once an artist with this foreign id is created.
    albums_by_foreign_id: HashMap<String, Vec<String>>,
    root_folders: Vec<RootFolder>,
    quality_profiles: Vec<Profile>,
    metadata_profiles: Vec<Profile>,
    queue: Vec<CatalogQueueItem>,
    created: Vec<NewArtist>,
    deleted: Vec<i64>,
    next_artist_id: i64,
    next_album_id: i64,
    next_command_id: i64,
}

impl Default for MockCatalogState {
    fn default() -> Self {
        Self {
            lookup_results: Vec::new(),
            artists: Vec::new(),
            albums: Vec::new(),
            pending_albums: Vec::new(),
            albums_by_foreign_id: HashMap::new(),
            root_folders: vec![RootFolder {
                id: 1,
                path: "/music".to_string(),
            }],
            quality_profiles: vec![Profile {
                id: 1,
                name: "Lossless".to_string(),
            }],
            metadata_profiles: vec![Profile {
                id: 1,
                name: "Standard".to_string(),
            }],
            queue: Vec::new(),
            created: Vec::new(),
            deleted: Vec::new(),
            next_artist_id: 1,
            next_album_id: 100,
            next_command_id: 1,
        }
    }
}

impl MockCatalogState {
    fn insert_album(&mut self, artist_id: i64, title: &str) -> AlbumRecord {
        let album = self.new_album(artist_id, title);
        self.albums.push(album.clone());
        album
    }

    fn new_album(&mut self, artist_id: i64, title: &str) -> AlbumRecord {
        let id = self.next_album_id;
        self.next_album_id += 1;
        AlbumRecord {
            id,
            title: title.to_string(),
            artist_id,
            monitored: false,
            foreign_album_id: None,
        }
    }
}

/// In-memory catalog backend.
///
/// Records every call, supports albums that show up late, and can be told
/// to fail specific operations.
///
/// # Example
///
/// ```rust,ignore
/// let api = Arc::new(MockCatalogApi::new());
/// api.set_lookup_results(vec![fixtures::artist_candidate("Low", "mb-low")]).await;
/// api.set_albums_for_foreign_id("mb-low", vec!["HEY WHAT"]).await;
///
/// // ... run an acquisition ...
///
/// assert_eq!(api.created_artists().await.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockCatalogApi {
    state: Arc<RwLock<MockCatalogState>>,
    calls: Arc<RwLock<Vec<CatalogCall>>>,
    failing: Arc<RwLock<HashSet<CatalogOperation>>>,
}

impl MockCatalogApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<CatalogCall> {
        self.calls.read().await.clone()
    }

    /// Make every later call of `operation` fail with HTTP 500.
    pub async fn fail_on(&self, operation: CatalogOperation) {
        self.failing.write().await.insert(operation);
    }

    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
    }

    pub async fn set_lookup_results(&self, results: Vec<ArtistCandidate>) {
        self.state.write().await.lookup_results = results;
    }

    pub async fn set_root_folders(&self, folders: Vec<RootFolder>) {
        self.state.write().await.root_folders = folders;
    }

    pub async fn set_quality_profiles(&self, profiles: Vec<Profile>) {
        self.state.write().await.quality_profiles = profiles;
    }

    pub async fn set_queue(&self, items: Vec<CatalogQueueItem>) {
        self.state.write().await.queue = items;
    }

    /// Seed a local artist without recording a call.
    pub async fn add_artist(&self, name: &str, foreign_id: &str) -> ArtistRecord {
        let mut state = self.state.write().await;
        let artist = ArtistRecord {
            id: state.next_artist_id,
            artist_name: name.to_string(),
            foreign_artist_id: foreign_id.to_string(),
            monitored: false,
        };
        state.next_artist_id += 1;
        state.artists.push(artist.clone());
        artist
    }

    /// Seed an album that is visible right away.
    pub async fn add_album(&self, artist_id: i64, title: &str) -> AlbumRecord {
        self.state.write().await.insert_album(artist_id, title)
    }

    /// Seed an album that stays hidden for the first `misses` album listings
    /// of its artist.
    pub async fn add_album_after_checks(&self, artist_id: i64, title: &str, misses: u32) {
        let mut state = self.state.write().await;
        let album = state.new_album(artist_id, title);
        state.pending_albums.push(PendingAlbum {
            album,
            misses_left: misses,
        });
    }

    /// Albums the backend populates when an artist with `foreign_id` is added.
    pub async fn set_albums_for_foreign_id(&self, foreign_id: &str, titles: Vec<&str>) {
        self.state.write().await.albums_by_foreign_id.insert(
            foreign_id.to_string(),
            titles.into_iter().map(String::from).collect(),
        );
    }

    /// Bodies of successful `create_artist` calls.
    pub async fn created_artists(&self) -> Vec<NewArtist> {
        self.state.read().await.created.clone()
    }

    /// Ids removed by successful `delete_artist` calls.
    pub async fn deleted_artists(&self) -> Vec<i64> {
        self.state.read().await.deleted.clone()
    }

    pub async fn artists(&self) -> Vec<ArtistRecord> {
        self.state.read().await.artists.clone()
    }

    async fn record(
        &self,
        call: CatalogCall,
        operation: Option<CatalogOperation>,
    ) -> Result<(), BackendError> {
        self.calls.write().await.push(call);
        match operation {
            Some(op) if self.failing.read().await.contains(&op) => Err(BackendError::Http {
                status: 500,
                message: format!("mock failure: {op:?}"),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogApi for MockCatalogApi {
    async fn lookup_artists(&self, term: &str) -> Result<Vec<ArtistCandidate>, BackendError> {
        self.record(
            CatalogCall::LookupArtists(term.to_string()),
            Some(CatalogOperation::LookupArtists),
        )
        .await?;
        Ok(self.state.read().await.lookup_results.clone())
    }

    async fn list_artists(&self) -> Result<Vec<ArtistRecord>, BackendError> {
        self.record(CatalogCall::ListArtists, Some(CatalogOperation::ListArtists))
            .await?;
        Ok(self.state.read().await.artists.clone())
    }

    async fn create_artist(&self, artist: &NewArtist) -> Result<ArtistRecord, BackendError> {
        self.record(
            CatalogCall::CreateArtist(artist.foreign_artist_id.clone()),
            Some(CatalogOperation::CreateArtist),
        )
        .await?;

        let mut state = self.state.write().await;
        if state
            .artists
            .iter()
            .any(|a| a.foreign_artist_id == artist.foreign_artist_id)
        {
            return Err(BackendError::Http {
                status: 400,
                message: "This artist has already been added".to_string(),
            });
        }

        let record = ArtistRecord {
            id: state.next_artist_id,
            artist_name: artist.artist_name.clone(),
            foreign_artist_id: artist.foreign_artist_id.clone(),
            monitored: artist.monitored,
        };
        state.next_artist_id += 1;
        state.artists.push(record.clone());
        state.created.push(artist.clone());

        let titles = state
            .albums_by_foreign_id
            .get(&artist.foreign_artist_id)
            .cloned()
            .unwrap_or_default();
        for title in titles {
            state.insert_album(record.id, &title);
        }
        Ok(record)
    }

    async fn delete_artist(&self, artist_id: i64) -> Result<(), BackendError> {
        self.record(
            CatalogCall::DeleteArtist(artist_id),
            Some(CatalogOperation::DeleteArtist),
        )
        .await?;

        let mut state = self.state.write().await;
        state.artists.retain(|a| a.id != artist_id);
        state.albums.retain(|a| a.artist_id != artist_id);
        state.pending_albums.retain(|p| p.album.artist_id != artist_id);
        state.deleted.push(artist_id);
        Ok(())
    }

    async fn list_albums(&self, artist_id: i64) -> Result<Vec<AlbumRecord>, BackendError> {
        self.record(
            CatalogCall::ListAlbums(artist_id),
            Some(CatalogOperation::ListAlbums),
        )
        .await?;

        let mut state = self.state.write().await;
        let mut visible = Vec::new();
        for pending in state.pending_albums.iter_mut() {
            if pending.album.artist_id != artist_id {
                continue;
            }
            if pending.misses_left == 0 {
                visible.push(pending.album.clone());
            } else {
                pending.misses_left -= 1;
            }
        }
        state
            .pending_albums
            .retain(|p| !visible.iter().any(|v| v.id == p.album.id));
        state.albums.extend(visible);

        Ok(state
            .albums
            .iter()
            .filter(|a| a.artist_id == artist_id)
            .cloned()
            .collect())
    }

    async fn monitor_albums(
        &self,
        album_ids: &[i64],
        monitored: bool,
    ) -> Result<(), BackendError> {
        self.record(
            CatalogCall::MonitorAlbums(album_ids.to_vec(), monitored),
            Some(CatalogOperation::MonitorAlbums),
        )
        .await?;

        let mut state = self.state.write().await;
        for album in state.albums.iter_mut() {
            if album_ids.contains(&album.id) {
                album.monitored = monitored;
            }
        }
        Ok(())
    }

    async fn album_search(&self, album_ids: &[i64]) -> Result<CommandRecord, BackendError> {
        self.record(
            CatalogCall::AlbumSearch(album_ids.to_vec()),
            Some(CatalogOperation::AlbumSearch),
        )
        .await?;

        let mut state = self.state.write().await;
        let id = state.next_command_id;
        state.next_command_id += 1;
        Ok(CommandRecord {
            id,
            name: "AlbumSearch".to_string(),
            status: "queued".to_string(),
        })
    }

    async fn list_root_folders(&self) -> Result<Vec<RootFolder>, BackendError> {
        self.record(
            CatalogCall::ListRootFolders,
            Some(CatalogOperation::ListRootFolders),
        )
        .await?;
        Ok(self.state.read().await.root_folders.clone())
    }

    async fn list_quality_profiles(&self) -> Result<Vec<Profile>, BackendError> {
        self.record(CatalogCall::ListQualityProfiles, None).await?;
        Ok(self.state.read().await.quality_profiles.clone())
    }

    async fn list_metadata_profiles(&self) -> Result<Vec<Profile>, BackendError> {
        self.record(CatalogCall::ListMetadataProfiles, None).await?;
        Ok(self.state.read().await.metadata_profiles.clone())
    }

    async fn queue(&self) -> Result<Vec<CatalogQueueItem>, BackendError> {
        self.record(CatalogCall::Queue, Some(CatalogOperation::Queue))
            .await?;
        Ok(self.state.read().await.queue.clone())
    }

    async fn system_status(&self) -> Result<(), BackendError> {
        self.record(CatalogCall::SystemStatus, Some(CatalogOperation::SystemStatus))
            .await
    }
}
