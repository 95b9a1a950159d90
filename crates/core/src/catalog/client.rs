//! Catalog backend API seam and its HTTP implementation.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Method;

use crate::backend::{BackendError, BackendKind, HttpBackend};
use crate::config::BackendConfig;

use super::types::{
    AlbumRecord, AlbumSearchCommand, ArtistCandidate, ArtistRecord, CatalogQueueItem,
    CommandRecord, MonitorAlbums, NewArtist, Profile, QueuePage, RootFolder,
};

/// Operations the acquisition pipeline needs from a catalog backend.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Search external metadata for artists matching `term`.
    async fn lookup_artists(&self, term: &str) -> Result<Vec<ArtistCandidate>, BackendError>;

    /// All artists known locally.
    async fn list_artists(&self) -> Result<Vec<ArtistRecord>, BackendError>;

    async fn create_artist(&self, artist: &NewArtist) -> Result<ArtistRecord, BackendError>;

    async fn delete_artist(&self, artist_id: i64) -> Result<(), BackendError>;

    /// Albums of one artist.
    async fn list_albums(&self, artist_id: i64) -> Result<Vec<AlbumRecord>, BackendError>;

    async fn monitor_albums(&self, album_ids: &[i64], monitored: bool)
        -> Result<(), BackendError>;

    /// Start an album search, which grabs a release when one is found.
    async fn album_search(&self, album_ids: &[i64]) -> Result<CommandRecord, BackendError>;

    async fn list_root_folders(&self) -> Result<Vec<RootFolder>, BackendError>;

    async fn list_quality_profiles(&self) -> Result<Vec<Profile>, BackendError>;

    async fn list_metadata_profiles(&self) -> Result<Vec<Profile>, BackendError>;

    /// Current transfer queue.
    async fn queue(&self) -> Result<Vec<CatalogQueueItem>, BackendError>;

    /// Lightweight reachability probe.
    async fn system_status(&self) -> Result<(), BackendError>;
}

/// Queue entries requested per page.
pub const QUEUE_PAGE_SIZE: usize = 1000;

/// HTTP client for the catalog backend. The API key travels as a query
/// parameter.
#[derive(Debug, Clone)]
pub struct CatalogHttpClient {
    http: HttpBackend,
    queue_page_size: usize,
}

impl CatalogHttpClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            http: HttpBackend::new(BackendKind::Catalog, config)?,
            queue_page_size: QUEUE_PAGE_SIZE,
        })
    }

    pub fn with_queue_page_size(mut self, page_size: usize) -> Self {
        self.queue_page_size = page_size.max(1);
        self
    }
}

#[async_trait]
impl CatalogApi for CatalogHttpClient {
    async fn lookup_artists(&self, term: &str) -> Result<Vec<ArtistCandidate>, BackendError> {
        self.http
            .get("/artist/lookup", &[("term", term.to_string())])
            .await
    }

    async fn list_artists(&self) -> Result<Vec<ArtistRecord>, BackendError> {
        self.http.get("/artist", &[]).await
    }

    async fn create_artist(&self, artist: &NewArtist) -> Result<ArtistRecord, BackendError> {
        self.http.post("/artist", artist).await
    }

    async fn delete_artist(&self, artist_id: i64) -> Result<(), BackendError> {
        self.http
            .delete(
                &format!("/artist/{artist_id}"),
                &[
                    ("deleteFiles", "false".to_string()),
                    ("addImportListExclusion", "false".to_string()),
                ],
            )
            .await
    }

    async fn list_albums(&self, artist_id: i64) -> Result<Vec<AlbumRecord>, BackendError> {
        self.http
            .get("/album", &[("artistId", artist_id.to_string())])
            .await
    }

    async fn monitor_albums(
        &self,
        album_ids: &[i64],
        monitored: bool,
    ) -> Result<(), BackendError> {
        let body = MonitorAlbums {
            album_ids: album_ids.to_vec(),
            monitored,
        };
        self.http
            .request_empty(Method::PUT, "/album/monitor", Some(&body))
            .await
    }

    async fn album_search(&self, album_ids: &[i64]) -> Result<CommandRecord, BackendError> {
        self.http
            .post("/command", &AlbumSearchCommand::new(album_ids.to_vec()))
            .await
    }

    async fn list_root_folders(&self) -> Result<Vec<RootFolder>, BackendError> {
        self.http.get("/rootfolder", &[]).await
    }

    async fn list_quality_profiles(&self) -> Result<Vec<Profile>, BackendError> {
        self.http.get("/qualityprofile", &[]).await
    }

    async fn list_metadata_profiles(&self) -> Result<Vec<Profile>, BackendError> {
        self.http.get("/metadataprofile", &[]).await
    }

    /// Reads pages until `totalRecords` entries were seen. An entry that
    /// shifts onto the next page while paging is kept once.
    async fn queue(&self) -> Result<Vec<CatalogQueueItem>, BackendError> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut page_number = 1usize;
        loop {
            let page: QueuePage = self
                .http
                .get(
                    "/queue",
                    &[
                        ("page", page_number.to_string()),
                        ("pageSize", self.queue_page_size.to_string()),
                    ],
                )
                .await?;
            let fetched = page.records.len();
            records.extend(page.records.into_iter().filter(|r| seen.insert(r.id)));

            let total_reached = page_number * self.queue_page_size >= page.total_records;
            if fetched < self.queue_page_size || total_reached {
                break;
            }
            page_number += 1;
        }
        Ok(records)
    }

    async fn system_status(&self) -> Result<(), BackendError> {
        let _: serde_json::Value = self.http.get("/system/status", &[]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_new_requires_api_key() {
        let err = CatalogHttpClient::new(&BackendConfig::new("http://lidarr:8686", "")).unwrap_err();
        assert!(matches!(err, BackendError::Configuration(_)));
    }

    #[test]
    fn test_new_with_valid_config() {
        assert!(CatalogHttpClient::new(&BackendConfig::new("http://lidarr:8686", "key")).is_ok());
    }

    /// Queue of `total` entries served `pageSize` at a time, counting requests.
    async fn spawn_paged_queue(total: usize) -> (String, Arc<AtomicUsize>) {
        use axum::extract::{Query, State};
        use axum::routing::get;
        use axum::Json;
        use serde_json::{json, Value};

        async fn queue(
            State((total, requests)): State<(usize, Arc<AtomicUsize>)>,
            Query(params): Query<HashMap<String, String>>,
        ) -> Json<Value> {
            requests.fetch_add(1, Ordering::SeqCst);
            let page: usize = params["page"].parse().unwrap();
            let size: usize = params["pageSize"].parse().unwrap();
            let records: Vec<Value> = ((page - 1) * size + 1..=(page * size).min(total))
                .map(|id| json!({"id": id, "title": format!("item {id}"), "size": 10.0, "sizeleft": 5.0}))
                .collect();
            Json(json!({"page": page, "pageSize": size, "totalRecords": total, "records": records}))
        }

        let requests = Arc::new(AtomicUsize::new(0));
        let app = axum::Router::new()
            .route("/api/v1/queue", get(queue))
            .with_state((total, requests.clone()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), requests)
    }

    #[tokio::test]
    async fn test_queue_reads_every_page() {
        let (url, requests) = spawn_paged_queue(5).await;
        let client = CatalogHttpClient::new(&BackendConfig::new(&url, "key"))
            .unwrap()
            .with_queue_page_size(2);

        let items = client.queue().await.unwrap();

        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(requests.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_queue_stops_after_exact_last_page() {
        let (url, requests) = spawn_paged_queue(4).await;
        let client = CatalogHttpClient::new(&BackendConfig::new(&url, "key"))
            .unwrap()
            .with_queue_page_size(2);

        assert_eq!(client.queue().await.unwrap().len(), 4);
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_queue_is_one_request() {
        let (url, requests) = spawn_paged_queue(0).await;
        let client = CatalogHttpClient::new(&BackendConfig::new(&url, "key")).unwrap();

        assert!(client.queue().await.unwrap().is_empty());
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }
}
