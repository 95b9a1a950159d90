//! Peer backend API seam and its HTTP implementation.

use async_trait::async_trait;
use reqwest::Method;

use crate::backend::{BackendError, BackendKind, HttpBackend};
use crate::config::BackendConfig;

use super::types::{DownloadRequest, PeerResponse, SearchRequest, SearchSession, UserTransfers};

/// Operations the acquisition pipeline needs from a peer backend.
#[async_trait]
pub trait PeerApi: Send + Sync {
    async fn create_search(&self, request: &SearchRequest) -> Result<SearchSession, BackendError>;

    async fn get_search(&self, search_id: &str) -> Result<SearchSession, BackendError>;

    /// Per-peer file listings of a search.
    async fn search_responses(&self, search_id: &str) -> Result<Vec<PeerResponse>, BackendError>;

    async fn delete_search(&self, search_id: &str) -> Result<(), BackendError>;

    /// Queue `files` for download from `username` as one batch.
    async fn enqueue_downloads(
        &self,
        username: &str,
        files: &[DownloadRequest],
    ) -> Result<(), BackendError>;

    /// Active downloads grouped by user, then directory.
    async fn list_downloads(&self) -> Result<Vec<UserTransfers>, BackendError>;

    /// Lightweight reachability probe.
    async fn application(&self) -> Result<(), BackendError>;
}

/// HTTP client for the peer backend. The API key travels in a header.
#[derive(Debug, Clone)]
pub struct PeerHttpClient {
    http: HttpBackend,
}

impl PeerHttpClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            http: HttpBackend::new(BackendKind::Peer, config)?,
        })
    }
}

fn search_path(search_id: &str) -> String {
    format!("/searches/{}", urlencoding::encode(search_id))
}

#[async_trait]
impl PeerApi for PeerHttpClient {
    async fn create_search(&self, request: &SearchRequest) -> Result<SearchSession, BackendError> {
        self.http.post("/searches", request).await
    }

    async fn get_search(&self, search_id: &str) -> Result<SearchSession, BackendError> {
        self.http.get(&search_path(search_id), &[]).await
    }

    async fn search_responses(&self, search_id: &str) -> Result<Vec<PeerResponse>, BackendError> {
        self.http
            .get(&format!("{}/responses", search_path(search_id)), &[])
            .await
    }

    async fn delete_search(&self, search_id: &str) -> Result<(), BackendError> {
        self.http.delete(&search_path(search_id), &[]).await
    }

    async fn enqueue_downloads(
        &self,
        username: &str,
        files: &[DownloadRequest],
    ) -> Result<(), BackendError> {
        let path = format!("/transfers/downloads/{}", urlencoding::encode(username));
        self.http
            .request_empty(Method::POST, &path, Some(files))
            .await
    }

    async fn list_downloads(&self) -> Result<Vec<UserTransfers>, BackendError> {
        self.http.get("/transfers/downloads/", &[]).await
    }

    async fn application(&self) -> Result<(), BackendError> {
        let _: serde_json::Value = self.http.get("/application", &[]).await?;
        Ok(())
    }
}
