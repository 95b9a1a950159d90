//! Mock peer backend for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::BackendError;
use crate::peer::{DownloadRequest, PeerApi, PeerResponse, SearchRequest, SearchSession, UserTransfers};

/// A recorded call against [`MockPeerApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerCall {
    /// Search text of the created search.
    CreateSearch(String),
    GetSearch(String),
    SearchResponses(String),
    DeleteSearch(String),
    EnqueueDownloads(String),
    ListDownloads,
    Application,
}

/// Operations that can be made to fail with [`MockPeerApi::fail_on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerOperation {
    CreateSearch,
    GetSearch,
    SearchResponses,
    DeleteSearch,
    EnqueueDownloads,
    ListDownloads,
    Application,
}

#[derive(Debug, Default)]
struct MockPeerState {
    responses: Vec<PeerResponse>,
    downloads: Vec<UserTransfers>,
    /// `get_search` calls answered "not complete" before completing.
    polls_before_complete: u32,
    polls: HashMap<String, u32>,
    omit_search_id: bool,
    searches: Vec<SearchRequest>,
    deleted_searches: Vec<String>,
    enqueued: Vec<(String, Vec<DownloadRequest>)>,
}

/// In-memory peer backend.
///
/// Searches complete on the first poll unless told otherwise, and every
/// search returns the same configured responses.
///
/// # Example
///
/// ```rust,ignore
/// let api = Arc::new(MockPeerApi::new());
/// api.set_responses(vec![fixtures::peer_response("alice", true, "Music\\Album", 10)]).await;
/// api.complete_after_polls(3).await;
///
/// // ... run an acquisition ...
///
/// let (username, files) = &api.enqueued().await[0];
/// ```
#[derive(Debug, Default)]
pub struct MockPeerApi {
    state: Arc<RwLock<MockPeerState>>,
    calls: Arc<RwLock<Vec<PeerCall>>>,
    failing: Arc<RwLock<HashSet<PeerOperation>>>,
}

impl MockPeerApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<PeerCall> {
        self.calls.read().await.clone()
    }

    /// Make every later call of `operation` fail with HTTP 500.
    pub async fn fail_on(&self, operation: PeerOperation) {
        self.failing.write().await.insert(operation);
    }

    pub async fn set_responses(&self, responses: Vec<PeerResponse>) {
        self.state.write().await.responses = responses;
    }

    pub async fn set_downloads(&self, downloads: Vec<UserTransfers>) {
        self.state.write().await.downloads = downloads;
    }

    /// Report searches as incomplete for the first `polls` status checks.
    pub async fn complete_after_polls(&self, polls: u32) {
        self.state.write().await.polls_before_complete = polls;
    }

    /// Answer `create_search` without an id.
    pub async fn omit_search_id(&self) {
        self.state.write().await.omit_search_id = true;
    }

    pub async fn created_searches(&self) -> Vec<SearchRequest> {
        self.state.read().await.searches.clone()
    }

    pub async fn deleted_searches(&self) -> Vec<String> {
        self.state.read().await.deleted_searches.clone()
    }

    /// Successful enqueue batches as `(username, files)`.
    pub async fn enqueued(&self) -> Vec<(String, Vec<DownloadRequest>)> {
        self.state.read().await.enqueued.clone()
    }

    async fn record(&self, call: PeerCall, operation: PeerOperation) -> Result<(), BackendError> {
        self.calls.write().await.push(call);
        if self.failing.read().await.contains(&operation) {
            return Err(BackendError::Http {
                status: 500,
                message: format!("mock failure: {operation:?}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PeerApi for MockPeerApi {
    async fn create_search(&self, request: &SearchRequest) -> Result<SearchSession, BackendError> {
        self.record(
            PeerCall::CreateSearch(request.search_text.clone()),
            PeerOperation::CreateSearch,
        )
        .await?;

        let mut state = self.state.write().await;
        state.searches.push(request.clone());
        Ok(SearchSession {
            id: (!state.omit_search_id).then(|| request.id.clone()),
            is_complete: false,
            state: Some("InProgress".to_string()),
            response_count: 0,
        })
    }

    async fn get_search(&self, search_id: &str) -> Result<SearchSession, BackendError> {
        self.record(
            PeerCall::GetSearch(search_id.to_string()),
            PeerOperation::GetSearch,
        )
        .await?;

        let mut state = self.state.write().await;
        let limit = state.polls_before_complete;
        let polls = state.polls.entry(search_id.to_string()).or_insert(0);
        let is_complete = *polls >= limit;
        *polls = polls.saturating_add(1);
        Ok(SearchSession {
            id: Some(search_id.to_string()),
            is_complete,
            state: Some(if is_complete { "Completed, Succeeded" } else { "InProgress" }.to_string()),
            response_count: state.responses.len() as u32,
        })
    }

    async fn search_responses(&self, search_id: &str) -> Result<Vec<PeerResponse>, BackendError> {
        self.record(
            PeerCall::SearchResponses(search_id.to_string()),
            PeerOperation::SearchResponses,
        )
        .await?;
        Ok(self.state.read().await.responses.clone())
    }

    async fn delete_search(&self, search_id: &str) -> Result<(), BackendError> {
        self.record(
            PeerCall::DeleteSearch(search_id.to_string()),
            PeerOperation::DeleteSearch,
        )
        .await?;
        self.state
            .write()
            .await
            .deleted_searches
            .push(search_id.to_string());
        Ok(())
    }

    async fn enqueue_downloads(
        &self,
        username: &str,
        files: &[DownloadRequest],
    ) -> Result<(), BackendError> {
        self.record(
            PeerCall::EnqueueDownloads(username.to_string()),
            PeerOperation::EnqueueDownloads,
        )
        .await?;
        self.state
            .write()
            .await
            .enqueued
            .push((username.to_string(), files.to_vec()));
        Ok(())
    }

    async fn list_downloads(&self) -> Result<Vec<UserTransfers>, BackendError> {
        self.record(PeerCall::ListDownloads, PeerOperation::ListDownloads)
            .await?;
        Ok(self.state.read().await.downloads.clone())
    }

    async fn application(&self) -> Result<(), BackendError> {
        self.record(PeerCall::Application, PeerOperation::Application)
            .await
    }
}
