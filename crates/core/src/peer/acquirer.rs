//! Album acquisition through the peer backend.
//!
//! Search, wait for the search to finish under an iteration cap, pick the
//! best directory from the best peer, and enqueue it as one batch.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::acquisition::{record_outcome, AcquisitionResult, AcquisitionTarget};
use crate::backend::{BackendError, BackendKind};
use crate::config::AcquisitionConfig;
use crate::poll::{poll_until, PollLimit, PollOutcome, PollPolicy};

use super::client::PeerApi;
use super::search::{select_download, DEFAULT_ALLOWED_EXTENSIONS};
use super::types::{DownloadRequest, SearchRequest};

/// Settings for [`PeerAcquirer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAcquirerSettings {
    /// How long the backend itself searches.
    pub search_timeout: Duration,
    pub poll_interval: Duration,
    /// Turned into an iteration cap, rounded up.
    pub max_wait: Duration,
    pub allowed_extensions: Vec<String>,
}

impl Default for PeerAcquirerSettings {
    fn default() -> Self {
        Self {
            search_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(45),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl From<&AcquisitionConfig> for PeerAcquirerSettings {
    fn from(config: &AcquisitionConfig) -> Self {
        Self {
            search_timeout: Duration::from_millis(config.search_timeout_ms),
            poll_interval: Duration::from_millis(config.search_poll_interval_ms),
            max_wait: Duration::from_millis(config.search_max_wait_ms),
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }
}

impl PeerAcquirerSettings {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            limit: PollLimit::iterations_for(self.max_wait, self.poll_interval),
        }
    }
}

/// Drives the peer backend from an artist/album name pair to an enqueued
/// directory of files.
pub struct PeerAcquirer {
    api: Arc<dyn PeerApi>,
    settings: PeerAcquirerSettings,
}

impl PeerAcquirer {
    pub fn new(api: Arc<dyn PeerApi>, settings: PeerAcquirerSettings) -> Self {
        Self { api, settings }
    }

    /// Acquire one album. Never returns an error; failures carry a message
    /// suitable for the user.
    pub async fn download_album(
        &self,
        target: &AcquisitionTarget,
        cancel: &CancellationToken,
    ) -> AcquisitionResult {
        let started = Instant::now();
        info!(
            album = %target.album_title,
            artist = %target.artist_name,
            "peer acquisition started"
        );

        let result = self.acquire(target, cancel).await;

        if let (false, Some(message)) = (result.success, &result.message) {
            warn!(album = %target.album_title, artist = %target.artist_name, %message, "peer acquisition failed");
        }
        record_outcome(BackendKind::Peer, &result, started.elapsed());
        result
    }

    async fn acquire(
        &self,
        target: &AcquisitionTarget,
        cancel: &CancellationToken,
    ) -> AcquisitionResult {
        let query = format!("{} {}", target.artist_name.trim(), target.album_title.trim());
        let request = SearchRequest::new(
            Uuid::new_v4().to_string(),
            query.trim(),
            self.settings.search_timeout.as_millis() as u64,
        );

        let session = match self.api.create_search(&request).await {
            Ok(session) => session,
            Err(e) => return AcquisitionResult::failed(format!("Failed to start search: {e}")),
        };
        let Some(search_id) = session.id.filter(|id| !id.is_empty()) else {
            return AcquisitionResult::failed("Search was not created: backend returned no id");
        };
        debug!(search_id = %search_id, query = %request.search_text, "search created");

        let result = self.search_and_enqueue(&search_id, target, cancel).await;

        // Best effort; an abandoned search only costs backend memory.
        if let Err(e) = self.api.delete_search(&search_id).await {
            warn!(search_id = %search_id, error = %e, "failed to delete search");
        }
        result
    }

    async fn search_and_enqueue(
        &self,
        search_id: &str,
        target: &AcquisitionTarget,
        cancel: &CancellationToken,
    ) -> AcquisitionResult {
        let api = self.api.as_ref();
        let outcome = poll_until(self.settings.poll_policy(), cancel, || async move {
            let session = api.get_search(search_id).await?;
            Ok::<_, BackendError>(session.is_finished().then_some(()))
        })
        .await;

        match outcome {
            Ok(PollOutcome::Ready(())) => {}
            Ok(PollOutcome::Expired) => {
                return AcquisitionResult::failed(format!(
                    "Search timed out for \"{} {}\"",
                    target.artist_name, target.album_title
                ))
            }
            Ok(PollOutcome::Cancelled) => return AcquisitionResult::failed("Acquisition cancelled"),
            Err(e) => return AcquisitionResult::failed(format!("Failed while waiting for search: {e}")),
        }

        let responses = match self.api.search_responses(search_id).await {
            Ok(responses) => responses,
            Err(e) => {
                return AcquisitionResult::failed(format!("Failed to load search results: {e}"))
            }
        };
        debug!(search_id, peers = responses.len(), "search responses received");

        let Some(selection) = select_download(&responses, &self.settings.allowed_extensions) else {
            return AcquisitionResult::failed(format!(
                "No suitable peers found for \"{}\" by \"{}\"",
                target.album_title, target.artist_name
            ));
        };

        let files: Vec<DownloadRequest> = selection
            .directory
            .files
            .iter()
            .map(DownloadRequest::from)
            .collect();
        match self.api.enqueue_downloads(&selection.username, &files).await {
            Ok(()) => {
                info!(
                    username = %selection.username,
                    directory = %selection.directory.directory,
                    files = files.len(),
                    "enqueued album download"
                );
                AcquisitionResult::succeeded()
            }
            Err(e) => AcquisitionResult::failed(format!(
                "Failed to enqueue downloads from {}: {e}",
                selection.username
            )),
        }
    }
}
