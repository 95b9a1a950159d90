//! Waits for an album to show up under an artist.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::acquisition::AcquisitionError;
use crate::normalize::normalize;
use crate::poll::{poll_until, PollOutcome, PollPolicy};

use super::client::CatalogApi;
use super::types::AlbumRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitForAlbumOptions {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitForAlbumOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(90),
            poll_interval: Duration::from_millis(2500),
        }
    }
}

/// Poll the artist's albums until one has `normalized_title` as its
/// normalized title.
///
/// `Ok(None)` means the timeout elapsed without a match, which is an expected
/// outcome: the backend may simply not know the album.
pub async fn wait_for_album(
    api: &dyn CatalogApi,
    artist_id: i64,
    normalized_title: &str,
    options: WaitForAlbumOptions,
    cancel: &CancellationToken,
) -> Result<Option<AlbumRecord>, AcquisitionError> {
    let policy = PollPolicy::with_timeout(options.poll_interval, options.timeout);

    let outcome = poll_until(policy, cancel, || async move {
        let albums = api.list_albums(artist_id).await?;
        debug!(artist_id, albums = albums.len(), "checking albums");
        Ok::<_, AcquisitionError>(
            albums
                .into_iter()
                .find(|album| normalize(&album.title) == normalized_title),
        )
    })
    .await?;

    match outcome {
        PollOutcome::Ready(album) => Ok(Some(album)),
        PollOutcome::Expired => {
            debug!(artist_id, title = normalized_title, "album did not appear in time");
            Ok(None)
        }
        PollOutcome::Cancelled => Err(AcquisitionError::Cancelled),
    }
}
