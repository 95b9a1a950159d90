//! Album acquisition across both backends.
//!
//! [`AcquisitionService`] is the long-lived entry point. The free functions
//! below serve one-shot callers that hold nothing but a [`BackendConfig`].

mod service;
mod types;

pub use service::AcquisitionService;
pub(crate) use types::record_outcome;
pub use types::{AcquisitionError, AcquisitionResult, AcquisitionTarget};

use tokio_util::sync::CancellationToken;

use crate::backend::{BackendError, BackendKind};
use crate::config::BackendConfig;
use crate::queue::{QueueDiff, QueueRecord};

/// Acquire `album_title` by `artist_name` through one backend.
///
/// Configuration problems come back as a failed result, never as a panic or
/// an error.
pub async fn download_album(
    kind: BackendKind,
    config: &BackendConfig,
    album_title: &str,
    artist_name: &str,
) -> AcquisitionResult {
    match AcquisitionService::for_backend(kind, config) {
        Ok(service) => {
            service
                .download_album(
                    kind,
                    &AcquisitionTarget::new(album_title, artist_name),
                    &CancellationToken::new(),
                )
                .await
        }
        Err(e) => AcquisitionResult::failed(e.to_string()),
    }
}

pub async fn fetch_queue(
    kind: BackendKind,
    config: &BackendConfig,
) -> Result<Vec<QueueRecord>, BackendError> {
    let service = AcquisitionService::for_backend(kind, config)?;
    service.fetch_queue(kind).await.map_err(into_backend_error)
}

pub async fn fetch_queue_with_diff(
    kind: BackendKind,
    config: &BackendConfig,
    previous: &[QueueRecord],
) -> Result<QueueDiff, BackendError> {
    let service = AcquisitionService::for_backend(kind, config)?;
    service
        .fetch_queue_with_diff(kind, previous)
        .await
        .map_err(into_backend_error)
}

/// `false` on any error, including an incomplete config.
pub async fn test_connection(kind: BackendKind, config: &BackendConfig) -> bool {
    match AcquisitionService::for_backend(kind, config) {
        Ok(service) => service.test_connection(kind).await,
        Err(_) => false,
    }
}

fn into_backend_error(e: AcquisitionError) -> BackendError {
    match e {
        AcquisitionError::Backend(e) => e,
        other => BackendError::Configuration(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_download_with_empty_key_is_a_failed_result() {
        let result = download_album(
            BackendKind::Catalog,
            &BackendConfig::new("http://lidarr:8686", ""),
            "Kid A",
            "Radiohead",
        )
        .await;

        assert!(!result.success);
        assert!(result.message.unwrap().contains("API key is empty"));
    }

    #[tokio::test]
    async fn test_connection_with_empty_url_is_false() {
        assert!(!test_connection(BackendKind::Peer, &BackendConfig::new("", "key")).await);
    }

    #[tokio::test]
    async fn test_fetch_queue_with_empty_url_is_configuration_error() {
        let err = fetch_queue(BackendKind::Peer, &BackendConfig::new(" ", "key"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Configuration(_)));
    }
}
