use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::backend::{BackendError, BackendKind};
use crate::catalog::{CatalogApi, CatalogQueueItem};
use crate::metrics::QUEUE_ITEMS_FINISHED;
use crate::peer::{queue_records, PeerApi};

use super::diff::diff_queue;
use super::types::{QueueDiff, QueueRecord};

/// A backend whose transfer queue can be snapshotted.
#[async_trait]
pub trait QueueSource: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn fetch_queue(&self) -> Result<Vec<QueueRecord>, BackendError>;
}

/// Queue of the catalog backend, one record per queued release.
#[derive(Clone)]
pub struct CatalogQueue {
    api: Arc<dyn CatalogApi>,
}

impl CatalogQueue {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }
}

impl From<CatalogQueueItem> for QueueRecord {
    fn from(item: CatalogQueueItem) -> Self {
        Self {
            id: item.id.to_string(),
            title: item.title,
            state: item.status,
            size: item.size.max(0.0) as u64,
            size_left: item.size_left.max(0.0) as u64,
        }
    }
}

#[async_trait]
impl QueueSource for CatalogQueue {
    fn kind(&self) -> BackendKind {
        BackendKind::Catalog
    }

    async fn fetch_queue(&self) -> Result<Vec<QueueRecord>, BackendError> {
        let items = self.api.queue().await?;
        Ok(items.into_iter().map(QueueRecord::from).collect())
    }
}

/// Queue of the peer backend, one record per downloading directory.
#[derive(Clone)]
pub struct PeerQueue {
    api: Arc<dyn PeerApi>,
}

impl PeerQueue {
    pub fn new(api: Arc<dyn PeerApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl QueueSource for PeerQueue {
    fn kind(&self) -> BackendKind {
        BackendKind::Peer
    }

    async fn fetch_queue(&self) -> Result<Vec<QueueRecord>, BackendError> {
        let users = self.api.list_downloads().await?;
        Ok(queue_records(&users))
    }
}

/// Fetch the current queue and report what finished since `previous`.
///
/// The caller owns `previous` and should replace it with
/// `current_queue` afterwards.
pub async fn fetch_queue_with_diff(
    source: &dyn QueueSource,
    previous: &[QueueRecord],
) -> Result<QueueDiff, BackendError> {
    let current = source.fetch_queue().await?;
    let diff = diff_queue(previous, current);

    let kind = source.kind();
    debug!(
        backend = %kind,
        queued = diff.current_queue.len(),
        finished = diff.finished_items.len(),
        "queue snapshot"
    );
    if !diff.finished_items.is_empty() {
        QUEUE_ITEMS_FINISHED
            .with_label_values(&[kind.as_str()])
            .inc_by(diff.finished_items.len() as u64);
        for item in &diff.finished_items {
            info!(backend = %kind, id = %item.record.id, title = %item.record.title, "queue item finished");
        }
    }
    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockCatalogApi, MockPeerApi};

    #[tokio::test]
    async fn test_catalog_queue_maps_records() {
        let api = Arc::new(MockCatalogApi::new());
        api.set_queue(vec![fixtures::catalog_queue_item(7, "Low - HEY WHAT", 1000.0, 250.0)])
            .await;

        let records = CatalogQueue::new(api).fetch_queue().await.unwrap();
        assert_eq!(
            records,
            vec![QueueRecord {
                id: "7".to_string(),
                title: "Low - HEY WHAT".to_string(),
                state: "downloading".to_string(),
                size: 1000,
                size_left: 250,
            }]
        );
    }

    #[tokio::test]
    async fn test_successive_snapshots_report_finished_items() {
        let api = Arc::new(MockCatalogApi::new());
        let source = CatalogQueue::new(api.clone());
        api.set_queue(vec![
            fixtures::catalog_queue_item(1, "a", 10.0, 5.0),
            fixtures::catalog_queue_item(2, "b", 10.0, 5.0),
        ])
        .await;

        let first = fetch_queue_with_diff(&source, &[]).await.unwrap();
        assert!(first.finished_items.is_empty());
        assert_eq!(first.current_queue.len(), 2);

        api.set_queue(vec![fixtures::catalog_queue_item(2, "b", 10.0, 1.0)])
            .await;
        let second = fetch_queue_with_diff(&source, &first.current_queue)
            .await
            .unwrap();
        assert_eq!(second.finished_items.len(), 1);
        assert_eq!(second.finished_items[0].record.title, "a");
    }

    #[tokio::test]
    async fn test_peer_queue_synthesizes_directories() {
        let api = Arc::new(MockPeerApi::new());
        api.set_downloads(vec![fixtures::user_transfers(
            "alice",
            "Music\\Low\\HEY WHAT",
            vec![fixtures::transfer("01.flac", "InProgress", 100, 50)],
        )])
        .await;

        let records = PeerQueue::new(api).fetch_queue().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "alice:Music/Low/HEY WHAT");
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let api = Arc::new(MockCatalogApi::new());
        api.fail_on(crate::testing::CatalogOperation::Queue).await;

        let result = fetch_queue_with_diff(&CatalogQueue::new(api), &[]).await;
        assert!(result.is_err());
    }
}
