//! Periodic queue snapshots and library-rescan notifications.
//!
//! The watcher owns one previous snapshot per backend. Each tick it fetches
//! every configured backend's queue, reports entries that disappeared, and
//! optionally POSTs them to a rescan webhook. Items the webhook did not accept
//! stay pending and are sent again with the next notification.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use encore_core::metrics::QUEUE_POLL_FAILURES;
use encore_core::{
    AcquisitionService, BackendKind, FinishedQueueItem, QueueDiff, QueueRecord, QueueWatchConfig,
};
use futures::future::join_all;
use serde::Serialize;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::metrics::{QUEUE_DEPTH, RESCAN_NOTIFICATIONS};

/// Body POSTed to the rescan webhook.
#[derive(Debug, Clone, Serialize)]
pub struct RescanNotification {
    pub backend: BackendKind,
    pub finished: Vec<FinishedQueueItem>,
    pub detected_at: DateTime<Utc>,
}

pub struct QueueWatcher {
    service: AcquisitionService,
    config: QueueWatchConfig,
    http: reqwest::Client,
    previous: HashMap<BackendKind, Vec<QueueRecord>>,
    pending: HashMap<BackendKind, Vec<FinishedQueueItem>>,
}

impl QueueWatcher {
    pub fn new(service: AcquisitionService, config: QueueWatchConfig) -> Self {
        Self {
            service,
            config,
            http: reqwest::Client::new(),
            previous: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    /// Poll until `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut ticker = interval(Duration::from_millis(self.config.interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_ms = self.config.interval_ms,
            backends = ?self.service.configured_backends(),
            "queue watcher started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let diffs = self.poll_once().await;
            self.dispatch(diffs).await;
        }
        info!("queue watcher stopped");
    }

    /// Snapshot every configured backend once and return the diffs that
    /// succeeded. A failed fetch keeps the previous snapshot, so nothing is
    /// reported finished just because a backend was briefly unreachable.
    pub async fn poll_once(&mut self) -> Vec<(BackendKind, QueueDiff)> {
        let kinds = self.service.configured_backends();
        let service = &self.service;
        let previous = &self.previous;

        let results = join_all(kinds.into_iter().map(|kind| async move {
            let prev = previous.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
            (kind, service.fetch_queue_with_diff(kind, prev).await)
        }))
        .await;

        let mut diffs = Vec::new();
        for (kind, result) in results {
            match result {
                Ok(diff) => {
                    QUEUE_DEPTH
                        .with_label_values(&[kind.as_str()])
                        .set(diff.current_queue.len() as i64);
                    self.previous.insert(kind, diff.current_queue.clone());
                    diffs.push((kind, diff));
                }
                Err(e) => {
                    QUEUE_POLL_FAILURES.inc();
                    warn!(backend = %kind, error = %e, "queue snapshot failed");
                }
            }
        }
        diffs
    }

    /// Queue finished items behind any still undelivered ones and notify.
    /// A backend's pending items are dropped only once the webhook accepts them.
    pub async fn dispatch(&mut self, diffs: Vec<(BackendKind, QueueDiff)>) {
        for (kind, diff) in diffs {
            let batch = {
                let pending = self.pending.entry(kind).or_default();
                for item in diff.finished_items {
                    if !pending.iter().any(|p| p.record.id == item.record.id) {
                        pending.push(item);
                    }
                }
                pending.clone()
            };
            if batch.is_empty() {
                continue;
            }
            if self.notify(kind, batch).await {
                self.pending.remove(&kind);
            } else {
                warn!(
                    backend = %kind,
                    pending = self.pending(kind).len(),
                    "finished items kept for the next notification"
                );
            }
        }
    }

    /// Finished items of `backend` the webhook has not accepted yet.
    pub fn pending(&self, backend: BackendKind) -> &[FinishedQueueItem] {
        self.pending.get(&backend).map(Vec::as_slice).unwrap_or(&[])
    }

    async fn notify(&self, backend: BackendKind, finished: Vec<FinishedQueueItem>) -> bool {
        let Some(url) = self.config.rescan_webhook_url.as_deref() else {
            debug!(backend = %backend, finished = finished.len(), "no rescan webhook configured");
            return true;
        };

        let notification = RescanNotification {
            backend,
            finished,
            detected_at: Utc::now(),
        };
        match self
            .http
            .post(url)
            .json(&notification)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(_) => {
                RESCAN_NOTIFICATIONS.with_label_values(&["sent"]).inc();
                info!(backend = %backend, finished = notification.finished.len(), "rescan requested");
                true
            }
            Err(e) => {
                RESCAN_NOTIFICATIONS.with_label_values(&["failed"]).inc();
                warn!(backend = %backend, error = %e, "rescan webhook failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::testing::{fixtures, CatalogOperation, MockCatalogApi, MockPeerApi};
    use encore_core::AcquisitionConfig;
    use std::sync::Arc;

    fn watcher(catalog: &Arc<MockCatalogApi>, peer: &Arc<MockPeerApi>) -> QueueWatcher {
        let service = AcquisitionService::new(&AcquisitionConfig::default())
            .with_catalog(catalog.clone())
            .with_peer(peer.clone());
        QueueWatcher::new(service, QueueWatchConfig::default())
    }

    #[tokio::test]
    async fn test_first_poll_reports_nothing() {
        let catalog = Arc::new(MockCatalogApi::new());
        let peer = Arc::new(MockPeerApi::new());
        catalog
            .set_queue(vec![fixtures::catalog_queue_item(1, "a", 10.0, 5.0)])
            .await;
        let mut watcher = watcher(&catalog, &peer);

        let diffs = watcher.poll_once().await;
        assert_eq!(diffs.len(), 2);
        assert!(diffs.iter().all(|(_, d)| d.finished_items.is_empty()));
    }

    #[tokio::test]
    async fn test_backends_keep_separate_snapshots() {
        let catalog = Arc::new(MockCatalogApi::new());
        let peer = Arc::new(MockPeerApi::new());
        catalog
            .set_queue(vec![fixtures::catalog_queue_item(1, "a", 10.0, 5.0)])
            .await;
        peer.set_downloads(vec![fixtures::user_transfers(
            "alice",
            "Music\\Album",
            vec![fixtures::transfer("01.flac", "InProgress", 10, 5)],
        )])
        .await;
        let mut watcher = watcher(&catalog, &peer);
        watcher.poll_once().await;

        catalog.set_queue(vec![]).await;
        let diffs = watcher.poll_once().await;

        let finished: HashMap<_, _> = diffs
            .into_iter()
            .map(|(kind, d)| (kind, d.finished_items.len()))
            .collect();
        assert_eq!(finished[&BackendKind::Catalog], 1);
        assert_eq!(finished[&BackendKind::Peer], 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_snapshot() {
        let catalog = Arc::new(MockCatalogApi::new());
        let peer = Arc::new(MockPeerApi::new());
        catalog
            .set_queue(vec![fixtures::catalog_queue_item(1, "a", 10.0, 5.0)])
            .await;
        let mut watcher = watcher(&catalog, &peer);
        watcher.poll_once().await;

        catalog.fail_on(CatalogOperation::Queue).await;
        let diffs = watcher.poll_once().await;
        assert!(diffs.iter().all(|(kind, _)| *kind == BackendKind::Peer));

        catalog.clear_failures().await;
        catalog.set_queue(vec![]).await;
        let diffs = watcher.poll_once().await;
        let (_, catalog_diff) = diffs
            .iter()
            .find(|(kind, _)| *kind == BackendKind::Catalog)
            .unwrap();
        assert_eq!(catalog_diff.finished_items[0].record.id, "1");
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let catalog = Arc::new(MockCatalogApi::new());
        let peer = Arc::new(MockPeerApi::new());
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        tokio::time::timeout(
            Duration::from_secs(1),
            watcher(&catalog, &peer).run(shutdown),
        )
        .await
        .unwrap();
    }

    /// Webhook that answers 500 to its first `failures` requests.
    #[derive(Clone, Default)]
    struct Webhook {
        failures: Arc<std::sync::atomic::AtomicUsize>,
        received: Arc<tokio::sync::Mutex<Vec<serde_json::Value>>>,
    }

    async fn spawn_webhook(failures: usize) -> (String, Webhook) {
        use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
        use std::sync::atomic::Ordering;

        async fn receive(
            State(hook): State<Webhook>,
            Json(body): Json<serde_json::Value>,
        ) -> StatusCode {
            hook.received.lock().await.push(body);
            let rejected = hook
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if rejected {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            }
        }

        let hook = Webhook::default();
        hook.failures.store(failures, Ordering::SeqCst);
        let app = Router::new()
            .route("/rescan", post(receive))
            .with_state(hook.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/rescan"), hook)
    }

    fn watcher_with_webhook(catalog: &Arc<MockCatalogApi>, url: String) -> QueueWatcher {
        let service = AcquisitionService::new(&AcquisitionConfig::default())
            .with_catalog(catalog.clone());
        let config = QueueWatchConfig {
            rescan_webhook_url: Some(url),
            ..QueueWatchConfig::default()
        };
        QueueWatcher::new(service, config)
    }

    #[tokio::test]
    async fn test_rejected_notification_is_resent() {
        let catalog = Arc::new(MockCatalogApi::new());
        catalog
            .set_queue(vec![fixtures::catalog_queue_item(1, "a", 10.0, 5.0)])
            .await;
        let (url, hook) = spawn_webhook(1).await;
        let mut watcher = watcher_with_webhook(&catalog, url);

        let diffs = watcher.poll_once().await;
        watcher.dispatch(diffs).await;
        assert!(hook.received.lock().await.is_empty());

        catalog.set_queue(vec![]).await;
        let diffs = watcher.poll_once().await;
        watcher.dispatch(diffs).await;
        assert_eq!(watcher.pending(BackendKind::Catalog).len(), 1);

        let diffs = watcher.poll_once().await;
        assert!(diffs[0].1.finished_items.is_empty());
        watcher.dispatch(diffs).await;
        assert!(watcher.pending(BackendKind::Catalog).is_empty());

        let received = hook.received.lock().await;
        assert_eq!(received.len(), 2);
        assert_eq!(received[1]["backend"], "catalog");
        assert_eq!(received[1]["finished"][0]["record"]["id"], "1");
    }

    #[tokio::test]
    async fn test_pending_items_are_merged_without_duplicates() {
        let catalog = Arc::new(MockCatalogApi::new());
        catalog
            .set_queue(vec![
                fixtures::catalog_queue_item(1, "a", 10.0, 5.0),
                fixtures::catalog_queue_item(2, "b", 10.0, 5.0),
            ])
            .await;
        let (url, hook) = spawn_webhook(2).await;
        let mut watcher = watcher_with_webhook(&catalog, url);
        let diffs = watcher.poll_once().await;
        watcher.dispatch(diffs).await;

        catalog
            .set_queue(vec![fixtures::catalog_queue_item(2, "b", 10.0, 5.0)])
            .await;
        let diffs = watcher.poll_once().await;
        watcher.dispatch(diffs).await;

        catalog.set_queue(vec![]).await;
        let diffs = watcher.poll_once().await;
        watcher.dispatch(diffs).await;
        let ids: Vec<_> = watcher
            .pending(BackendKind::Catalog)
            .iter()
            .map(|item| item.record.id.clone())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);

        let diffs = watcher.poll_once().await;
        watcher.dispatch(diffs).await;
        assert!(watcher.pending(BackendKind::Catalog).is_empty());
        let received = hook.received.lock().await;
        assert_eq!(received.len(), 3);
        assert_eq!(received[2]["finished"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_without_webhook_nothing_stays_pending() {
        let catalog = Arc::new(MockCatalogApi::new());
        let peer = Arc::new(MockPeerApi::new());
        catalog
            .set_queue(vec![fixtures::catalog_queue_item(1, "a", 10.0, 5.0)])
            .await;
        let mut watcher = watcher(&catalog, &peer);
        let diffs = watcher.poll_once().await;
        watcher.dispatch(diffs).await;

        catalog.set_queue(vec![]).await;
        let diffs = watcher.poll_once().await;
        watcher.dispatch(diffs).await;
        assert!(watcher.pending(BackendKind::Catalog).is_empty());
    }
}
