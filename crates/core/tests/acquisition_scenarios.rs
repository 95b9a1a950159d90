//! End-to-end acquisition scenarios against mock backends.
//!
//! Each test drives `AcquisitionService` the way the server does and checks
//! both the returned result and the calls that reached the backend.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use encore_core::catalog::{wait_for_album, WaitForAlbumOptions};
use encore_core::testing::{fixtures, CatalogCall, MockCatalogApi, MockPeerApi};
use encore_core::{
    detect_finished_queue_items, AcquisitionConfig, AcquisitionService, AcquisitionTarget,
    BackendKind,
};

fn catalog_service(api: &Arc<MockCatalogApi>) -> AcquisitionService {
    AcquisitionService::new(&AcquisitionConfig::default()).with_catalog(api.clone())
}

fn peer_service(api: &Arc<MockPeerApi>) -> AcquisitionService {
    AcquisitionService::new(&AcquisitionConfig::default()).with_peer(api.clone())
}

#[tokio::test(start_paused = true)]
async fn local_album_triggers_search_without_lookup() {
    let api = Arc::new(MockCatalogApi::new());
    let artist = api.add_artist("Radiohead", "mb-radiohead").await;
    let album = api.add_album(artist.id, "OK Computer").await;

    let result = catalog_service(&api)
        .download_album(
            BackendKind::Catalog,
            &AcquisitionTarget::new("OK Computer", "Radiohead"),
            &CancellationToken::new(),
        )
        .await;

    assert!(result.success, "{result:?}");
    let calls = api.calls().await;
    let searches: Vec<_> = calls
        .iter()
        .filter(|c| matches!(c, CatalogCall::AlbumSearch(_)))
        .collect();
    assert_eq!(searches, vec![&CatalogCall::AlbumSearch(vec![album.id])]);
    assert!(!calls
        .iter()
        .any(|c| matches!(c, CatalogCall::LookupArtists(_))));
}

#[tokio::test(start_paused = true)]
async fn second_candidate_succeeds_after_first_is_rolled_back() {
    let api = Arc::new(MockCatalogApi::new());
    api.set_lookup_results(vec![
        fixtures::artist_candidate("Radiohead", "mb-1"),
        fixtures::artist_candidate("Radiohead", "mb-2"),
        fixtures::artist_candidate("Radiohead", "mb-3"),
    ])
    .await;
    api.set_albums_for_foreign_id("mb-2", vec!["OK Computer"]).await;

    let result = catalog_service(&api)
        .download_album(
            BackendKind::Catalog,
            &AcquisitionTarget::new("OK Computer", "Radiohead"),
            &CancellationToken::new(),
        )
        .await;

    assert!(result.success, "{result:?}");

    let created = api.created_artists().await;
    let created_ids: Vec<_> = created.iter().map(|a| a.foreign_artist_id.as_str()).collect();
    assert_eq!(created_ids, vec!["mb-1", "mb-2"]);

    let deletes: Vec<_> = api
        .calls()
        .await
        .into_iter()
        .filter(|c| matches!(c, CatalogCall::DeleteArtist(_)))
        .collect();
    assert_eq!(deletes.len(), 1);

    let remaining = api.artists().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].foreign_artist_id, "mb-2");
}

#[tokio::test(start_paused = true)]
async fn free_upload_slot_wins_over_more_files() {
    let api = Arc::new(MockPeerApi::new());
    api.set_responses(vec![
        fixtures::peer_response("A", false, "X", 5),
        fixtures::peer_response("B", true, "Y", 2),
    ])
    .await;

    let result = peer_service(&api)
        .download_album(
            BackendKind::Peer,
            &AcquisitionTarget::new("Kid A", "Radiohead"),
            &CancellationToken::new(),
        )
        .await;

    assert!(result.success, "{result:?}");
    let enqueued = api.enqueued().await;
    assert_eq!(enqueued.len(), 1);
    let (username, files) = &enqueued[0];
    assert_eq!(username, "B");
    assert!(files.iter().all(|f| f.filename.starts_with("Y\\")));
    assert_eq!(files.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn peer_with_only_wav_and_locked_files_is_excluded() {
    let api = Arc::new(MockPeerApi::new());

    let mut unusable = fixtures::peer_response("wav_only", true, "W", 0);
    unusable.files.push(fixtures::search_file("W\\01.wav", 40_000_000));
    let mut locked = fixtures::search_file("W\\02.flac", 30_000_000);
    locked.is_locked = true;
    unusable.files.push(locked);

    api.set_responses(vec![unusable, fixtures::peer_response("busy", false, "B", 3)])
        .await;

    let result = peer_service(&api)
        .download_album(
            BackendKind::Peer,
            &AcquisitionTarget::new("Kid A", "Radiohead"),
            &CancellationToken::new(),
        )
        .await;

    assert!(result.success);
    assert_eq!(api.enqueued().await[0].0, "busy");
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_returns_none_without_sleeping() {
    let api = MockCatalogApi::new();
    let artist = api.add_artist("Radiohead", "mb-radiohead").await;
    let start = Instant::now();

    let album = wait_for_album(
        &api,
        artist.id,
        "okcomputer",
        WaitForAlbumOptions {
            timeout: Duration::ZERO,
            poll_interval: Duration::from_millis(2500),
        },
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(album.is_none());
    assert_eq!(start.elapsed(), Duration::ZERO);
    let checks = api
        .calls()
        .await
        .iter()
        .filter(|c| matches!(c, CatalogCall::ListAlbums(_)))
        .count();
    assert!(checks <= 1);
}

#[tokio::test]
async fn queue_snapshots_report_what_left() {
    let api = Arc::new(MockPeerApi::new());
    let service = peer_service(&api);

    api.set_downloads(vec![
        fixtures::user_transfers(
            "alice",
            "Music\\Low\\HEY WHAT",
            vec![fixtures::transfer("01.flac", "InProgress", 100, 50)],
        ),
        fixtures::user_transfers(
            "bob",
            "Music\\Low\\Ones and Sixes",
            vec![fixtures::transfer("01.flac", "Queued, Remotely", 100, 100)],
        ),
    ])
    .await;
    let first = service
        .fetch_queue_with_diff(BackendKind::Peer, &[])
        .await
        .unwrap();
    assert_eq!(first.current_queue.len(), 2);
    assert!(first.finished_items.is_empty());

    api.set_downloads(vec![fixtures::user_transfers(
        "bob",
        "Music\\Low\\Ones and Sixes",
        vec![fixtures::transfer("01.flac", "InProgress", 100, 10)],
    )])
    .await;
    let second = service
        .fetch_queue_with_diff(BackendKind::Peer, &first.current_queue)
        .await
        .unwrap();

    let finished: Vec<_> = second
        .finished_items
        .iter()
        .map(|f| f.record.title.as_str())
        .collect();
    assert_eq!(finished, vec!["HEY WHAT"]);
    assert_eq!(
        detect_finished_queue_items(&first.current_queue, &second.current_queue).len(),
        1
    );
}
