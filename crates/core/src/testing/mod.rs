//! Testing utilities and mock backends.
//!
//! The mocks implement [`CatalogApi`](crate::catalog::CatalogApi) and
//! [`PeerApi`](crate::peer::PeerApi) in memory, record every call, and can be
//! told to fail individual operations, so acquisitions can be exercised end
//! to end without running either backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use encore_core::testing::{fixtures, MockCatalogApi};
//!
//! let api = Arc::new(MockCatalogApi::new());
//! api.set_lookup_results(vec![fixtures::artist_candidate("Low", "mb-low")]).await;
//! let acquirer = CatalogAcquirer::new(api.clone(), Default::default());
//! ```

mod mock_catalog;
mod mock_peer;

pub use mock_catalog::{CatalogCall, CatalogOperation, MockCatalogApi};
pub use mock_peer::{MockPeerApi, PeerCall, PeerOperation};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{ArtistCandidate, CatalogQueueItem};
    use crate::peer::{PeerResponse, SearchFile, Transfer, TransferDirectory, UserTransfers};
    use crate::queue::QueueRecord;

    /// Lookup candidate with only the identifying fields set.
    pub fn artist_candidate(name: &str, foreign_id: &str) -> ArtistCandidate {
        ArtistCandidate {
            artist_name: name.to_string(),
            foreign_artist_id: foreign_id.to_string(),
            artist_type: Some("Group".to_string()),
            disambiguation: None,
            overview: None,
            images: vec![],
            genres: vec![],
            ratings: None,
            status: Some("continuing".to_string()),
        }
    }

    /// Unlocked file with a blank `extension` field, as peers often send.
    pub fn search_file(filename: &str, size: u64) -> SearchFile {
        SearchFile {
            filename: filename.to_string(),
            size,
            extension: String::new(),
            is_locked: false,
            bit_rate: None,
        }
    }

    /// Peer sharing `count` FLAC files in `directory`.
    pub fn peer_response(username: &str, free_slot: bool, directory: &str, count: usize) -> PeerResponse {
        PeerResponse {
            username: username.to_string(),
            files: (1..=count)
                .map(|i| SearchFile {
                    extension: "flac".to_string(),
                    bit_rate: Some(1411),
                    ..search_file(&format!("{directory}\\{i:02} Track {i}.flac"), 30_000_000)
                })
                .collect(),
            has_free_upload_slot: free_slot,
            queue_length: if free_slot { 0 } else { 12 },
            upload_speed: 1_048_576,
        }
    }

    /// Transfer with `size - bytes_remaining` already transferred.
    pub fn transfer(filename: &str, state: &str, size: u64, bytes_remaining: u64) -> Transfer {
        let bytes_transferred = size.saturating_sub(bytes_remaining);
        Transfer {
            id: format!("t-{filename}"),
            filename: filename.to_string(),
            state: state.to_string(),
            size,
            bytes_transferred,
            bytes_remaining,
            percent_complete: if size == 0 {
                0.0
            } else {
                bytes_transferred as f64 * 100.0 / size as f64
            },
        }
    }

    pub fn user_transfers(username: &str, directory: &str, files: Vec<Transfer>) -> UserTransfers {
        UserTransfers {
            username: username.to_string(),
            directories: vec![TransferDirectory {
                directory: directory.to_string(),
                files,
            }],
        }
    }

    pub fn catalog_queue_item(id: i64, title: &str, size: f64, size_left: f64) -> CatalogQueueItem {
        CatalogQueueItem {
            id,
            title: title.to_string(),
            status: "downloading".to_string(),
            size,
            size_left,
            album_id: None,
            artist_id: None,
        }
    }

    pub fn queue_record(id: &str, title: &str) -> QueueRecord {
        QueueRecord {
            id: id.to_string(),
            title: title.to_string(),
            state: "downloading".to_string(),
            size: 100,
            size_left: 50,
        }
    }
}
