//! Peer backend: search-driven file sharing without an album concept.
//!
//! An album is approximated by one directory of one peer's shared files.

mod acquirer;
mod client;
mod search;
mod transfers;
mod types;

pub use acquirer::{PeerAcquirer, PeerAcquirerSettings};
pub use client::{PeerApi, PeerHttpClient};
pub use search::{
    build_candidates, file_extension, group_by_directory, is_usable, normalize_path,
    rank_candidates, select_download, DownloadSelection, DEFAULT_ALLOWED_EXTENSIONS,
};
pub use transfers::queue_records;
pub use types::*;
