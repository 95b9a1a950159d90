//! Catalog backend: a metadata-driven music library manager.
//!
//! Albums are acquired by making sure the artist exists locally, waiting for
//! the backend to populate the artist's albums, and starting an album search.
//! Artists created along the way are removed again when they turn out not to
//! carry the requested album.

mod acquirer;
mod client;
mod matcher;
mod resolver;
mod types;

pub use acquirer::{CatalogAcquirer, CatalogAcquirerSettings, DEFAULT_MAX_ARTIST_CANDIDATES};
pub use client::{CatalogApi, CatalogHttpClient};
pub use matcher::{wait_for_album, WaitForAlbumOptions};
pub use resolver::{ArtistResolver, DeleteArtistOutcome, EnsureArtistOptions, EnsureArtistOutcome};
pub use types::*;
