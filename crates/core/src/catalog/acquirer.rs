//! Album acquisition through the catalog backend.
//!
//! ```text
//! LocalLookup ──match──▶ Trigger ──▶ Done
//!      │
//!      └─miss─▶ ExternalLookup ─▶ for each candidate (at most N):
//!                   EnsureArtist ─▶ WaitForAlbum ──match──▶ Trigger ──▶ Done
//!                        │               └─miss/abort─▶ Rollback (if created)
//!                        └─failed─▶ next candidate
//!               exhausted ─▶ Failed
//! ```

use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::acquisition::{record_outcome, AcquisitionError, AcquisitionResult, AcquisitionTarget};
use crate::backend::BackendKind;
use crate::config::AcquisitionConfig;
use crate::metrics::ARTIST_ROLLBACKS;
use crate::normalize::normalize;

use super::client::CatalogApi;
use super::matcher::{wait_for_album, WaitForAlbumOptions};
use super::resolver::{ArtistResolver, EnsureArtistOptions};
use super::types::{AlbumRecord, ArtistCandidate};

/// How many name-matching lookup candidates are tried before giving up.
pub const DEFAULT_MAX_ARTIST_CANDIDATES: usize = 3;

/// Settings for [`CatalogAcquirer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogAcquirerSettings {
    pub album_wait: WaitForAlbumOptions,
    pub max_artist_candidates: usize,
    pub monitor_album_before_search: bool,
    pub artist_options: EnsureArtistOptions,
}

impl Default for CatalogAcquirerSettings {
    fn default() -> Self {
        Self {
            album_wait: WaitForAlbumOptions::default(),
            max_artist_candidates: DEFAULT_MAX_ARTIST_CANDIDATES,
            monitor_album_before_search: true,
            artist_options: EnsureArtistOptions::default(),
        }
    }
}

impl From<&AcquisitionConfig> for CatalogAcquirerSettings {
    fn from(config: &AcquisitionConfig) -> Self {
        Self {
            album_wait: WaitForAlbumOptions {
                timeout: std::time::Duration::from_millis(config.album_timeout_ms),
                poll_interval: std::time::Duration::from_millis(config.album_poll_interval_ms),
            },
            max_artist_candidates: config.max_artist_candidates,
            monitor_album_before_search: config.monitor_album_before_search,
            artist_options: EnsureArtistOptions {
                root_folder_path: config.root_folder_path.clone(),
                quality_profile_id: config.quality_profile_id,
                metadata_profile_id: config.metadata_profile_id,
                ..Default::default()
            },
        }
    }
}

/// Outcome of trying one artist candidate.
enum CandidateAttempt {
    Matched(AlbumRecord),
    NoMatch,
    /// Stop trying further candidates.
    Aborted(String),
}

/// Drives the catalog backend from an artist/album name pair to a started
/// album search.
pub struct CatalogAcquirer {
    api: Arc<dyn CatalogApi>,
    resolver: ArtistResolver,
    settings: CatalogAcquirerSettings,
}

impl CatalogAcquirer {
    pub fn new(api: Arc<dyn CatalogApi>, settings: CatalogAcquirerSettings) -> Self {
        Self {
            resolver: ArtistResolver::new(Arc::clone(&api)),
            api,
            settings,
        }
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
            "catalog acquisition started"
        );

        let result = self.acquire(target, cancel).await;

        match &result.message {
            Some(message) if !result.success => {
                warn!(album = %target.album_title, artist = %target.artist_name, %message, "catalog acquisition failed")
            }
            _ => info!(album = %target.album_title, artist = %target.artist_name, "catalog acquisition started album search"),
        }
        record_outcome(BackendKind::Catalog, &result, started.elapsed());
        result
    }

    async fn acquire(
        &self,
        target: &AcquisitionTarget,
        cancel: &CancellationToken,
    ) -> AcquisitionResult {
        let artist_key = normalize(&target.artist_name);
        let album_key = normalize(&target.album_title);

        // Fast path: artist and album already known locally.
        let local_artists = match self.api.list_artists().await {
            Ok(artists) => artists,
            Err(e) => return AcquisitionResult::failed(format!("Failed to load local artists: {e}")),
        };
        if let Some(artist) = local_artists
            .iter()
            .find(|a| normalize(&a.artist_name) == artist_key)
        {
            let albums = match self.api.list_albums(artist.id).await {
                Ok(albums) => albums,
                Err(e) => {
                    return AcquisitionResult::failed(format!(
                        "Failed to load albums for \"{}\": {e}",
                        artist.artist_name
                    ))
                }
            };
            if let Some(album) = albums.into_iter().find(|a| normalize(&a.title) == album_key) {
                debug!(album_id = album.id, "album already known locally");
                return self.trigger(&album).await;
            }
        }

        // Slow path: resolve through external lookup.
        let candidates = match self.resolver.lookup_artist(&target.artist_name).await {
            Ok(candidates) => candidates,
            Err(e) => return AcquisitionResult::failed(format!("Artist lookup failed: {e}")),
        };
        let candidates: Vec<ArtistCandidate> = candidates
            .into_iter()
            .filter(|c| normalize(&c.artist_name) == artist_key)
            .take(self.settings.max_artist_candidates)
            .collect();

        if candidates.is_empty() {
            return AcquisitionResult::failed(format!(
                "No artist named \"{}\" found",
                target.artist_name
            ));
        }

        for (index, candidate) in candidates.iter().enumerate() {
            debug!(
                candidate = index + 1,
                of = candidates.len(),
                foreign_id = %candidate.foreign_artist_id,
                "trying artist candidate"
            );
            match self.attempt_candidate(candidate, &album_key, cancel).await {
                CandidateAttempt::Matched(album) => return self.trigger(&album).await,
                CandidateAttempt::NoMatch => {}
                CandidateAttempt::Aborted(message) => return AcquisitionResult::failed(message),
            }
        }

        AcquisitionResult::failed(format!(
            "Album \"{}\" by \"{}\" was not found for any of {} matching artist(s)",
            target.album_title,
            target.artist_name,
            candidates.len()
        ))
    }

    /// Ensure the artist, wait for the album, and roll back a created artist
    /// on every path that does not end in a match.
    async fn attempt_candidate(
        &self,
        candidate: &ArtistCandidate,
        album_key: &str,
        cancel: &CancellationToken,
    ) -> CandidateAttempt {
        if cancel.is_cancelled() {
            return CandidateAttempt::Aborted("Acquisition cancelled".to_string());
        }

        let ensured = self
            .resolver
            .ensure_artist(candidate, &self.settings.artist_options)
            .await;
        let artist_id = match (ensured.success, ensured.artist_id) {
            (true, Some(id)) => id,
            _ => {
                warn!(
                    foreign_id = %candidate.foreign_artist_id,
                    message = ensured.message.as_deref().unwrap_or_default(),
                    "skipping artist candidate"
                );
                return CandidateAttempt::NoMatch;
            }
        };

        let attempt = match wait_for_album(
            self.api.as_ref(),
            artist_id,
            album_key,
            self.settings.album_wait,
            cancel,
        )
        .await
        {
            Ok(Some(album)) => CandidateAttempt::Matched(album),
            Ok(None) => CandidateAttempt::NoMatch,
            Err(AcquisitionError::Cancelled) => {
                CandidateAttempt::Aborted("Acquisition cancelled".to_string())
            }
            Err(e) => CandidateAttempt::Aborted(format!("Failed while waiting for album: {e}")),
        };

        if ensured.created && !matches!(attempt, CandidateAttempt::Matched(_)) {
            self.rollback(artist_id).await;
        }
        attempt
    }

    /// Delete a speculatively created artist. Failures are logged only.
    async fn rollback(&self, artist_id: i64) {
        let outcome = self.resolver.delete_artist(artist_id).await;
        if outcome.success {
            ARTIST_ROLLBACKS.with_label_values(&["deleted"]).inc();
            info!(artist_id, "rolled back created artist");
        } else {
            ARTIST_ROLLBACKS.with_label_values(&["failed"]).inc();
            warn!(
                artist_id,
                message = outcome.message.as_deref().unwrap_or_default(),
                "failed to roll back created artist"
            );
        }
    }

    async fn trigger(&self, album: &AlbumRecord) -> AcquisitionResult {
        if self.settings.monitor_album_before_search {
            if let Err(e) = self.api.monitor_albums(&[album.id], true).await {
                warn!(album_id = album.id, error = %e, "failed to monitor album");
            }
        }

        match self.api.album_search(&[album.id]).await {
            Ok(command) => {
                info!(album_id = album.id, command_id = command.id, title = %album.title, "album search started");
                AcquisitionResult::succeeded()
            }
            Err(e) => AcquisitionResult::failed(format!(
                "Failed to start search for \"{}\": {e}",
                album.title
            )),
        }
    }
}
