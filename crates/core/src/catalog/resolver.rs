//! Artist lookup and idempotent create-or-get on the catalog backend.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::BackendError;

use super::client::CatalogApi;
use super::types::{AddArtistOptions, ArtistCandidate, NewArtist, Profile};

/// Options for artist creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsureArtistOptions {
    /// Whether the created artist is monitored (default: false).
    pub monitored: bool,
    /// Ask the backend to search for missing albums after adding (default: true).
    pub search_for_missing_albums: bool,
    /// Root folder path; the first backend root folder when unset.
    pub root_folder_path: Option<String>,
    /// Quality profile; the first backend profile when unset.
    pub quality_profile_id: Option<i64>,
    /// Metadata profile; the first backend profile when unset.
    pub metadata_profile_id: Option<i64>,
}

impl Default for EnsureArtistOptions {
    fn default() -> Self {
        Self {
            monitored: false,
            search_for_missing_albums: true,
            root_folder_path: None,
            quality_profile_id: None,
            metadata_profile_id: None,
        }
    }
}

/// Result of [`ArtistResolver::ensure_artist`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsureArtistOutcome {
    pub success: bool,
    pub artist_id: Option<i64>,
    /// True only when this call created the record, which makes rollback meaningful.
    pub created: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EnsureArtistOutcome {
    fn existing(artist_id: i64) -> Self {
        Self {
            success: true,
            artist_id: Some(artist_id),
            created: false,
            message: None,
        }
    }

    fn created(artist_id: i64) -> Self {
        Self {
            success: true,
            artist_id: Some(artist_id),
            created: true,
            message: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            artist_id: None,
            created: false,
            message: Some(message.into()),
        }
    }
}

/// Result of [`ArtistResolver::delete_artist`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteArtistOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Resolves artist names to local artist records.
#[derive(Clone)]
pub struct ArtistResolver {
    api: Arc<dyn CatalogApi>,
}

impl ArtistResolver {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }

    /// Look up external artist candidates. A blank term returns nothing
    /// without touching the network.
    pub async fn lookup_artist(&self, term: &str) -> Result<Vec<ArtistCandidate>, BackendError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let candidates = self.api.lookup_artists(term).await?;
        debug!(term, count = candidates.len(), "artist lookup complete");
        Ok(candidates)
    }

    /// Return the local artist for `candidate.foreign_artist_id`, creating it
    /// when absent. Never produces a duplicate for the same foreign id.
    pub async fn ensure_artist(
        &self,
        candidate: &ArtistCandidate,
        options: &EnsureArtistOptions,
    ) -> EnsureArtistOutcome {
        match self.try_ensure_artist(candidate, options).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    artist = %candidate.artist_name,
                    foreign_id = %candidate.foreign_artist_id,
                    error = %e,
                    "failed to ensure artist"
                );
                EnsureArtistOutcome::failed(format!(
                    "Failed to add artist \"{}\": {e}",
                    candidate.artist_name
                ))
            }
        }
    }

    async fn try_ensure_artist(
        &self,
        candidate: &ArtistCandidate,
        options: &EnsureArtistOptions,
    ) -> Result<EnsureArtistOutcome, BackendError> {
        let (existing, root_folders) =
            tokio::try_join!(self.api.list_artists(), self.api.list_root_folders())?;

        if let Some(artist) = existing
            .iter()
            .find(|a| a.foreign_artist_id == candidate.foreign_artist_id)
        {
            debug!(artist_id = artist.id, artist = %artist.artist_name, "artist already present");
            return Ok(EnsureArtistOutcome::existing(artist.id));
        }

        if root_folders.is_empty() {
            return Ok(EnsureArtistOutcome::failed(
                "No root folders configured on the catalog backend",
            ));
        }
        let root_folder_path = options
            .root_folder_path
            .clone()
            .unwrap_or_else(|| root_folders[0].path.clone());

        let (quality_profile_id, metadata_profile_id) = tokio::try_join!(
            resolve_profile_id(options.quality_profile_id, || self.api.list_quality_profiles()),
            resolve_profile_id(options.metadata_profile_id, || self.api.list_metadata_profiles()),
        )?;
        let Some(quality_profile_id) = quality_profile_id else {
            return Ok(EnsureArtistOutcome::failed(
                "No quality profiles configured on the catalog backend",
            ));
        };
        let Some(metadata_profile_id) = metadata_profile_id else {
            return Ok(EnsureArtistOutcome::failed(
                "No metadata profiles configured on the catalog backend",
            ));
        };

        let request = NewArtist {
            artist_name: candidate.artist_name.clone(),
            foreign_artist_id: candidate.foreign_artist_id.clone(),
            quality_profile_id,
            metadata_profile_id,
            root_folder_path,
            monitored: options.monitored,
            add_options: AddArtistOptions {
                monitor: if options.monitored { "all" } else { "none" }.to_string(),
                search_for_missing_albums: options.search_for_missing_albums,
            },
            artist_type: candidate.artist_type.clone(),
            disambiguation: candidate.disambiguation.clone(),
            overview: candidate.overview.clone(),
            images: candidate.images.clone(),
            genres: candidate.genres.clone(),
        };

        let created = self.api.create_artist(&request).await?;
        info!(
            artist_id = created.id,
            artist = %created.artist_name,
            foreign_id = %created.foreign_artist_id,
            "created artist"
        );
        Ok(EnsureArtistOutcome::created(created.id))
    }

    /// Delete an artist record. Only used to undo a record this resolver created.
    pub async fn delete_artist(&self, artist_id: i64) -> DeleteArtistOutcome {
        match self.api.delete_artist(artist_id).await {
            Ok(()) => {
                info!(artist_id, "deleted artist");
                DeleteArtistOutcome {
                    success: true,
                    message: None,
                }
            }
            Err(e) => DeleteArtistOutcome {
                success: false,
                message: Some(format!("Failed to delete artist {artist_id}: {e}")),
            },
        }
    }
}

/// Configured profile id, or the first one the backend reports.
async fn resolve_profile_id<F, Fut>(
    configured: Option<i64>,
    fetch: F,
) -> Result<Option<i64>, BackendError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<Vec<Profile>, BackendError>>,
{
    match configured {
        Some(id) => Ok(Some(id)),
        None => Ok(fetch().await?.first().map(|p| p.id)),
    }
}
