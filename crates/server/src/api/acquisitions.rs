//! Album acquisition API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use encore_core::{AcquisitionResult, AcquisitionTarget, BackendKind};
use serde::Deserialize;
use tracing::info;

use super::handlers::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AcquisitionRequest {
    pub backend: BackendKind,
    pub album_title: String,
    pub artist_name: String,
}

/// POST /api/v1/acquisitions
///
/// Run one acquisition to completion. A failed acquisition is still a 200
/// with `success: false`; only malformed requests and unconfigured backends
/// are HTTP errors.
pub async fn create_acquisition(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AcquisitionRequest>,
) -> Result<Json<AcquisitionResult>, (StatusCode, Json<ErrorResponse>)> {
    if body.album_title.trim().is_empty() || body.artist_name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "album_title and artist_name are required".to_string(),
            }),
        ));
    }
    if !state.service().is_configured(body.backend) {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: format!("{} backend not configured", body.backend),
            }),
        ));
    }

    info!(
        backend = %body.backend,
        album = %body.album_title,
        artist = %body.artist_name,
        "acquisition requested"
    );
    let target = AcquisitionTarget::new(body.album_title.trim(), body.artist_name.trim());
    let result = state
        .service()
        .download_album(body.backend, &target, &state.request_token())
        .await;

    Ok(Json(result))
}
