//! Queue and backend status API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use encore_core::{AcquisitionError, BackendKind, QueueRecord};
use serde::Serialize;

use super::handlers::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub backend: BackendKind,
    pub records: Vec<QueueRecord>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct BackendStatusResponse {
    pub backend: BackendKind,
    pub configured: bool,
    pub reachable: bool,
}

/// GET /api/v1/queue/{backend}
///
/// Current transfer queue of one backend.
pub async fn get_queue(
    State(state): State<Arc<AppState>>,
    Path(backend): Path<BackendKind>,
) -> Result<Json<QueueResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.service().fetch_queue(backend).await {
        Ok(records) => {
            let count = records.len();
            Ok(Json(QueueResponse {
                backend,
                records,
                count,
            }))
        }
        Err(e @ AcquisitionError::NotConfigured(_)) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
        Err(e) => Err((
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// GET /api/v1/backends/{backend}/status
///
/// Whether a backend is configured and reachable.
pub async fn get_backend_status(
    State(state): State<Arc<AppState>>,
    Path(backend): Path<BackendKind>,
) -> Json<BackendStatusResponse> {
    let service = state.service();
    Json(BackendStatusResponse {
        backend,
        configured: service.is_configured(backend),
        reachable: service.test_connection(backend).await,
    })
}
