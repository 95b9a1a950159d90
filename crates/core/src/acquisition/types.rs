//! Inputs, results and errors shared by both acquisition backends.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{BackendError, BackendKind};
use crate::metrics::{ACQUISITION_ATTEMPTS, ACQUISITION_DURATION};

/// What the caller wants acquired. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionTarget {
    pub album_title: String,
    pub artist_name: String,
}

impl AcquisitionTarget {
    pub fn new(album_title: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            album_title: album_title.into(),
            artist_name: artist_name.into(),
        }
    }
}

/// Outcome of `download_album`.
///
/// Serializes as `{"success":true}` or `{"success":false,"message":"..."}`.
/// The message is meant to be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AcquisitionResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    pub fn result_label(&self) -> &'static str {
        if self.success {
            "success"
        } else {
            "failed"
        }
    }
}

/// Errors inside the acquisition pipeline. These never cross the
/// `download_album` boundary; they are folded into [`AcquisitionResult`].
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("acquisition cancelled")]
    Cancelled,

    #[error("{0} backend is not configured")]
    NotConfigured(BackendKind),
}

pub(crate) fn record_outcome(backend: BackendKind, result: &AcquisitionResult, elapsed: Duration) {
    let labels = [backend.as_str(), result.result_label()];
    ACQUISITION_ATTEMPTS.with_label_values(&labels).inc();
    ACQUISITION_DURATION
        .with_label_values(&labels)
        .observe(elapsed.as_secs_f64());
}
