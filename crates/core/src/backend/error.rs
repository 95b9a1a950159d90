use thiserror::Error;

/// Errors raised while talking to a download backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// URL or API key missing. Raised before any network call.
    #[error("Backend not configured: {0}")]
    Configuration(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl BackendError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_decode() {
            BackendError::Parse(e.to_string())
        } else {
            BackendError::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackendError::Http {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
        assert_eq!(err.status(), Some(404));

        let err = BackendError::Configuration("catalog api_key is empty".to_string());
        assert_eq!(
            err.to_string(),
            "Backend not configured: catalog api_key is empty"
        );
        assert_eq!(err.status(), None);
    }
}
