use encore_core::{AcquisitionService, Config, SanitizedConfig};
use tokio_util::sync::CancellationToken;

/// Shared application state
pub struct AppState {
    config: Config,
    service: AcquisitionService,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, service: AcquisitionService, shutdown: CancellationToken) -> Self {
        Self {
            config,
            service,
            shutdown,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn service(&self) -> &AcquisitionService {
        &self.service
    }

    /// Token for one request's work. Cancelled when the server shuts down.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
