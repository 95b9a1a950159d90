//! One entry point over both backends.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::backend::{BackendError, BackendKind};
use crate::catalog::{CatalogAcquirer, CatalogAcquirerSettings, CatalogApi, CatalogHttpClient};
use crate::config::{AcquisitionConfig, BackendConfig, Config};
use crate::peer::{PeerAcquirer, PeerAcquirerSettings, PeerApi, PeerHttpClient};
use crate::queue::{self, CatalogQueue, PeerQueue, QueueDiff, QueueRecord, QueueSource};

use super::types::{AcquisitionError, AcquisitionResult, AcquisitionTarget};

/// Holds whichever backends are configured and routes calls to them.
///
/// Cheap to clone; clones share the backend clients.
#[derive(Clone)]
pub struct AcquisitionService {
    catalog: Option<Arc<dyn CatalogApi>>,
    peer: Option<Arc<dyn PeerApi>>,
    catalog_settings: CatalogAcquirerSettings,
    peer_settings: PeerAcquirerSettings,
}

impl AcquisitionService {
    /// A service with no backends yet.
    pub fn new(config: &AcquisitionConfig) -> Self {
        Self {
            catalog: None,
            peer: None,
            catalog_settings: CatalogAcquirerSettings::from(config),
            peer_settings: PeerAcquirerSettings::from(config),
        }
    }

    /// Build HTTP clients for every backend section present in `config`.
    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        let mut service = Self::new(&config.acquisition);
        if let Some(catalog) = &config.catalog {
            service = service.with_catalog(Arc::new(CatalogHttpClient::new(catalog)?));
        }
        if let Some(peer) = &config.peer {
            service = service.with_peer(Arc::new(PeerHttpClient::new(peer)?));
        }
        Ok(service)
    }

    /// Single-backend service with default acquisition settings.
    pub fn for_backend(kind: BackendKind, config: &BackendConfig) -> Result<Self, BackendError> {
        let service = Self::new(&AcquisitionConfig::default());
        Ok(match kind {
            BackendKind::Catalog => service.with_catalog(Arc::new(CatalogHttpClient::new(config)?)),
            BackendKind::Peer => service.with_peer(Arc::new(PeerHttpClient::new(config)?)),
        })
    }

    pub fn with_catalog(mut self, api: Arc<dyn CatalogApi>) -> Self {
        self.catalog = Some(api);
        self
    }

    pub fn with_peer(mut self, api: Arc<dyn PeerApi>) -> Self {
        self.peer = Some(api);
        self
    }

    pub fn configured_backends(&self) -> Vec<BackendKind> {
        let mut kinds = Vec::new();
        if self.catalog.is_some() {
            kinds.push(BackendKind::Catalog);
        }
        if self.peer.is_some() {
            kinds.push(BackendKind::Peer);
        }
        kinds
    }

    pub fn is_configured(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Catalog => self.catalog.is_some(),
            BackendKind::Peer => self.peer.is_some(),
        }
    }

    fn catalog(&self) -> Result<&Arc<dyn CatalogApi>, AcquisitionError> {
        self.catalog
            .as_ref()
            .ok_or(AcquisitionError::NotConfigured(BackendKind::Catalog))
    }

    fn peer(&self) -> Result<&Arc<dyn PeerApi>, AcquisitionError> {
        self.peer
            .as_ref()
            .ok_or(AcquisitionError::NotConfigured(BackendKind::Peer))
    }

    /// Acquire an album through `kind`. An unconfigured backend is a failed
    /// result, like any other failure.
    pub async fn download_album(
        &self,
        kind: BackendKind,
        target: &AcquisitionTarget,
        cancel: &CancellationToken,
    ) -> AcquisitionResult {
        match kind {
            BackendKind::Catalog => match self.catalog() {
                Ok(api) => {
                    CatalogAcquirer::new(Arc::clone(api), self.catalog_settings.clone())
                        .download_album(target, cancel)
                        .await
                }
                Err(e) => AcquisitionResult::failed(e.to_string()),
            },
            BackendKind::Peer => match self.peer() {
                Ok(api) => {
                    PeerAcquirer::new(Arc::clone(api), self.peer_settings.clone())
                        .download_album(target, cancel)
                        .await
                }
                Err(e) => AcquisitionResult::failed(e.to_string()),
            },
        }
    }

    /// Queue snapshot source for `kind`.
    pub fn queue_source(&self, kind: BackendKind) -> Result<Box<dyn QueueSource>, AcquisitionError> {
        Ok(match kind {
            BackendKind::Catalog => Box::new(CatalogQueue::new(Arc::clone(self.catalog()?))),
            BackendKind::Peer => Box::new(PeerQueue::new(Arc::clone(self.peer()?))),
        })
    }

    pub async fn fetch_queue(&self, kind: BackendKind) -> Result<Vec<QueueRecord>, AcquisitionError> {
        Ok(self.queue_source(kind)?.fetch_queue().await?)
    }

    pub async fn fetch_queue_with_diff(
        &self,
        kind: BackendKind,
        previous: &[QueueRecord],
    ) -> Result<QueueDiff, AcquisitionError> {
        let source = self.queue_source(kind)?;
        Ok(queue::fetch_queue_with_diff(source.as_ref(), previous).await?)
    }

    /// Whether `kind` is configured and answers its status endpoint.
    pub async fn test_connection(&self, kind: BackendKind) -> bool {
        let probe = match kind {
            BackendKind::Catalog => match self.catalog() {
                Ok(api) => api.system_status().await.map_err(AcquisitionError::from),
                Err(e) => Err(e),
            },
            BackendKind::Peer => match self.peer() {
                Ok(api) => api.application().await.map_err(AcquisitionError::from),
                Err(e) => Err(e),
            },
        };
        match probe {
            Ok(()) => true,
            Err(e) => {
                debug!(backend = %kind, error = %e, "connection test failed");
                false
            }
        }
    }
}
