//! Authenticated JSON-over-HTTP wrapper.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BackendConfig;
use crate::metrics::BACKEND_REQUESTS;

use super::BackendError;

/// The two supported download backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Curated-metadata download manager (artist/album model).
    Catalog,
    /// Peer file-sharing search backend.
    Peer,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Catalog => "catalog",
            BackendKind::Peer => "peer",
        }
    }

    /// Path prefix of the versioned API.
    pub fn api_prefix(&self) -> &'static str {
        match self {
            BackendKind::Catalog => "/api/v1",
            BackendKind::Peer => "/api/v0",
        }
    }

    /// Where the API key travels.
    pub fn key_placement(&self) -> ApiKeyPlacement {
        match self {
            BackendKind::Catalog => ApiKeyPlacement::Query("apikey"),
            BackendKind::Peer => ApiKeyPlacement::Header("X-API-Key"),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "catalog" => Ok(BackendKind::Catalog),
            "peer" => Ok(BackendKind::Peer),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// How an API key is attached to requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyPlacement {
    /// As a query parameter with this name.
    Query(&'static str),
    /// As a header with this name.
    Header(&'static str),
}

/// HTTP client bound to one backend instance.
///
/// No retries happen here; retry policy belongs to callers.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    kind: BackendKind,
    base_url: String,
    api_key: String,
}

impl HttpBackend {
    /// Create a client, failing with [`BackendError::Configuration`] when the
    /// URL or API key is empty.
    pub fn new(kind: BackendKind, config: &BackendConfig) -> Result<Self, BackendError> {
        check_config(kind, config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| BackendError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            kind,
            base_url: config.url.trim().trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
        })
    }

    /// Full URL for an API path (path starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.kind.api_prefix(), path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.kind.key_placement() {
            ApiKeyPlacement::Query(name) => builder.query(&[(name, self.api_key.as_str())]),
            ApiKeyPlacement::Header(name) => builder.header(name, &self.api_key),
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Response, BackendError> {
        let url = self.url(path);
        debug!(backend = %self.kind, %method, path, "backend request");

        let mut builder = self.authorize(self.client.request(method, &url));
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            BACKEND_REQUESTS
                .with_label_values(&[self.kind.as_str(), "error"])
                .inc();
            BackendError::from_reqwest(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            BACKEND_REQUESTS
                .with_label_values(&[self.kind.as_str(), "http_error"])
                .inc();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        BACKEND_REQUESTS
            .with_label_values(&[self.kind.as_str(), "ok"])
            .inc();
        Ok(response)
    }

    /// Send a request and parse the JSON body.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(method, path, query, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    /// Send a request whose response body is irrelevant.
    pub async fn request_empty<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), BackendError> {
        self.send(method, path, &[], body).await?;
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        self.request::<T, ()>(Method::GET, path, query, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str, query: &[(&str, String)]) -> Result<(), BackendError> {
        self.send::<()>(Method::DELETE, path, query, None).await?;
        Ok(())
    }
}

fn check_config(kind: BackendKind, config: &BackendConfig) -> Result<(), BackendError> {
    if config.url.trim().is_empty() {
        return Err(BackendError::Configuration(format!(
            "{kind} server URL is empty"
        )));
    }
    if config.api_key.trim().is_empty() {
        return Err(BackendError::Configuration(format!(
            "{kind} API key is empty"
        )));
    }
    Ok(())
}
