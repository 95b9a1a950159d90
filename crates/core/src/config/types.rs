use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// Catalog backend (Lidarr-style metadata download manager).
    #[serde(default)]
    pub catalog: Option<BackendConfig>,
    /// Peer backend (slskd-style peer search).
    #[serde(default)]
    pub peer: Option<BackendConfig>,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub queue_watch: QueueWatchConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8686
}

/// Connection settings for one download backend.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Server URL (e.g., "http://localhost:8686")
    pub url: String,
    /// API key sent with every request
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u32 {
    30
}

/// Tuning for the acquisition pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    /// How long to wait for the catalog backend to ingest an album (milliseconds).
    #[serde(default = "default_album_timeout")]
    pub album_timeout_ms: u64,

    /// Delay between album listing checks (milliseconds).
    #[serde(default = "default_album_poll_interval")]
    pub album_poll_interval_ms: u64,

    /// How many name-matching artist candidates to try on the slow path.
    #[serde(default = "default_max_artist_candidates")]
    pub max_artist_candidates: usize,

    /// Mark the matched album as monitored before issuing the album search.
    #[serde(default = "default_true")]
    pub monitor_album_before_search: bool,

    /// Quality profile for created artists (first backend profile when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_profile_id: Option<i64>,

    /// Metadata profile for created artists (first backend profile when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_profile_id: Option<i64>,

    /// Root folder for created artists (first backend root folder when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder_path: Option<String>,

    /// Search timeout handed to the peer backend (milliseconds).
    #[serde(default = "default_search_timeout")]
    pub search_timeout_ms: u64,

    /// Delay between search completion checks (milliseconds).
    #[serde(default = "default_search_poll_interval")]
    pub search_poll_interval_ms: u64,

    /// Upper bound on how long we poll a search, independent of the backend timeout.
    #[serde(default = "default_search_max_wait")]
    pub search_max_wait_ms: u64,

    /// File extensions accepted from peers (lowercase, no dot).
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_album_timeout() -> u64 {
    90_000
}

fn default_album_poll_interval() -> u64 {
    2_500
}

fn default_max_artist_candidates() -> usize {
    crate::catalog::DEFAULT_MAX_ARTIST_CANDIDATES
}

fn default_true() -> bool {
    true
}

fn default_search_timeout() -> u64 {
    15_000
}

fn default_search_poll_interval() -> u64 {
    2_000
}

fn default_search_max_wait() -> u64 {
    45_000
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["flac".to_string(), "mp3".to_string()]
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            album_timeout_ms: default_album_timeout(),
            album_poll_interval_ms: default_album_poll_interval(),
            max_artist_candidates: default_max_artist_candidates(),
            monitor_album_before_search: true,
            quality_profile_id: None,
            metadata_profile_id: None,
            root_folder_path: None,
            search_timeout_ms: default_search_timeout(),
            search_poll_interval_ms: default_search_poll_interval(),
            search_max_wait_ms: default_search_max_wait(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

/// Background queue polling that feeds library rescans.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueWatchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Delay between queue snapshots (milliseconds).
    #[serde(default = "default_queue_interval")]
    pub interval_ms: u64,
    /// Endpoint notified with finished items (no notification when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescan_webhook_url: Option<String>,
}

fn default_queue_interval() -> u64 {
    10_000
}

impl Default for QueueWatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: default_queue_interval(),
            rescan_webhook_url: None,
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<SanitizedBackendConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer: Option<SanitizedBackendConfig>,
    pub acquisition: AcquisitionConfig,
    pub queue_watch: QueueWatchConfig,
}

/// Sanitized backend config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBackendConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&BackendConfig> for SanitizedBackendConfig {
    fn from(config: &BackendConfig) -> Self {
        Self {
            url: config.url.clone(),
            api_key_configured: !config.api_key.is_empty(),
            timeout_secs: config.timeout_secs,
        }
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            catalog: config.catalog.as_ref().map(SanitizedBackendConfig::from),
            peer: config.peer.as_ref().map(SanitizedBackendConfig::from),
            acquisition: config.acquisition.clone(),
            queue_watch: config.queue_watch.clone(),
        }
    }
}
