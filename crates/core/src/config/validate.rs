use super::{types::BackendConfig, types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Configured backends carry a URL and an API key
/// - Poll intervals are non-zero
/// - At least one peer file extension is allowed
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if let Some(catalog) = &config.catalog {
        validate_backend("catalog", catalog)?;
    }
    if let Some(peer) = &config.peer {
        validate_backend("peer", peer)?;
    }

    let acquisition = &config.acquisition;
    if acquisition.album_poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "acquisition.album_poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if acquisition.max_artist_candidates == 0 {
        return Err(ConfigError::ValidationError(
            "acquisition.max_artist_candidates cannot be 0".to_string(),
        ));
    }
    if acquisition.search_poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "acquisition.search_poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if acquisition.allowed_extensions.is_empty() {
        return Err(ConfigError::ValidationError(
            "acquisition.allowed_extensions cannot be empty".to_string(),
        ));
    }

    if config.queue_watch.enabled && config.queue_watch.interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "queue_watch.interval_ms cannot be 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_backend(section: &str, backend: &BackendConfig) -> Result<(), ConfigError> {
    if backend.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{section}.url cannot be empty"
        )));
    }
    if backend.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{section}.api_key cannot be empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::IpAddr;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_api_key_fails() {
        let config = Config {
            catalog: Some(BackendConfig::new("http://localhost:8686", "  ")),
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("catalog.api_key"));
    }

    #[test]
    fn test_validate_empty_peer_url_fails() {
        let config = Config {
            peer: Some(BackendConfig::new("", "key")),
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("peer.url"));
    }

    #[test]
    fn test_validate_zero_poll_interval_fails() {
        let mut config = Config::default();
        config.acquisition.album_poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_no_extensions_fails() {
        let mut config = Config::default();
        config.acquisition.allowed_extensions.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_candidates_fails() {
        let mut config = Config::default();
        config.acquisition.max_artist_candidates = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_artist_candidates"));
    }
}
