//! Client configuration

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{CacheStore, FileCache, MemoryCache};

/// Configuration for talking to the BizDesk API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "https://api.bizdesk.app")
    pub base_url: String,

    /// Bearer token for authentication
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Offline/mock mode: never contact the remote service
    pub offline: bool,

    /// Directory for the file cache; in-memory cache when unset
    pub cache_dir: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: 30,
            offline: false,
            cache_dir: None,
        }
    }

    /// Configuration that only ever uses the local cache
    pub fn offline() -> Self {
        Self::default().with_offline(true)
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Load from `BIZDESK_*` environment variables.
    ///
    /// Missing or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("BIZDESK_API_URL").unwrap_or(defaults.base_url),
            token: None,
            timeout: std::env::var("BIZDESK_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout),
            offline: std::env::var("BIZDESK_OFFLINE")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.offline),
            cache_dir: std::env::var("BIZDESK_CACHE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Cache backing this configuration
    pub fn cache_store(&self) -> Arc<dyn CacheStore> {
        match &self.cache_dir {
            Some(dir) => Arc::new(FileCache::new(dir)),
            None => Arc::new(MemoryCache::new()),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ClientConfig::new("https://api.example.com")
            .with_token("t")
            .with_timeout(5)
            .with_cache_dir("/tmp/bizdesk");
        assert_eq!(config.timeout, 5);
        assert_eq!(config.token.as_deref(), Some("t"));
        assert!(!config.offline);
        assert!(ClientConfig::offline().offline);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
