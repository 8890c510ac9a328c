//! Client configuration

use std::path::PathBuf;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default debounce window for invalidation signals
pub const DEFAULT_REFRESH_DEBOUNCE_MS: u64 = 300;

/// Client configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | FIELDOPS_API_URL | http://localhost:8000/api | API root |
/// | FIELDOPS_TOKEN | - | bearer token |
/// | FIELDOPS_TIMEOUT_SECS | 30 | request timeout |
/// | FIELDOPS_DEBOUNCE_MS | 300 | signal debounce window |
/// | FIELDOPS_SESSION_DIR | - | directory holding `session.json` |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL (e.g., "http://localhost:8000/api")
    pub base_url: String,

    /// Bearer token for authentication
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Debounce window for repeated invalidation signals (milliseconds)
    pub refresh_debounce_ms: u64,

    /// Where the local session file lives
    pub session_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            refresh_debounce_ms: DEFAULT_REFRESH_DEBOUNCE_MS,
            session_dir: None,
        }
    }

    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::new(
            std::env::var("FIELDOPS_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
        );
        config.token = std::env::var("FIELDOPS_TOKEN").ok().filter(|t| !t.is_empty());
        config.timeout = std::env::var("FIELDOPS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        config.refresh_debounce_ms = std::env::var("FIELDOPS_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REFRESH_DEBOUNCE_MS);
        config.session_dir = std::env::var("FIELDOPS_SESSION_DIR").ok().map(PathBuf::from);
        config
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

    /// Set the debounce window
    pub fn with_refresh_debounce_ms(mut self, millis: u64) -> Self {
        self.refresh_debounce_ms = millis;
        self
    }

    /// Set the session directory
    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = Some(dir.into());
        self
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> crate::ClientResult<crate::NetworkHttpClient> {
        crate::NetworkHttpClient::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::new("http://api.test")
            .with_token("abc")
            .with_timeout(5)
            .with_refresh_debounce_ms(50)
            .with_session_dir("/tmp/fieldops");

        assert_eq!(config.base_url, "http://api.test");
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.timeout, 5);
        assert_eq!(config.refresh_debounce_ms, 50);
        assert_eq!(config.session_dir, Some(PathBuf::from("/tmp/fieldops")));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT_SECS);
        assert!(config.token.is_none());
    }
}
