//! Client configuration.

use serde_json::{Map, Value};
use std::env;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Client configuration, shared read-only by every request.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL that relative endpoint paths are appended to.
    pub base_url: Option<String>,
    /// Headers added to every request unless the endpoint opts out.
    pub headers: Vec<(String, String)>,
    /// Query parameters appended after the endpoint's own.
    pub query_parameters: Vec<(String, String)>,
    /// Body parameters merged into key-value bodies.
    pub body_parameters: Map<String, Value>,
    /// Emit curl reconstructions and response dumps.
    pub debug: bool,
    /// Status codes treated as success.
    pub accepted_status: RangeInclusive<u16>,
    /// Default request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// User agent string.
    pub user_agent: String,
    /// Enable gzip compression.
    pub gzip: bool,
    /// Enable brotli compression.
    pub brotli: bool,
    /// Follow redirects.
    pub follow_redirects: bool,
    /// Maximum redirects to follow.
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            headers: Vec::new(),
            query_parameters: Vec::new(),
            body_parameters: Map::new(),
            debug: false,
            accepted_status: 200..=299,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
            user_agent: format!("courier-http/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
            brotli: true,
            follow_redirects: true,
            max_redirects: 10,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Create a configuration from environment variables.
    ///
    /// - `COURIER_BASE_URL` - base URL
    /// - `COURIER_DEBUG=1|true` - enable the debug sink
    /// - `COURIER_TIMEOUT_SECS` - request timeout in seconds
    /// - `COURIER_USER_AGENT` - user agent string
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create a configuration from a variable lookup, using the same keys as
    /// [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        config.base_url = lookup("COURIER_BASE_URL").filter(|s| !s.is_empty());

        config.debug = lookup("COURIER_DEBUG")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        if let Some(secs) = lookup("COURIER_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(user_agent) = lookup("COURIER_USER_AGENT") {
            config.user_agent = user_agent;
        }

        config
    }

    /// Check whether a status code is in the accepted range.
    pub fn accepts(&self, status: u16) -> bool {
        self.accepted_status.contains(&status)
    }
}

/// Builder for client configuration.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Add a default header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.push((name.into(), value.into()));
        self
    }

    /// Add a default query parameter.
    pub fn query_parameter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.config
            .query_parameters
            .push((key.into(), value.to_string()));
        self
    }

    /// Add a default body parameter.
    pub fn body_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.body_parameters.insert(key.into(), value.into());
        self
    }

    /// Enable or disable the debug sink.
    pub fn debug(mut self, enable: bool) -> Self {
        self.config.debug = enable;
        self
    }

    /// Set the range of status codes treated as success.
    pub fn accepted_status(mut self, range: RangeInclusive<u16>) -> Self {
        self.config.accepted_status = range;
        self
    }

    /// Set the default request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the connection pool idle timeout.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Set the maximum idle connections per host.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Enable or disable gzip compression.
    pub fn gzip(mut self, enable: bool) -> Self {
        self.config.gzip = enable;
        self
    }

    /// Enable or disable brotli compression.
    pub fn brotli(mut self, enable: bool) -> Self {
        self.config.brotli = enable;
        self
    }

    /// Enable or disable following redirects.
    pub fn follow_redirects(mut self, enable: bool) -> Self {
        self.config.follow_redirects = enable;
        self
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.base_url.is_none());
        assert!(!config.debug);
        assert!(config.accepts(200));
        assert!(config.accepts(299));
        assert!(!config.accepts(304));
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .header("X-Api-Key", "secret")
            .query_parameter("lang", "en")
            .query_parameter("v", 2)
            .body_parameter("device", "cli")
            .accepted_status(200..=399)
            .debug(true)
            .build();

        assert_eq!(config.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.headers, vec![("X-Api-Key".into(), "secret".into())]);
        assert_eq!(
            config.query_parameters,
            vec![("lang".into(), "en".into()), ("v".into(), "2".into())]
        );
        assert_eq!(config.body_parameters["device"], "cli");
        assert!(config.accepts(304));
        assert!(config.debug);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("COURIER_BASE_URL", "https://env.example.com"),
            ("COURIER_DEBUG", "TRUE"),
            ("COURIER_TIMEOUT_SECS", "5"),
            ("COURIER_USER_AGENT", "courier-test"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.base_url.as_deref(), Some("https://env.example.com"));
        assert!(config.debug);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "courier-test");
    }

    #[test]
    fn test_from_lookup_ignores_invalid_values() {
        let config = ClientConfig::from_lookup(|key| match key {
            "COURIER_BASE_URL" => Some(String::new()),
            "COURIER_DEBUG" => Some("yes".into()),
            "COURIER_TIMEOUT_SECS" => Some("soon".into()),
            _ => None,
        });
        assert!(config.base_url.is_none());
        assert!(!config.debug);
        assert_eq!(config.timeout, ClientConfig::default().timeout);
    }
}
