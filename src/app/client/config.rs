//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the reqwest
//! client shared by the catalog pager and the dataset loader.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{http, limits};
use crate::errors::{TransportError, TransportResult};

/// Configuration for the HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Skip TLS certificate validation.
    ///
    /// Several datos.gob.es publishers serve distributions with expired or
    /// self-signed certificates, so this is on by default. While it is on,
    /// [`ClientConfig::tls_advisory`] returns a warning the UI must show.
    pub accept_invalid_certs: bool,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum number of idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: true,
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> TransportResult<Client> {
        let mut client_builder = Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .tcp_nodelay(self.tcp_nodelay)
            .pool_max_idle_per_host(self.pool_max_per_host)
            .danger_accept_invalid_certs(self.accept_invalid_certs);

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        if self.accept_invalid_certs {
            tracing::warn!("Building HTTP client with certificate validation disabled");
        }

        client_builder.build().map_err(TransportError::Network)
    }

    /// Warning to display for as long as certificate validation is off
    pub fn tls_advisory(&self) -> Option<&'static str> {
        self.accept_invalid_certs
            .then_some(http::INSECURE_TLS_ADVISORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert!(config.accept_invalid_certs);
        assert!(config.tcp_nodelay);
        assert_eq!(config.rate_limit_rps, limits::DEFAULT_RATE_LIMIT_RPS);
    }

    #[test]
    fn test_advisory_follows_flag() {
        let insecure = ClientConfig::default();
        assert_eq!(insecure.tls_advisory(), Some(http::INSECURE_TLS_ADVISORY));

        let secure = ClientConfig {
            accept_invalid_certs: false,
            ..Default::default()
        };
        assert_eq!(secure.tls_advisory(), None);
    }

    #[test]
    fn test_http_client_creation() {
        let config = ClientConfig::default();
        assert!(config.build_http_client().is_ok());
    }

    #[test]
    fn test_http_client_with_custom_config() {
        let config = ClientConfig {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            accept_invalid_certs: false,
            ..Default::default()
        };
        assert!(config.build_http_client().is_ok());
    }
}
