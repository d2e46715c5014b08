//! HTTP client for the datos.gob.es catalog and its distribution hosts
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration, including the certificate flag
//! - `http`: the rate limited GET both components share
//!
//! [`PayloadSource`] is the transport seam. [`DatosClient`] implements it
//! over reqwest; tests implement it over an in-memory map.

use async_trait::async_trait;
use url::Url;

use crate::errors::{TransportError, TransportResult};

pub mod config;
pub mod http;

pub use config::ClientConfig;

use http::HttpHandler;

/// A response body held in memory together with its declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPayload {
    /// Final URL that was requested
    pub url: String,
    /// Lower-cased Content-Type header, empty when absent
    pub content_type: String,
    /// Raw body
    pub bytes: Vec<u8>,
}

/// Anything that can GET a URL into memory
#[async_trait]
pub trait PayloadSource: Send + Sync {
    /// Fetches `url`, failing on transport errors and non-success statuses
    async fn fetch(&self, url: &str) -> TransportResult<FetchedPayload>;

    /// Advisory the UI must display while this source is in use
    fn advisory(&self) -> Option<&'static str> {
        None
    }
}

/// HTTP client for the catalog index and the distribution hosts
#[derive(Debug)]
pub struct DatosClient {
    http_handler: HttpHandler,
    config: ClientConfig,
}

impl DatosClient {
    /// Creates a client with default configuration
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the underlying reqwest client cannot be built
    pub fn new() -> TransportResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration
    pub fn with_config(config: ClientConfig) -> TransportResult<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.rate_limit_rps)?;

        tracing::info!(
            "Created datos.gob.es client (certificate validation {})",
            if config.accept_invalid_certs {
                "disabled"
            } else {
                "enabled"
            }
        );

        Ok(Self {
            http_handler,
            config,
        })
    }

    /// Configuration the client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl PayloadSource for DatosClient {
    async fn fetch(&self, url: &str) -> TransportResult<FetchedPayload> {
        let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        self.http_handler.fetch(&parsed).await
    }

    fn advisory(&self) -> Option<&'static str> {
        self.config.tls_advisory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::catalog;

    #[test]
    fn test_client_creation() {
        let client = DatosClient::new().unwrap();
        assert!(client.config().accept_invalid_certs);
        assert!(client.advisory().is_some());
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_sending() {
        let client = DatosClient::new().unwrap();
        let result = client.fetch("not a url").await;
        assert!(matches!(result, Err(TransportError::InvalidUrl { .. })));
    }

    #[test]
    fn test_index_url_is_valid() {
        let base_url = Url::parse(catalog::INDEX_URL).unwrap();
        assert_eq!(base_url.scheme(), "https");
        assert_eq!(base_url.host_str(), Some("datos.gob.es"));
    }

    #[tokio::test]
    #[ignore] // Requires network access to datos.gob.es
    async fn test_real_index_fetch() {
        let client = DatosClient::new().unwrap();
        let payload = client
            .fetch(&format!("{}?_page=0", catalog::INDEX_URL))
            .await
            .unwrap();
        assert!(payload.content_type.contains("json"));
        assert!(!payload.bytes.is_empty());
    }
}
