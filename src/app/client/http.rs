//! Core HTTP operations with rate limiting
//!
//! This module provides the single GET operation both catalog paging and
//! dataset loading are built on. Requests are rate limited but never retried;
//! a failure is reported to the caller, who decides whether to ask again.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use url::Url;

use crate::constants::http;
use crate::errors::{TransportError, TransportResult};

use super::FetchedPayload;

/// HTTP operations handler
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and rate limiting
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidSettings` if the rate limit is zero
    pub fn new(client: Client, rate_limit_rps: u32) -> TransportResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> TransportResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let rps =
            NonZeroU32::new(rate_limit_rps).ok_or_else(|| TransportError::InvalidSettings {
                reason: "Rate limit must be non-zero".to_string(),
            })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    /// Issues a GET and fails on any non-success status
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Network` when no response arrives and
    /// `TransportError::Status` when the server answers with an error code
    pub async fn get_response(&self, url: &Url) -> TransportResult<reqwest::Response> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        tracing::debug!("GET {}", url);
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = summarize_error_body(status.canonical_reason(), &body);
            tracing::warn!("GET {} failed with HTTP {}: {}", url, status.as_u16(), message);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Fetches a URL fully into memory along with its declared Content-Type
    pub async fn fetch(&self, url: &Url) -> TransportResult<FetchedPayload> {
        let response = self.get_response(url).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();

        let bytes = response.bytes().await?.to_vec();
        tracing::debug!(
            "Fetched {} bytes from {} (content-type: {:?})",
            bytes.len(),
            url,
            content_type
        );

        Ok(FetchedPayload {
            url: url.to_string(),
            content_type,
            bytes,
        })
    }
}

/// Builds the message attached to a failed status: reason phrase plus a
/// short excerpt of whatever the server sent back
fn summarize_error_body(reason: Option<&str>, body: &str) -> String {
    let reason = reason.unwrap_or("Unknown status");
    let excerpt: String = body
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(http::MAX_ERROR_BODY_CHARS)
        .collect();

    if excerpt.is_empty() {
        reason.to_string()
    } else {
        format!("{} ({})", reason, excerpt)
    }
}
