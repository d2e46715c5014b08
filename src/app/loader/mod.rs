//! Format-sniffing loader
//!
//! Turns a `(url, format_hint)` pair into a [`TabularFrame`] or a
//! [`LoadFailure`]. The pipeline is:
//!
//! 1. fetch the payload through a [`PayloadSource`]
//! 2. decode it lossily and reject HTML pages served in place of data
//! 3. resolve the format from the hint and the Content-Type
//! 4. parse with the matching parser and flatten to a frame
//!
//! Every failure is returned as a value; nothing here panics or propagates
//! a raw transport error.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::client::PayloadSource;
use crate::constants::preview;
use crate::errors::{FailureKind, LoadFailure};

pub mod frame;
pub mod parsers;
pub mod sniff;

pub use frame::{Cell, Column, FrameBuilder, TabularFrame};
pub use sniff::{detect_html, resolve_format, DataFormat, HtmlVerdict};

/// Outcome of one load
pub type LoadResult = Result<LoadedDataset, LoadFailure>;

/// Diagnostics about the payload a frame was parsed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadInfo {
    pub url: String,
    /// Lower-cased Content-Type, empty when the server sent none
    pub content_type: String,
    /// Leading characters of the decoded body
    pub snippet: String,
}

/// A successfully parsed payload
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    pub frame: TabularFrame,
    pub format: DataFormat,
    pub payload: PayloadInfo,
}

/// Pipeline stages, used for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Fetching,
    Fetched,
    Sniffing,
    Parsing,
    Finished,
}

/// Fetches and parses distribution payloads
#[derive(Debug)]
pub struct FormatSniffingLoader<S> {
    source: Arc<S>,
    snippet_chars: usize,
}

impl<S: PayloadSource> FormatSniffingLoader<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            snippet_chars: preview::SNIPPET_CHARS,
        }
    }

    /// Sets how many characters of the body are kept as a snippet
    pub fn with_snippet_chars(mut self, snippet_chars: usize) -> Self {
        self.snippet_chars = snippet_chars;
        self
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Loads `url` as a table, trusting `format_hint` only as far as the
    /// payload agrees with it
    pub async fn load(&self, url: &str, format_hint: &str) -> LoadResult {
        let result = self.run(url, format_hint).await;
        match &result {
            Ok(dataset) => info!(
                "Loaded {} as {}: {} rows x {} columns",
                url,
                dataset.format,
                dataset.frame.row_count(),
                dataset.frame.column_count()
            ),
            Err(failure) => warn!("Could not load {}: {}", url, failure),
        }
        result
    }

    async fn run(&self, url: &str, format_hint: &str) -> LoadResult {
        trace_stage(LoadStage::Fetching, url);
        let payload = self
            .source
            .fetch(url)
            .await
            .map_err(|e| LoadFailure::new(FailureKind::FetchError, e.to_string()))?;

        trace_stage(LoadStage::Fetched, url);
        let decoded = String::from_utf8_lossy(&payload.bytes);
        let text = sniff::strip_bom(&decoded);
        debug!(
            "{} bytes, content type {:?}, hint {:?}",
            payload.bytes.len(),
            payload.content_type,
            format_hint
        );

        trace_stage(LoadStage::Sniffing, url);
        if let Some(verdict) = detect_html(&payload.content_type, text) {
            return Err(LoadFailure::new(
                FailureKind::NotDataContent,
                verdict.describe(),
            ));
        }

        let format = resolve_format(format_hint, &payload.content_type).ok_or_else(|| {
            LoadFailure::new(
                FailureKind::UnsupportedFormat,
                format!(
                    "Unsupported format (hint {:?}, content type {:?})",
                    format_hint, payload.content_type
                ),
            )
        })?;

        trace_stage(LoadStage::Parsing, url);
        let frame = parsers::parse_payload(format, text, &payload.bytes)?.finish();

        trace_stage(LoadStage::Finished, url);
        if frame.is_empty() {
            return Err(LoadFailure::new(
                FailureKind::EmptyResult,
                format!("The {} payload contains no rows", format),
            ));
        }

        Ok(LoadedDataset {
            frame,
            format,
            payload: PayloadInfo {
                snippet: text.chars().take(self.snippet_chars).collect(),
                url: payload.url,
                content_type: payload.content_type,
            },
        })
    }
}

fn trace_stage(stage: LoadStage, url: &str) {
    debug!("{:?}: {}", stage, url);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::FetchedPayload;
    use crate::errors::{TransportError, TransportResult};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Serves canned bodies; unknown URLs answer 404
    struct Canned(HashMap<String, (String, Vec<u8>)>);

    impl Canned {
        fn one(url: &str, content_type: &str, body: &[u8]) -> Arc<Self> {
            let mut map = HashMap::new();
            map.insert(url.to_string(), (content_type.to_string(), body.to_vec()));
            Arc::new(Self(map))
        }
    }

    #[async_trait]
    impl PayloadSource for Canned {
        async fn fetch(&self, url: &str) -> TransportResult<FetchedPayload> {
            let (content_type, bytes) = self.0.get(url).cloned().ok_or(TransportError::Status {
                status: 404,
                message: "Not Found".to_string(),
            })?;
            Ok(FetchedPayload {
                url: url.to_string(),
                content_type,
                bytes,
            })
        }
    }

    const URL: &str = "https://example.org/data";

    async fn load(content_type: &str, body: &[u8], hint: &str) -> LoadResult {
        FormatSniffingLoader::new(Canned::one(URL, content_type, body))
            .load(URL, hint)
            .await
    }

    #[tokio::test]
    async fn test_csv_with_semicolons() {
        let dataset = load("text/csv", b"a;b\n1;2\n", "csv").await.unwrap();
        assert_eq!(dataset.format, DataFormat::Csv);
        assert_eq!(dataset.frame.column_names(), vec!["a", "b"]);
        assert_eq!(dataset.frame.row_count(), 1);
        assert_eq!(dataset.payload.snippet, "a;b\n1;2\n");
    }

    #[tokio::test]
    async fn test_bom_is_ignored() {
        let dataset = load("", "\u{feff}a,b\n1,2\n".as_bytes(), "csv").await.unwrap();
        assert_eq!(dataset.frame.column_names(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_html_guard_beats_hint() {
        let failure = load("text/html", b"<!DOCTYPE html><html></html>", "csv")
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::NotDataContent);

        let failure = load("application/json", b"<html><title>Error</title></html>", "json")
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::NotDataContent);
        assert!(failure.message.contains("Error"));
    }

    #[tokio::test]
    async fn test_not_xml_is_invalid_format() {
        let failure = load("text/plain", b"not xml", "xml").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidFormat);
    }

    #[tokio::test]
    async fn test_unknown_format_names_both_inputs() {
        let failure = load("application/zip", b"PK\x03\x04", "zip").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::UnsupportedFormat);
        assert!(failure.message.contains("zip"));
        assert!(failure.message.contains("application/zip"));
    }

    #[tokio::test]
    async fn test_content_type_overrides_missing_hint() {
        let dataset = load("application/json; charset=utf-8", br#"{"x":1}"#, "")
            .await
            .unwrap();
        assert_eq!(dataset.format, DataFormat::Json);
    }

    #[tokio::test]
    async fn test_empty_payloads() {
        let failure = load("text/csv", b"a;b\n", "csv").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::EmptyResult);

        let failure = load("application/json", b"[]", "json").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::EmptyResult);
    }

    #[tokio::test]
    async fn test_transport_failure_is_fetch_error() {
        let loader = FormatSniffingLoader::new(Canned::one(URL, "text/csv", b"a\n1\n"));
        let failure = loader.load("https://example.org/missing", "csv").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::FetchError);
        assert!(failure.message.contains("404"));
    }

    #[tokio::test]
    async fn test_snippet_is_truncated() {
        let body = format!("a\n{}", "1\n".repeat(400));
        let loader = FormatSniffingLoader::new(Canned::one(URL, "text/csv", body.as_bytes()))
            .with_snippet_chars(10);
        let dataset = loader.load(URL, "csv").await.unwrap();
        assert_eq!(dataset.payload.snippet.chars().count(), 10);
        assert_eq!(dataset.frame.row_count(), 400);
    }
}
