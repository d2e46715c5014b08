//! Catalog index paging
//!
//! Fetches one page of the dataset index at a time. Pages carry no cursor or
//! version token, so the page index is the only position reference and the
//! contents of a given page may change between requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::app::client::PayloadSource;
use crate::constants::catalog;
use crate::errors::{CatalogError, CatalogResult, TransportError};

use super::models::{extract_candidates, Candidate, DatasetDescriptor};

/// One page of the dataset index
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    /// Zero-based page index this result was fetched for
    pub page_index: u32,
    /// Datasets in index order
    pub items: Vec<DatasetDescriptor>,
    /// `result.totalItems` when the index reports it
    pub total_items: Option<u64>,
    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl PageResult {
    /// An empty page, used when a fetch failed
    pub fn empty(page_index: u32) -> Self {
        Self {
            page_index,
            items: Vec::new(),
            total_items: None,
            fetched_at: Utc::now(),
        }
    }

    /// Selectable candidates for this page
    pub fn candidates(&self) -> Vec<Candidate> {
        extract_candidates(&self.items)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Parses an index response body
    ///
    /// Items that fail to deserialise are skipped with a warning rather than
    /// failing the whole page.
    pub fn from_json(page_index: u32, body: &[u8]) -> CatalogResult<Self> {
        let document: Value = serde_json::from_slice(body)?;

        let result = document
            .get("result")
            .ok_or_else(|| CatalogError::UnexpectedShape {
                reason: "missing `result` object".to_string(),
            })?;

        let raw_items = result
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| CatalogError::UnexpectedShape {
                reason: "missing `result.items` array".to_string(),
            })?;

        let mut items = Vec::with_capacity(raw_items.len());
        for (position, raw) in raw_items.iter().enumerate() {
            match serde_json::from_value::<DatasetDescriptor>(raw.clone()) {
                Ok(item) => items.push(item),
                Err(e) => warn!("Skipping index item {} on page {}: {}", position, page_index, e),
            }
        }

        let total_items = result.get("totalItems").and_then(|total| {
            total
                .as_u64()
                .or_else(|| total.as_str().and_then(|text| text.trim().parse().ok()))
        });

        Ok(Self {
            page_index,
            items,
            total_items,
            fetched_at: Utc::now(),
        })
    }
}

/// Zero-based position in the index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCursor {
    index: u32,
}

impl PageCursor {
    pub fn new(index: u32) -> Self {
        Self { index }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// 1-based number for display
    pub fn display_number(&self) -> u32 {
        self.index.saturating_add(1)
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Cursor for the following page
    pub fn next(&self) -> Self {
        Self::new(self.index.saturating_add(1))
    }

    /// Cursor for the preceding page, staying at 0 on the first page
    pub fn previous(&self) -> Self {
        Self::new(self.index.saturating_sub(1))
    }
}

/// Fetches pages of the catalog index
#[derive(Debug)]
pub struct CatalogPager<S> {
    source: Arc<S>,
    index_url: Url,
}

impl<S: PayloadSource> CatalogPager<S> {
    /// Creates a pager over the given index endpoint
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Network` if `index_url` is not a valid URL
    pub fn new(source: Arc<S>, index_url: &str) -> CatalogResult<Self> {
        let index_url = Url::parse(index_url).map_err(|e| TransportError::InvalidUrl {
            url: index_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { source, index_url })
    }

    /// Creates a pager over the public datos.gob.es index
    pub fn datos_gob_es(source: Arc<S>) -> CatalogResult<Self> {
        Self::new(source, catalog::INDEX_URL)
    }

    /// URL requested for a given page
    pub fn page_url(&self, page_index: u32) -> Url {
        let mut url = self.index_url.clone();
        url.query_pairs_mut()
            .append_pair(catalog::PAGE_PARAM, &page_index.to_string());
        url
    }

    /// Fetches one page of dataset descriptors
    ///
    /// # Errors
    ///
    /// - `CatalogError::Http` for a non-success status
    /// - `CatalogError::Network` when no response arrived
    /// - `CatalogError::Decode` / `UnexpectedShape` for malformed bodies
    pub async fn fetch_page(&self, page_index: u32) -> CatalogResult<PageResult> {
        let url = self.page_url(page_index);
        debug!("Fetching catalog page {} from {}", page_index, url);

        let payload = self.source.fetch(url.as_str()).await?;
        let page = PageResult::from_json(page_index, &payload.bytes)?;

        info!(
            "Catalog page {} has {} datasets (total reported: {:?})",
            page_index,
            page.items.len(),
            page.total_items
        );
        Ok(page)
    }
}
