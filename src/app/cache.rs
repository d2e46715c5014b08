//! Session-scoped memo of load results
//!
//! Loads are keyed by `(url, format_hint)`. Entries are never evicted while
//! the session lives and are dropped with it. Fetch failures are the one
//! outcome not stored, so selecting a dataset again after a network error
//! retries it. Parse and format failures are stored like successes because
//! the same payload would fail the same way.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use datos_viewer::app::cache::CachedLoader;
//! use datos_viewer::app::client::DatosClient;
//! use datos_viewer::app::loader::FormatSniffingLoader;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(DatosClient::new()?);
//! let mut loader = CachedLoader::new(FormatSniffingLoader::new(client));
//!
//! let first = loader.load("https://example.org/paro.csv", "text/csv").await;
//! let second = loader.load("https://example.org/paro.csv", "text/csv").await;
//! assert_eq!(first, second);
//! assert_eq!(loader.stats().hits, 1);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::app::client::PayloadSource;
use crate::app::loader::{FormatSniffingLoader, LoadResult};
use crate::errors::FailureKind;

/// Cache key: the exact strings the catalog supplied
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadKey {
    pub url: String,
    pub format_hint: String,
}

impl LoadKey {
    pub fn new(url: impl Into<String>, format_hint: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format_hint: format_hint.into(),
        }
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Share of lookups served from memory, as a percentage
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            (self.hits as f64 / lookups as f64) * 100.0
        }
    }
}

/// In-memory map from [`LoadKey`] to [`LoadResult`]
#[derive(Debug, Default)]
pub struct LoadCache {
    entries: HashMap<LoadKey, LoadResult>,
    hits: u64,
    misses: u64,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `key`, counting the hit or miss
    pub fn get(&mut self, key: &LoadKey) -> Option<&LoadResult> {
        match self.entries.get(key) {
            Some(result) => {
                self.hits += 1;
                Some(result)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Stores `result` unless it is a fetch failure. Returns whether it was stored.
    pub fn insert(&mut self, key: LoadKey, result: LoadResult) -> bool {
        if let Err(failure) = &result {
            if failure.kind == FailureKind::FetchError {
                debug!("Not caching fetch failure for {}", key.url);
                return false;
            }
        }
        self.entries.insert(key, result);
        true
    }

    pub fn contains(&self, key: &LoadKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

/// A loader that consults a [`LoadCache`] before touching the network
#[derive(Debug)]
pub struct CachedLoader<S> {
    loader: FormatSniffingLoader<S>,
    cache: LoadCache,
}

impl<S: PayloadSource> CachedLoader<S> {
    pub fn new(loader: FormatSniffingLoader<S>) -> Self {
        Self {
            loader,
            cache: LoadCache::new(),
        }
    }

    pub fn loader(&self) -> &FormatSniffingLoader<S> {
        &self.loader
    }

    /// Same contract as [`FormatSniffingLoader::load`]; repeated calls with
    /// identical arguments return the stored result
    pub async fn load(&mut self, url: &str, format_hint: &str) -> LoadResult {
        let key = LoadKey::new(url, format_hint);
        if let Some(result) = self.cache.get(&key) {
            debug!("Load cache hit for {}", url);
            return result.clone();
        }

        let result = self.loader.load(url, format_hint).await;
        self.cache.insert(key, result.clone());
        result
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache(&self) -> &LoadCache {
        &self.cache
    }
}
