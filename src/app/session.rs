//! Per-user browsing state
//!
//! A [`Session`] owns everything that outlives a single interaction: the
//! page cursor, the page currently displayed, the selection, the search
//! filter and the load cache. Catalog failures never escape a session; they
//! become a notice on an empty page.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::app::cache::{CacheStats, CachedLoader};
use crate::app::catalog::{filter_candidates, Candidate, CatalogPager, PageCursor, PageResult};
use crate::app::client::PayloadSource;
use crate::app::loader::{FormatSniffingLoader, LoadResult};
use crate::errors::CatalogResult;

/// What the UI shows for the current page
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub page: PageResult,
    pub candidates: Vec<Candidate>,
    /// Set when the page could not be fetched
    pub notice: Option<String>,
}

impl PageView {
    fn fetched(page: PageResult) -> Self {
        Self {
            candidates: page.candidates(),
            page,
            notice: None,
        }
    }

    fn failed(page_index: u32, notice: String) -> Self {
        Self {
            page: PageResult::empty(page_index),
            candidates: Vec::new(),
            notice: Some(notice),
        }
    }
}

/// Result of asking the session to load its selection
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// Nothing is selected
    NoSelection,
    /// The selected dataset's first distribution has no URL
    MissingUrl { title: String },
    /// The loader ran (or answered from the cache)
    Loaded(LoadResult),
}

/// Browsing state for one user
#[derive(Debug)]
pub struct Session<S> {
    pager: CatalogPager<S>,
    loader: CachedLoader<S>,
    cursor: PageCursor,
    view: PageView,
    selected: Option<Candidate>,
    filter: Option<String>,
}

impl<S: PayloadSource> Session<S> {
    /// Creates a session; no page is fetched until [`Session::open_page`]
    pub fn new(pager: CatalogPager<S>, loader: FormatSniffingLoader<S>) -> Self {
        Self {
            pager,
            loader: CachedLoader::new(loader),
            cursor: PageCursor::default(),
            view: PageView::fetched(PageResult::empty(0)),
            selected: None,
            filter: None,
        }
    }

    /// Convenience constructor sharing one source between pager and loader
    pub fn with_source(source: Arc<S>, index_url: &str) -> CatalogResult<Self> {
        let pager = CatalogPager::new(source.clone(), index_url)?;
        Ok(Self::new(pager, FormatSniffingLoader::new(source)))
    }

    /// Fetches page `page_index` and makes it current, clearing the selection
    pub async fn open_page(&mut self, page_index: u32) -> &PageView {
        self.cursor = PageCursor::new(page_index);
        self.selected = None;

        self.view = match self.pager.fetch_page(page_index).await {
            Ok(page) => PageView::fetched(page),
            Err(e) => {
                warn!("Catalog page {} unavailable: {}", page_index, e);
                PageView::failed(page_index, format!("{}: {}", e.kind(), e))
            }
        };
        &self.view
    }

    /// Next is offered only after a page that had items
    pub fn can_go_next(&self) -> bool {
        !self.view.page.is_empty()
    }

    pub fn can_go_previous(&self) -> bool {
        self.cursor.has_previous()
    }

    /// Moves forward one page; returns false when Next is not offered
    pub async fn next_page(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        let next = self.cursor.next();
        self.open_page(next.index()).await;
        true
    }

    /// Moves back one page; returns false on the first page
    pub async fn previous_page(&mut self) -> bool {
        if !self.can_go_previous() {
            return false;
        }
        let previous = self.cursor.previous();
        self.open_page(previous.index()).await;
        true
    }

    /// Selects the `index`-th visible candidate
    pub fn select(&mut self, index: usize) -> Option<&Candidate> {
        let candidate = self.visible_candidates().get(index).map(|c| (*c).clone());
        debug!("Selected {:?}", candidate.as_ref().map(|c| &c.title));
        self.selected = candidate;
        self.selected.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Sets or clears the search term; a selection hidden by the new
    /// filter is dropped
    pub fn set_filter(&mut self, term: Option<String>) {
        self.filter = term
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        if let Some(selected) = &self.selected {
            let still_visible = self.visible_candidates().iter().any(|c| *c == selected);
            if !still_visible {
                self.selected = None;
            }
        }
    }

    /// Candidates of the current page that pass the filter
    pub fn visible_candidates(&self) -> Vec<&Candidate> {
        filter_candidates(&self.view.candidates, self.filter.as_deref(), &[])
    }

    /// Loads the selected dataset through the session cache
    pub async fn load_selected(&mut self) -> SelectionOutcome {
        let Some(candidate) = self.selected.clone() else {
            return SelectionOutcome::NoSelection;
        };
        if !candidate.has_url() {
            return SelectionOutcome::MissingUrl {
                title: candidate.title,
            };
        }
        SelectionOutcome::Loaded(
            self.loader
                .load(&candidate.url, &candidate.format_hint)
                .await,
        )
    }

    /// Standing warning the UI must display, if any
    pub fn advisory(&self) -> Option<&'static str> {
        self.loader.loader().source().advisory()
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn view(&self) -> &PageView {
        &self.view
    }

    pub fn selected(&self) -> Option<&Candidate> {
        self.selected.as_ref()
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.loader.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::FetchedPayload;
    use crate::errors::{FailureKind, TransportError, TransportResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INDEX: &str = "https://catalog.test/dataset.json";

    /// Two catalog pages, an empty third page and a CSV distribution
    #[derive(Default)]
    struct FakeCatalog {
        requests: AtomicUsize,
    }

    #[async_trait]
    impl PayloadSource for FakeCatalog {
        async fn fetch(&self, url: &str) -> TransportResult<FetchedPayload> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let body = match url {
                "https://catalog.test/dataset.json?_page=0" => json!({"result": {"items": [
                    {"title": [{"_lang": "es", "_value": "Paro registrado"}],
                     "distribution": [{"accessURL": "https://files.test/paro.csv", "format": {"value": "text/csv"}}]},
                    {"title": "Sin enlace", "distribution": {"format": "csv"}},
                    {"title": "Sin distribuciones"}
                ]}})
                .to_string(),
                "https://catalog.test/dataset.json?_page=1" => json!({"result": {"items": [
                    {"title": "Aparcamientos", "distribution": [{"accessURL": "https://files.test/parking.json", "format": "json"}]}
                ]}})
                .to_string(),
                "https://catalog.test/dataset.json?_page=2" => json!({"result": {"items": []}}).to_string(),
                "https://files.test/paro.csv" => "municipio;parados\nLugo;120\n".to_string(),
                _ => {
                    return Err(TransportError::Status {
                        status: 500,
                        message: "Internal Server Error".to_string(),
                    })
                }
            };
            Ok(FetchedPayload {
                url: url.to_string(),
                content_type: String::new(),
                bytes: body.into_bytes(),
            })
        }

        fn advisory(&self) -> Option<&'static str> {
            Some("insecure")
        }
    }

    fn session() -> (Arc<FakeCatalog>, Session<FakeCatalog>) {
        let source = Arc::new(FakeCatalog::default());
        let session = Session::with_source(source.clone(), INDEX).unwrap();
        (source, session)
    }

    #[tokio::test]
    async fn test_next_then_previous_returns_to_first_page() {
        let (_, mut session) = session();
        session.open_page(0).await;
        assert!(!session.can_go_previous());
        assert_eq!(session.view().candidates.len(), 2);

        assert!(session.next_page().await);
        assert_eq!(session.cursor().index(), 1);
        assert_eq!(session.view().candidates[0].title, "Aparcamientos");

        assert!(session.previous_page().await);
        assert_eq!(session.cursor().index(), 0);
        assert_eq!(session.view().candidates[0].title, "Paro registrado");
        assert!(!session.previous_page().await);
    }

    #[tokio::test]
    async fn test_empty_page_disables_next() {
        let (_, mut session) = session();
        session.open_page(2).await;
        assert!(!session.can_go_next());
        assert!(!session.next_page().await);
        assert_eq!(session.cursor().display_number(), 3);
    }

    #[tokio::test]
    async fn test_failed_page_becomes_notice() {
        let (_, mut session) = session();
        let view = session.open_page(9).await;
        assert!(view.candidates.is_empty());
        let notice = view.notice.clone().unwrap();
        assert!(notice.starts_with("HttpError"));
        assert!(!session.can_go_next());
    }

    #[tokio::test]
    async fn test_selection_outcomes() {
        let (source, mut session) = session();
        session.open_page(0).await;
        assert_eq!(session.load_selected().await, SelectionOutcome::NoSelection);

        session.select(1);
        assert_eq!(
            session.load_selected().await,
            SelectionOutcome::MissingUrl {
                title: "Sin enlace".to_string()
            }
        );

        session.select(0);
        let before = source.requests.load(Ordering::SeqCst);
        let first = session.load_selected().await;
        let second = session.load_selected().await;
        assert_eq!(first, second);
        assert_eq!(source.requests.load(Ordering::SeqCst), before + 1);
        assert_eq!(session.cache_stats().hits, 1);

        match first {
            SelectionOutcome::Loaded(Ok(dataset)) => {
                assert_eq!(dataset.frame.column_names(), vec!["municipio", "parados"]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_page_change_clears_selection() {
        let (_, mut session) = session();
        session.open_page(0).await;
        session.select(0);
        session.next_page().await;
        assert!(session.selected().is_none());
    }

    #[tokio::test]
    async fn test_filter_limits_candidates_and_selection() {
        let (_, mut session) = session();
        session.open_page(0).await;
        session.select(0);

        session.set_filter(Some("enlace".to_string()));
        assert_eq!(session.visible_candidates().len(), 1);
        assert!(session.selected().is_none());

        session.set_filter(Some("   ".to_string()));
        assert_eq!(session.filter(), None);
        assert_eq!(session.visible_candidates().len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_distribution_is_fetch_error() {
        let (_, mut session) = session();
        session.open_page(1).await;
        session.select(0);
        match session.load_selected().await {
            SelectionOutcome::Loaded(Err(failure)) => {
                assert_eq!(failure.kind, FailureKind::FetchError)
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(session.advisory(), Some("insecure"));
    }
}
