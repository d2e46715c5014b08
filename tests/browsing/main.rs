//! Integration tests for catalog paging and the browsing session
//!
//! A scripted catalog with two populated pages and an empty third page
//! stands in for datos.gob.es. Every request is recorded so tests can
//! assert what went over the wire.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use datos_viewer::app::{
    CatalogPager, FetchedPayload, FormatSniffingLoader, PayloadSource, SelectionOutcome, Session,
};
use datos_viewer::errors::{FailureKind, TransportError, TransportResult};
use serde_json::{json, Value};

const INDEX: &str = "https://catalog.test/apidata/catalog/dataset.json";

#[derive(Default)]
struct ScriptedCatalog {
    requests: Mutex<Vec<String>>,
}

impl ScriptedCatalog {
    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn requests_for(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.as_str() == url).count()
    }

    fn page(index: &str) -> Option<Value> {
        let items = match index {
            "0" => json!([
                {
                    "_about": "https://datos.gob.es/catalogo/paro",
                    "title": [
                        {"_lang": "en", "_value": "Unemployment"},
                        {"_lang": "es", "_value": "Paro registrado"}
                    ],
                    "description": {"_lang": "es", "_value": "Paro por municipio"},
                    "distribution": [
                        {"accessURL": "https://files.test/paro.csv", "format": {"value": "text/csv"}},
                        {"accessURL": "https://files.test/paro.json", "format": {"value": "application/json"}}
                    ]
                },
                {
                    "title": "Sin distribuciones",
                    "distribution": []
                },
                {
                    "title": [{"_lang": "ca", "_value": "Qualitat de l'aire"}],
                    "distribution": {"accessURL": "https://files.test/portal", "format": {"value": "XML"}}
                }
            ]),
            "1" => json!([
                {
                    "title": "Bibliotecas",
                    "distribution": [{"format": {"value": "text/csv"}}]
                }
            ]),
            "2" => json!([]),
            _ => return None,
        };
        Some(json!({"result": {"items": items, "totalItems": 4}}))
    }
}

#[async_trait]
impl PayloadSource for ScriptedCatalog {
    async fn fetch(&self, url: &str) -> TransportResult<FetchedPayload> {
        self.requests.lock().unwrap().push(url.to_string());

        let (content_type, body) = if let Some(index) = url.strip_prefix(&format!("{}?_page=", INDEX))
        {
            match Self::page(index) {
                Some(page) => ("application/json".to_string(), page.to_string()),
                None => {
                    return Err(TransportError::Status {
                        status: 500,
                        message: "Internal Server Error".to_string(),
                    })
                }
            }
        } else if url == "https://files.test/paro.csv" {
            (
                "text/csv".to_string(),
                "municipio,parados\nMadrid,1200\nSevilla,800\n".to_string(),
            )
        } else if url == "https://files.test/portal" {
            (
                "text/html".to_string(),
                "<html><head><title>Portal</title></head></html>".to_string(),
            )
        } else {
            return Err(TransportError::Status {
                status: 404,
                message: "Not Found".to_string(),
            });
        };

        Ok(FetchedPayload {
            url: url.to_string(),
            content_type,
            bytes: body.into_bytes(),
        })
    }
}

fn session() -> (Arc<ScriptedCatalog>, Session<ScriptedCatalog>) {
    let source = Arc::new(ScriptedCatalog::default());
    let pager = CatalogPager::new(source.clone(), INDEX).unwrap();
    let session = Session::new(pager, FormatSniffingLoader::new(source.clone()));
    (source, session)
}

#[tokio::test]
async fn test_first_page_candidates() {
    let (source, mut session) = session();
    let view = session.open_page(0).await;

    assert!(view.notice.is_none());
    assert_eq!(view.page.total_items, Some(4));
    assert_eq!(view.page.items.len(), 3);

    // the dataset without distributions is not selectable
    let titles: Vec<&str> = view.candidates.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Paro registrado", "Qualitat de l'aire"]);
    assert_eq!(view.candidates[0].url, "https://files.test/paro.csv");
    assert_eq!(view.candidates[0].format_hint, "text/csv");
    assert_eq!(view.candidates[0].description, "Paro por municipio");

    assert_eq!(source.requests(), vec![format!("{}?_page=0", INDEX)]);
}

#[tokio::test]
async fn test_paging_until_the_empty_page() {
    let (_, mut session) = session();
    session.open_page(0).await;
    assert!(!session.can_go_previous());

    assert!(session.next_page().await);
    assert_eq!(session.cursor().index(), 1);
    assert!(session.can_go_previous());

    assert!(session.next_page().await);
    assert_eq!(session.cursor().index(), 2);
    assert!(session.view().page.is_empty());
    assert!(session.view().notice.is_none());
    assert!(!session.can_go_next());
    assert!(!session.next_page().await);

    assert!(session.previous_page().await);
    assert!(session.previous_page().await);
    assert_eq!(session.cursor().index(), 0);
    assert!(!session.previous_page().await);
}

#[tokio::test]
async fn test_catalog_failure_becomes_notice() {
    let (_, mut session) = session();
    let view = session.open_page(7).await;

    assert!(view.candidates.is_empty());
    let notice = view.notice.clone().unwrap();
    assert!(notice.starts_with("HttpError"), "{}", notice);
    assert!(notice.contains("500"));
    assert!(!session.can_go_next());
    assert!(session.can_go_previous());
}

#[tokio::test]
async fn test_selection_loads_through_the_cache() {
    let (source, mut session) = session();
    session.open_page(0).await;

    session.select(0);
    let first = session.load_selected().await;
    let SelectionOutcome::Loaded(Ok(dataset)) = &first else {
        panic!("unexpected outcome {:?}", first);
    };
    assert_eq!(dataset.frame.column_names(), vec!["municipio", "parados"]);
    assert_eq!(dataset.frame.row_count(), 2);

    // leaving and coming back keeps the cache
    session.next_page().await;
    session.previous_page().await;
    session.select(0);
    let second = session.load_selected().await;
    assert_eq!(first, second);

    assert_eq!(source.requests_for("https://files.test/paro.csv"), 1);
    let stats = session.cache_stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));
}

#[tokio::test]
async fn test_html_distribution_is_reported() {
    let (_, mut session) = session();
    session.open_page(0).await;
    session.select(1);

    match session.load_selected().await {
        SelectionOutcome::Loaded(Err(failure)) => {
            assert_eq!(failure.kind, FailureKind::NotDataContent);
            assert!(failure.message.contains("Portal"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_url_and_no_selection() {
    let (source, mut session) = session();
    session.open_page(1).await;

    assert_eq!(session.load_selected().await, SelectionOutcome::NoSelection);

    session.select(0);
    assert_eq!(
        session.load_selected().await,
        SelectionOutcome::MissingUrl {
            title: "Bibliotecas".to_string()
        }
    );
    assert_eq!(source.requests().len(), 1);
}

#[tokio::test]
async fn test_filter_narrows_selection() {
    let (_, mut session) = session();
    session.open_page(0).await;
    session.select(1);

    session.set_filter(Some("paro".to_string()));
    assert_eq!(session.visible_candidates().len(), 1);
    assert!(session.selected().is_none());

    assert_eq!(
        session.select(0).map(|c| c.title.clone()),
        Some("Paro registrado".to_string())
    );
    assert!(session.select(1).is_none());
}
