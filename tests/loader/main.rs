//! Integration tests for the format-sniffing loader
//!
//! These tests drive the public loader API against an in-memory payload
//! source, covering each supported format and each failure kind.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use datos_viewer::app::{DataFormat, FetchedPayload, FormatSniffingLoader, PayloadSource};
use datos_viewer::errors::{FailureKind, TransportError, TransportResult};

/// Serves fixed bodies keyed by URL; anything else is a 404
#[derive(Default)]
struct StaticSource {
    payloads: HashMap<String, (String, Vec<u8>)>,
}

impl StaticSource {
    fn with(mut self, url: &str, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.payloads
            .insert(url.to_string(), (content_type.to_string(), body.into()));
        self
    }
}

#[async_trait]
impl PayloadSource for StaticSource {
    async fn fetch(&self, url: &str) -> TransportResult<FetchedPayload> {
        match self.payloads.get(url) {
            Some((content_type, bytes)) => Ok(FetchedPayload {
                url: url.to_string(),
                content_type: content_type.clone(),
                bytes: bytes.clone(),
            }),
            None => Err(TransportError::Status {
                status: 404,
                message: "Not Found".to_string(),
            }),
        }
    }
}

fn loader(source: StaticSource) -> FormatSniffingLoader<StaticSource> {
    FormatSniffingLoader::new(Arc::new(source))
}

fn column_text(dataset: &datos_viewer::app::LoadedDataset, column: &str) -> Vec<String> {
    dataset
        .frame
        .column(column)
        .unwrap_or_else(|| panic!("missing column {}", column))
        .cells
        .iter()
        .map(|cell| cell.to_string())
        .collect()
}

#[tokio::test]
async fn test_semicolon_csv_with_bom_and_octet_stream() {
    let body = "\u{feff}municipio;parados;mes\nMadrid;1200;enero\nGetafe;310;enero\n";
    let source = StaticSource::default().with(
        "https://opendata.test/paro.csv",
        "application/octet-stream",
        body,
    );

    let dataset = loader(source)
        .load("https://opendata.test/paro.csv", "text/csv")
        .await
        .unwrap();

    assert_eq!(dataset.format, DataFormat::Csv);
    assert_eq!(
        dataset.frame.column_names(),
        vec!["municipio", "parados", "mes"]
    );
    assert_eq!(column_text(&dataset, "municipio"), vec!["Madrid", "Getafe"]);
    assert_eq!(column_text(&dataset, "parados"), vec!["1200", "310"]);
    assert!(dataset.payload.snippet.starts_with("municipio;"));
}

#[tokio::test]
async fn test_content_type_selects_format_without_hint() {
    let source = StaticSource::default().with(
        "https://opendata.test/api",
        "application/json; charset=utf-8",
        r#"[{"codigo": "28079", "nombre": "Madrid"}, {"codigo": "08019", "nombre": "Barcelona"}]"#,
    );

    let dataset = loader(source)
        .load("https://opendata.test/api", "")
        .await
        .unwrap();

    assert_eq!(dataset.format, DataFormat::Json);
    assert_eq!(dataset.frame.row_count(), 2);
    assert_eq!(column_text(&dataset, "codigo"), vec!["28079", "08019"]);
}

#[tokio::test]
async fn test_single_json_object_flattens_nested_keys() {
    let source = StaticSource::default().with(
        "https://opendata.test/estacion.json",
        "application/json",
        r#"{"estacion": "Retiro", "medidas": {"no2": 41, "pm10": 18.5}}"#,
    );

    let dataset = loader(source)
        .load("https://opendata.test/estacion.json", "json")
        .await
        .unwrap();

    assert_eq!(
        dataset.frame.column_names(),
        vec!["estacion", "medidas_no2", "medidas_pm10"]
    );
    assert_eq!(dataset.frame.row_count(), 1);
}

#[tokio::test]
async fn test_xml_records() {
    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
        <museos>
          <museo codigo="M1"><nombre>Prado</nombre><direccion><ciudad>Madrid</ciudad></direccion></museo>
          <museo codigo="M2"><nombre>Guggenheim</nombre><direccion><ciudad>Bilbao</ciudad></direccion></museo>
        </museos>"#;
    let source =
        StaticSource::default().with("https://opendata.test/museos.xml", "text/xml", body);

    let dataset = loader(source)
        .load("https://opendata.test/museos.xml", "")
        .await
        .unwrap();

    assert_eq!(dataset.format, DataFormat::Xml);
    assert_eq!(
        dataset.frame.column_names(),
        vec!["codigo", "nombre", "direccion_ciudad"]
    );
    assert_eq!(
        column_text(&dataset, "direccion_ciudad"),
        vec!["Madrid", "Bilbao"]
    );
}

#[tokio::test]
async fn test_openxml_workbook_by_content_type() {
    let source = StaticSource::default().with(
        "https://opendata.test/descarga?id=7",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        &include_bytes!("../fixtures/paro.xlsx")[..],
    );

    let dataset = loader(source)
        .load("https://opendata.test/descarga?id=7", "")
        .await
        .unwrap();

    assert_eq!(dataset.format, DataFormat::Spreadsheet);
    assert_eq!(
        dataset.frame.column_names(),
        vec!["municipio", "parados", "municipio.1", "Unnamed: 3"]
    );
    assert_eq!(dataset.frame.row_count(), 2);
    assert_eq!(column_text(&dataset, "municipio"), vec!["Madrid", "Lugo"]);
    assert_eq!(column_text(&dataset, "municipio.1"), vec!["MAD", "LUG"]);
    assert_eq!(column_text(&dataset, "parados"), vec!["1200", ""]);
}

#[tokio::test]
async fn test_failure_kinds() {
    let source = StaticSource::default()
        .with(
            "https://opendata.test/portal",
            "text/html; charset=utf-8",
            "<!DOCTYPE html><html><head><title>Portal de datos</title></head></html>",
        )
        .with("https://opendata.test/fake.xml", "text/plain", "id,valor\n1,2\n")
        .with("https://opendata.test/number.json", "application/json", "42")
        .with("https://opendata.test/broken.json", "application/json", "{\"a\":")
        .with("https://opendata.test/file.pdf", "application/pdf", "%PDF-1.4")
        .with("https://opendata.test/empty.csv", "text/csv", "a,b\n")
        .with("https://opendata.test/ragged.csv", "text/csv", "a,b\n1,2\n1,2,3\n");
    let loader = loader(source);

    let cases = [
        ("https://opendata.test/missing.csv", "csv", FailureKind::FetchError),
        ("https://opendata.test/portal", "csv", FailureKind::NotDataContent),
        ("https://opendata.test/fake.xml", "xml", FailureKind::InvalidFormat),
        ("https://opendata.test/number.json", "json", FailureKind::UnsupportedShape),
        ("https://opendata.test/broken.json", "json", FailureKind::ParseError),
        ("https://opendata.test/file.pdf", "pdf", FailureKind::UnsupportedFormat),
        ("https://opendata.test/empty.csv", "csv", FailureKind::EmptyResult),
        ("https://opendata.test/ragged.csv", "csv", FailureKind::ParseError),
    ];

    for (url, hint, expected) in cases {
        let failure = loader.load(url, hint).await.unwrap_err();
        assert_eq!(failure.kind, expected, "{}: {}", url, failure.message);
        assert!(!failure.message.is_empty());
    }
}

#[tokio::test]
async fn test_html_page_title_is_reported() {
    let source = StaticSource::default().with(
        "https://opendata.test/login",
        "",
        "  <html><head><title>Acceso restringido</title></head><body></body></html>",
    );

    let failure = loader(source)
        .load("https://opendata.test/login", "xml")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::NotDataContent);
    assert!(failure.message.contains("Acceso restringido"));
}

/// Hits the public catalog; run with `cargo test -- --ignored`
#[tokio::test]
#[ignore]
async fn test_real_catalog_first_page_previews() {
    use datos_viewer::app::{CatalogPager, DatosClient};

    let client = Arc::new(DatosClient::new().unwrap());
    let pager = CatalogPager::datos_gob_es(client.clone()).unwrap();
    let loader = FormatSniffingLoader::new(client);

    let page = pager.fetch_page(0).await.unwrap();
    assert!(!page.is_empty());

    for candidate in page.candidates().iter().filter(|c| c.has_url()).take(3) {
        match loader.load(&candidate.url, &candidate.format_hint).await {
            Ok(dataset) => assert!(!dataset.frame.is_empty()),
            Err(failure) => println!("{}: {}", candidate.title, failure),
        }
    }
}
