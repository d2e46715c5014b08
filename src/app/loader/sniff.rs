//! Content sniffing: the HTML guard and format resolution
//!
//! Both are pure functions of the format hint, the Content-Type header and
//! the decoded body so they can be exercised without any network I/O.

use std::fmt;

use scraper::{Html, Selector};

/// Payload formats the loader can parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    Xml,
    Csv,
    Json,
    Spreadsheet,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Xml => "XML",
            DataFormat::Csv => "CSV",
            DataFormat::Json => "JSON",
            DataFormat::Spreadsheet => "Spreadsheet",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A format and the test deciding whether a hint or Content-Type names it
struct FormatRule {
    format: DataFormat,
    matches: fn(&str) -> bool,
}

/// Evaluated in order; the first rule matching either string wins
const FORMAT_RULES: &[FormatRule] = &[
    FormatRule {
        format: DataFormat::Xml,
        matches: names_xml,
    },
    FormatRule {
        format: DataFormat::Csv,
        matches: names_csv,
    },
    FormatRule {
        format: DataFormat::Json,
        matches: names_json,
    },
    FormatRule {
        format: DataFormat::Spreadsheet,
        matches: names_spreadsheet,
    },
];

/// `xml`, except Office Open XML workbooks whose MIME type also contains it
fn names_xml(s: &str) -> bool {
    s.contains("xml") && !s.contains("spreadsheetml")
}

fn names_csv(s: &str) -> bool {
    s.contains("csv")
}

fn names_json(s: &str) -> bool {
    s.contains("json")
}

fn names_spreadsheet(s: &str) -> bool {
    s.contains("excel") || s.contains("spreadsheetml")
}

/// Picks the parser for a payload from the hint and the Content-Type.
/// Either string can select a format.
pub fn resolve_format(format_hint: &str, content_type: &str) -> Option<DataFormat> {
    let hint = format_hint.to_lowercase();
    let content_type = content_type.to_lowercase();

    FORMAT_RULES
        .iter()
        .find(|rule| (rule.matches)(&hint) || (rule.matches)(&content_type))
        .map(|rule| rule.format)
}

/// Why a payload was classified as a web page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlVerdict {
    /// `<title>` of the page when one could be found
    pub page_title: Option<String>,
}

impl HtmlVerdict {
    pub fn describe(&self) -> String {
        match &self.page_title {
            Some(title) => format!(
                "The URL returned an HTML page (\"{}\") instead of a data file",
                title
            ),
            None => "The URL returned an HTML page instead of a data file".to_string(),
        }
    }
}

/// Flags payloads that are web pages: an `html` Content-Type, or a body
/// opening with an HTML doctype or `<html>` tag
pub fn detect_html(content_type: &str, text: &str) -> Option<HtmlVerdict> {
    let by_header = content_type.to_lowercase().contains("html");
    if !by_header && !starts_like_html(text) {
        return None;
    }
    Some(HtmlVerdict {
        page_title: page_title(text),
    })
}

fn starts_like_html(text: &str) -> bool {
    let head: String = strip_bom(text)
        .trim_start()
        .chars()
        .take(16)
        .collect::<String>()
        .to_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

fn page_title(text: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let document = Html::parse_document(text);
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!title.is_empty()).then_some(title)
}

/// Drops a leading UTF-8 byte order mark
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}
