//! Data models for the datos.gob.es dataset index
//!
//! Index items are JSON-LD flavoured and loosely shaped: titles arrive as
//! tagged lists, language maps or bare strings, and a lone distribution is
//! sometimes an object rather than a one-element list. The types here accept
//! every shape without failing deserialisation, and [`resolve_title`] is the
//! single place that decides which text to show.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::catalog;

/// One `{_lang, _value}` entry of a multilingual field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedText {
    #[serde(rename = "_lang", default)]
    pub lang: Option<String>,
    #[serde(rename = "_value", default)]
    pub value: Option<Value>,
}

impl TaggedText {
    fn usable_value(&self) -> Option<&str> {
        self.value.as_ref().and_then(usable_str)
    }
}

/// A multilingual text field in any of the shapes the index produces
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TitleField {
    /// Absent or `null`
    #[default]
    Absent,
    /// `[{"_lang": "es", "_value": "..."}, ...]`
    Tagged(Vec<TaggedText>),
    /// `{"es": "...", "en": "..."}`
    ByLanguage(Map<String, Value>),
    /// `"..."`
    Plain(String),
    /// Anything else
    Other(Value),
}

impl TitleField {
    /// Text in the preferred language, else the first usable entry
    pub fn resolve(&self) -> Option<&str> {
        match self {
            TitleField::Tagged(entries) => entries
                .iter()
                .filter(|entry| entry.lang.as_deref() == Some(catalog::PREFERRED_LANGUAGE))
                .find_map(TaggedText::usable_value)
                .or_else(|| entries.iter().find_map(TaggedText::usable_value)),
            // A lone `{_lang, _value}` object lands here too
            TitleField::ByLanguage(map) if map.contains_key("_value") => {
                map.get("_value").and_then(usable_str)
            }
            TitleField::ByLanguage(map) => map
                .get(catalog::PREFERRED_LANGUAGE)
                .and_then(usable_str)
                .or_else(|| map.values().find_map(usable_str)),
            TitleField::Plain(text) => Some(text.as_str()).filter(|t| !t.trim().is_empty()),
            TitleField::Absent | TitleField::Other(_) => None,
        }
    }
}

fn usable_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|text| !text.trim().is_empty())
}

/// Resolves a title field to display text, falling back to the untitled
/// placeholder for missing or unrecognised shapes
pub fn resolve_title(field: &TitleField) -> String {
    field
        .resolve()
        .unwrap_or(catalog::UNTITLED)
        .to_string()
}

/// Declared format of a distribution: a bare string or `{"value": "..."}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatField {
    #[default]
    Absent,
    Labelled {
        #[serde(default)]
        value: Option<String>,
    },
    Plain(String),
    Other(Value),
}

impl FormatField {
    /// Lower-cased hint, empty when unknown
    pub fn hint(&self) -> String {
        match self {
            FormatField::Labelled { value: Some(value) } => value.trim().to_lowercase(),
            FormatField::Plain(value) => value.trim().to_lowercase(),
            _ => String::new(),
        }
    }
}

/// One downloadable representation of a dataset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Distribution {
    #[serde(rename = "accessURL", default, deserialize_with = "lenient_string")]
    pub access_url: String,
    #[serde(default)]
    pub format: FormatField,
}

/// Accepts a string, or anything else as the empty string
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => text,
        _ => String::new(),
    })
}

/// Distribution list; a single object is treated as a one-element list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Distributions {
    Many(Vec<Distribution>),
    One(Box<Distribution>),
    Other(Value),
}

impl Default for Distributions {
    fn default() -> Self {
        Distributions::Many(Vec::new())
    }
}

impl Distributions {
    /// The only distribution the viewer considers
    pub fn first(&self) -> Option<&Distribution> {
        match self {
            Distributions::Many(list) => list.first(),
            Distributions::One(single) => Some(single),
            Distributions::Other(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Distributions::Many(list) => list.len(),
            Distributions::One(_) => 1,
            Distributions::Other(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One item of the catalog index
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    #[serde(rename = "_about", default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default)]
    pub title: TitleField,
    #[serde(default)]
    pub description: TitleField,
    #[serde(default)]
    pub distribution: Distributions,
}

impl DatasetDescriptor {
    /// Display title per the language preference rule
    pub fn display_title(&self) -> String {
        resolve_title(&self.title)
    }

    /// Description in the preferred language, empty when absent
    pub fn display_description(&self) -> String {
        self.description.resolve().unwrap_or_default().to_string()
    }
}

/// A selectable dataset: its title and the first distribution's location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub title: String,
    pub description: String,
    /// May be empty when the catalog omits `accessURL`
    pub url: String,
    /// Lower-cased, may be empty
    pub format_hint: String,
}

impl Candidate {
    /// Builds the candidate for a dataset, `None` when it has no distributions
    pub fn from_dataset(dataset: &DatasetDescriptor) -> Option<Self> {
        let distribution = dataset.distribution.first()?;
        Some(Self {
            title: dataset.display_title(),
            description: dataset.display_description(),
            url: distribution.access_url.trim().to_string(),
            format_hint: distribution.format.hint(),
        })
    }

    pub fn has_url(&self) -> bool {
        !self.url.is_empty()
    }
}

/// Candidates for every dataset on a page that has a distribution
pub fn extract_candidates(datasets: &[DatasetDescriptor]) -> Vec<Candidate> {
    datasets.iter().filter_map(Candidate::from_dataset).collect()
}
