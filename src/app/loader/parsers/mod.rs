//! One parser per [`DataFormat`], all producing a [`FrameBuilder`]

use crate::app::loader::frame::FrameBuilder;
use crate::app::loader::sniff::DataFormat;
use crate::errors::{FailureKind, LoadFailure};

pub mod delimited;
pub mod json;
pub mod workbook;
pub mod xml;

pub use delimited::{parse_delimited, sniff_delimiter};
pub use json::parse_json;
pub use workbook::parse_workbook;
pub use xml::parse_xml;

/// Parses a payload already known to be `format`.
///
/// Text formats read the lossily decoded `text`; workbooks need the raw
/// `bytes`.
pub fn parse_payload(
    format: DataFormat,
    text: &str,
    bytes: &[u8],
) -> Result<FrameBuilder, LoadFailure> {
    match format {
        DataFormat::Xml => {
            if !text.trim_start().starts_with('<') {
                return Err(LoadFailure::new(
                    FailureKind::InvalidFormat,
                    "Content does not look like XML",
                ));
            }
            parse_xml(text)
        }
        DataFormat::Csv => parse_delimited(text),
        DataFormat::Json => parse_json(text),
        DataFormat::Spreadsheet => parse_workbook(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_requires_markup() {
        let err = parse_payload(DataFormat::Xml, "not xml", b"not xml").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidFormat);

        assert!(parse_payload(DataFormat::Xml, "  <r><p>1</p></r>", b"").is_ok());
    }

    #[test]
    fn test_dispatch_by_format() {
        let csv = parse_payload(DataFormat::Csv, "a;b\n1;2\n", b"").unwrap().finish();
        assert_eq!(csv.column_names(), vec!["a", "b"]);

        let json = parse_payload(DataFormat::Json, "[{\"k\":1}]", b"").unwrap().finish();
        assert_eq!(json.column_names(), vec!["k"]);
    }
}
