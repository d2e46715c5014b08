//! JSON documents
//!
//! An object becomes a single row with nested object keys flattened into
//! path columns. An array of objects becomes one row per element; nested
//! values inside array elements are kept as nested cells. Anything else is
//! not a table.

use serde_json::{Map, Value};

use crate::app::loader::frame::{Cell, ColumnPath, FrameBuilder};
use crate::errors::{FailureKind, LoadFailure};

pub fn parse_json(text: &str) -> Result<FrameBuilder, LoadFailure> {
    let document: Value = serde_json::from_str(text)
        .map_err(|e| LoadFailure::parse(format!("Invalid JSON: {}", e)))?;

    let mut builder = FrameBuilder::new();
    match document {
        Value::Object(object) => {
            let mut row = Vec::new();
            flatten_object(&object, &mut Vec::new(), &mut row);
            builder.push_row(row);
        }
        Value::Array(elements) => {
            if let Some(position) = elements.iter().position(|e| !e.is_object()) {
                return Err(LoadFailure::new(
                    FailureKind::UnsupportedShape,
                    format!(
                        "JSON array element {} is {}, expected an object",
                        position,
                        describe(&elements[position])
                    ),
                ));
            }
            for element in elements.iter().filter_map(Value::as_object) {
                builder.push_row(
                    element
                        .iter()
                        .map(|(key, value)| (vec![key.clone()], Cell::from_json(value))),
                );
            }
        }
        other => {
            return Err(LoadFailure::new(
                FailureKind::UnsupportedShape,
                format!(
                    "JSON document is {}, expected an object or an array of objects",
                    describe(&other)
                ),
            ))
        }
    }

    Ok(builder)
}

/// Depth-first walk collecting one `(path, cell)` per leaf
fn flatten_object(
    object: &Map<String, Value>,
    prefix: &mut ColumnPath,
    row: &mut Vec<(ColumnPath, Cell)>,
) {
    for (key, value) in object {
        prefix.push(key.clone());
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_object(inner, prefix, row),
            _ => row.push((prefix.clone(), Cell::from_json(value))),
        }
        prefix.pop();
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_flattens_to_one_row() {
        let frame = parse_json(r#"{"x":1,"y":{"z":2}}"#).unwrap().finish();
        assert_eq!(frame.column_names(), vec!["x", "y_z"]);
        assert_eq!(frame.row_count(), 1);
        assert_eq!(frame.column("y_z").unwrap().cells, vec![Cell::Int(2)]);
    }

    #[test]
    fn test_deep_nesting_and_empty_objects() {
        let frame = parse_json(r#"{"a":{"b":{"c":"x"},"d":{}}}"#).unwrap().finish();
        assert_eq!(frame.column_names(), vec!["a_b_c", "a_d"]);
        assert_eq!(frame.column("a_d").unwrap().cells, vec![Cell::Nested(json!({}))]);
    }

    #[test]
    fn test_array_of_objects_unions_keys() {
        let frame = parse_json(r#"[{"a":1},{"b":2}]"#).unwrap().finish();
        assert_eq!(frame.column_names(), vec!["a", "b"]);
        assert_eq!(frame.row_count(), 2);
        assert_eq!(frame.column("a").unwrap().cells, vec![Cell::Int(1), Cell::Empty]);
        assert_eq!(frame.column("b").unwrap().cells, vec![Cell::Empty, Cell::Int(2)]);
    }

    #[test]
    fn test_array_elements_keep_nested_values() {
        let frame = parse_json(r#"[{"id":1,"geo":{"lat":40.4}}]"#).unwrap().finish();
        assert_eq!(frame.column_names(), vec!["id", "geo"]);
        assert_eq!(
            frame.column("geo").unwrap().cells,
            vec![Cell::Nested(json!({"lat": 40.4}))]
        );
    }

    #[test]
    fn test_unsupported_shapes() {
        for text in ["42", "\"texto\"", "null", "[1, 2]", "[{\"a\":1}, 3]"] {
            let err = parse_json(text).unwrap_err();
            assert_eq!(err.kind, FailureKind::UnsupportedShape, "{}", text);
        }
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = parse_json("{\"a\": ").unwrap_err();
        assert_eq!(err.kind, FailureKind::ParseError);
        assert!(err.message.starts_with("Invalid JSON"));
    }

    #[test]
    fn test_empty_array_has_no_rows() {
        let frame = parse_json("[]").unwrap().finish();
        assert!(frame.is_empty());
    }
}
