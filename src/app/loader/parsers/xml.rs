//! XML documents
//!
//! The document is read into a small element tree first. Every child of the
//! root element is one row: its attributes and leaf children are columns,
//! deeper elements contribute path columns (`address_city`), and a row
//! element holding only text becomes a column named after itself.

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::app::loader::frame::{Cell, ColumnPath, FrameBuilder};
use crate::errors::LoadFailure;

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, LoadFailure> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| {
                LoadFailure::parse(format!("Invalid attribute in <{}>: {}", name, e))
            })?;
            let key = attribute.key.as_ref();
            if key == b"xmlns" || key.starts_with(b"xmlns:") {
                continue;
            }
            let raw = String::from_utf8_lossy(&attribute.value);
            let value = unescape(&raw)
                .map_err(|e| {
                    LoadFailure::parse(format!("Invalid attribute in <{}>: {}", name, e))
                })?
                .into_owned();
            attributes.push((
                String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned(),
                value,
            ));
        }

        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    fn is_leaf(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty()
    }
}

pub fn parse_xml(text: &str) -> Result<FrameBuilder, LoadFailure> {
    let root = read_tree(text)?;
    tracing::debug!(
        "XML root <{}> with {} record elements",
        root.name,
        root.children.len()
    );

    let mut builder = FrameBuilder::new();
    for record in &root.children {
        let mut row = Vec::new();
        if record.is_leaf() || !record.text.is_empty() {
            row.push((vec![record.name.clone()], Cell::text(&record.text)));
        }
        collect_fields(record, &mut Vec::new(), &mut row);
        builder.push_row(row);
    }
    Ok(builder)
}

fn read_tree(text: &str) -> Result<Element, LoadFailure> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            LoadFailure::parse(format!(
                "Invalid XML at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(start) => open.push(Element::open(&start)?),
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                attach(element, &mut open, &mut root)?;
            }
            Event::End(end) => {
                let element = open.pop().ok_or_else(|| {
                    LoadFailure::parse(format!(
                        "Unexpected closing tag </{}>",
                        String::from_utf8_lossy(end.local_name().as_ref())
                    ))
                })?;
                attach(element, &mut open, &mut root)?;
            }
            Event::Text(content) => {
                if let Some(current) = open.last_mut() {
                    let unescaped = content
                        .unescape()
                        .map_err(|e| LoadFailure::parse(format!("Invalid XML text: {}", e)))?;
                    current.text.push_str(&unescaped);
                }
            }
            Event::CData(content) => {
                if let Some(current) = open.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&content.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(LoadFailure::parse(format!(
            "Unclosed element <{}> at end of document",
            unclosed.name
        )));
    }
    root.ok_or_else(|| LoadFailure::parse("XML document has no root element"))
}

/// Hands a closed element to its parent, or makes it the root
fn attach(
    element: Element,
    open: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), LoadFailure> {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(LoadFailure::parse(format!(
                "Second root element <{}>",
                element.name
            )))
        }
    }
    Ok(())
}

fn collect_fields(
    element: &Element,
    prefix: &mut ColumnPath,
    row: &mut Vec<(ColumnPath, Cell)>,
) {
    for (key, value) in &element.attributes {
        prefix.push(key.clone());
        row.push((prefix.clone(), Cell::text(value)));
        prefix.pop();
    }
    for child in &element.children {
        prefix.push(child.name.clone());
        if child.is_leaf() || !child.text.is_empty() {
            row.push((prefix.clone(), Cell::text(&child.text)));
        }
        collect_fields(child, prefix, row);
        prefix.pop();
    }
}
