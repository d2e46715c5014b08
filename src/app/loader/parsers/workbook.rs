//! Excel workbooks (xls, xlsx, xlsb, ods) via calamine; first sheet only

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::app::loader::frame::{header_names, unnamed, Cell, FrameBuilder};
use crate::errors::{FailureKind, LoadFailure};

pub fn parse_workbook(bytes: &[u8]) -> Result<FrameBuilder, LoadFailure> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| LoadFailure::parse(format!("Could not open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names();
    tracing::debug!("Workbook sheets: {:?}", sheet_names);

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadFailure::new(FailureKind::EmptyResult, "Workbook has no sheets"))?
        .map_err(|e| LoadFailure::parse(format!("Could not read first sheet: {}", e)))?;

    let mut rows = range.rows();
    let mut builder = FrameBuilder::new();
    let Some(header) = rows.next() else {
        return Ok(builder);
    };

    let headers = header_names(header.iter().map(|value| value.to_string()));
    for name in &headers {
        builder.declare(vec![name.clone()]);
    }

    // cells past the header row get a placeholder column instead of being dropped
    for row in rows {
        builder.push_row(row.iter().enumerate().map(|(position, value)| {
            let name = headers
                .get(position)
                .cloned()
                .unwrap_or_else(|| unnamed(position));
            (vec![name], sheet_cell(value))
        }));
    }
    Ok(builder)
}

fn sheet_cell(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::Bool(b) => Cell::Bool(*b),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) => Cell::text(s),
        other => Cell::text(&other.to_string()),
    }
}
