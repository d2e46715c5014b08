//! Plain-text rendering for the non-interactive commands

use crate::app::catalog::Candidate;
use crate::app::loader::{LoadedDataset, TabularFrame};
use crate::constants::preview;
use crate::errors::LoadFailure;

/// Shortens `text` to `width` characters, marking the cut with `…`
pub fn truncate_cell(text: &str, width: usize) -> String {
    let single_line: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if single_line.chars().count() <= width {
        return single_line;
    }
    let mut shortened: String = single_line.chars().take(width.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}

/// Numbered dataset list; numbers are 1-based positions on the page
pub fn render_candidates(candidates: &[&Candidate]) -> String {
    let mut out = String::new();
    for (position, candidate) in candidates.iter().enumerate() {
        let format = if candidate.format_hint.is_empty() {
            "?"
        } else {
            candidate.format_hint.as_str()
        };
        out.push_str(&format!(
            "{:>3}. {} [{}]\n",
            position + 1,
            candidate.title,
            format
        ));
        if candidate.has_url() {
            out.push_str(&format!("     {}\n", candidate.url));
        } else {
            out.push_str("     (no download URL)\n");
        }
    }
    out
}

/// First `rows` rows of `frame` as an aligned text table
pub fn render_frame(frame: &TabularFrame, rows: usize) -> String {
    let header: Vec<String> = frame
        .column_names()
        .into_iter()
        .map(|name| truncate_cell(name, preview::MAX_CELL_WIDTH))
        .collect();
    let body: Vec<Vec<String>> = frame
        .head(rows)
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| truncate_cell(&cell.to_string(), preview::MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(column, name)| {
            body.iter()
                .map(|row| row[column].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&format_row(&header, &widths));
    out.push_str(&format!(
        "{}\n",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    ));
    for row in &body {
        out.push_str(&format_row(row, &widths));
    }
    out
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    format!("{}\n", padded.join(" | ").trim_end())
}

/// Summary, columns and preview table for a loaded dataset
pub fn render_dataset(dataset: &LoadedDataset, rows: usize, show_snippet: bool) -> String {
    let frame = &dataset.frame;
    let mut out = format!(
        "Format: {} ({} rows x {} columns)\nContent-Type: {}\nURL: {}\n\nColumns: {}\n\n",
        dataset.format,
        frame.row_count(),
        frame.column_count(),
        if dataset.payload.content_type.is_empty() {
            "(none)"
        } else {
            dataset.payload.content_type.as_str()
        },
        dataset.payload.url,
        frame.column_names().join(", ")
    );
    out.push_str(&render_frame(frame, rows));
    if show_snippet {
        out.push_str(&format!("\nRaw payload start:\n{}\n", dataset.payload.snippet));
    }
    out
}

/// One-line failure description
pub fn render_failure(failure: &LoadFailure) -> String {
    format!("Could not load dataset ({}): {}", failure.kind, failure.message)
}
