//! Delimited text (CSV) with delimiter detection
//!
//! Regional exports in the catalog use `;` and tabs as often as commas, so
//! the delimiter is inferred from the text: the candidate that splits the
//! sampled lines into the most consistent non-trivial field count wins.

use std::collections::HashMap;

use csv::ReaderBuilder;

use crate::app::loader::frame::{header_names, Cell, FrameBuilder};
use crate::constants::preview;
use crate::errors::LoadFailure;

/// Infers the delimiter from the first lines of `text`, defaulting to `,`
pub fn sniff_delimiter(text: &str) -> u8 {
    let sample: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(preview::DELIMITER_SAMPLE_LINES)
        .collect();

    let mut best: Option<(u8, usize, usize)> = None;
    for &delimiter in preview::CANDIDATE_DELIMITERS.iter() {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| count_unquoted(line, delimiter))
            .collect();

        let Some((mode, agreeing)) = mode_of(&counts) else {
            continue;
        };
        if mode == 0 {
            continue;
        }

        // more agreeing lines first, then more fields
        let better = match best {
            None => true,
            Some((_, best_mode, best_agreeing)) => {
                (agreeing, mode) > (best_agreeing, best_mode)
            }
        };
        if better {
            best = Some((delimiter, mode, agreeing));
        }
    }

    best.map(|(delimiter, _, _)| delimiter).unwrap_or(b',')
}

/// Occurrences of `delimiter` outside double quotes
fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for &byte in line.as_bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Most common value and how many entries share it; ties go to the larger value
fn mode_of(counts: &[usize]) -> Option<(usize, usize)> {
    let mut tally: HashMap<usize, usize> = HashMap::new();
    for &count in counts {
        *tally.entry(count).or_insert(0) += 1;
    }
    tally
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
}

/// Parses delimited text; the first record is the header
pub fn parse_delimited(text: &str) -> Result<FrameBuilder, LoadFailure> {
    let delimiter = sniff_delimiter(text);
    tracing::debug!("Detected CSV delimiter {:?}", delimiter as char);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = header_names(
        reader
            .headers()
            .map_err(|e| LoadFailure::parse(format!("Could not read CSV header: {}", e)))?,
    );

    let mut builder = FrameBuilder::new();
    for header in &headers {
        builder.declare(vec![header.clone()]);
    }

    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| LoadFailure::parse(format!("CSV error: {}", e)))?;
        if record.len() > headers.len() {
            let line = record
                .position()
                .map(|position| position.line())
                .unwrap_or(index as u64 + 2);
            return Err(LoadFailure::parse(format!(
                "Expected {} fields in line {}, saw {}",
                headers.len(),
                line,
                record.len()
            )));
        }
        builder.push_row(
            headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| (vec![header.clone()], Cell::text(value))),
        );
    }

    Ok(builder)
}
