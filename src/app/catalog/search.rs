//! Candidate filtering by free-text term and format

use super::models::Candidate;

/// Keeps candidates whose title or description contains `term`
/// (case-insensitive) and, when `formats` is non-empty, whose hint contains
/// one of the listed formats
pub fn filter_candidates<'a>(
    candidates: &'a [Candidate],
    term: Option<&str>,
    formats: &[String],
) -> Vec<&'a Candidate> {
    let term = term
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());

    candidates
        .iter()
        .filter(|candidate| match &term {
            Some(term) => {
                candidate.title.to_lowercase().contains(term)
                    || candidate.description.to_lowercase().contains(term)
            }
            None => true,
        })
        .filter(|candidate| {
            formats.is_empty()
                || formats
                    .iter()
                    .any(|format| candidate.format_hint.contains(&format.to_lowercase()))
        })
        .collect()
}
