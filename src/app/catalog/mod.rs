//! Catalog pager for the datos.gob.es dataset index
//!
//! - [`models`] - dataset descriptors, the title resolver and candidates
//! - [`pager`] - page fetching and the page cursor
//! - [`search`] - free-text and format filtering of candidates

pub mod models;
pub mod pager;
pub mod search;

pub use models::{
    extract_candidates, resolve_title, Candidate, DatasetDescriptor, Distribution, FormatField,
    TitleField,
};
pub use pager::{CatalogPager, PageCursor, PageResult};
pub use search::filter_candidates;
