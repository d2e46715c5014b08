//! Datos Viewer Library
//!
//! Pages through the datos.gob.es open data catalog and previews dataset
//! distributions as tables, whatever format they turn out to be in.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
