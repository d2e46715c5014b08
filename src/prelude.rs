//! Prelude module for Datos Viewer Library
//!
//! Re-exports the items most integrations need so a single
//! `use datos_viewer::prelude::*;` is enough.
//!
//! # Usage
//!
//! ```rust,no_run
//! use datos_viewer::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Arc::new(DatosClient::new()?);
//!     let mut session = Session::with_source(client, INDEX_URL)?;
//!
//!     session.open_page(0).await;
//!     session.select(0);
//!     if let SelectionOutcome::Loaded(Ok(dataset)) = session.load_selected().await {
//!         println!("{:?}", dataset.frame.column_names());
//!     }
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, FailureKind, LoadFailure, Result};

// Essential app components
pub use crate::app::{
    CachedLoader, Candidate, CatalogPager, Cell, ClientConfig, DataFormat, DatosClient,
    FormatSniffingLoader, LoadResult, LoadedDataset, PageCursor, PageResult, PayloadSource,
    SelectionOutcome, Session, TabularFrame,
};

pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_PREVIEW_ROWS, DEFAULT_RATE_LIMIT_RPS, INDEX_URL, USER_AGENT};

pub use std::sync::Arc;

pub use tokio;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let client_config = ClientConfig::default();
        assert_eq!(client_config.rate_limit_rps, DEFAULT_RATE_LIMIT_RPS);

        let config = AppConfig::default();
        assert_eq!(config.catalog.index_url, INDEX_URL);
        assert_eq!(config.preview.rows, DEFAULT_PREVIEW_ROWS);
    }
}
