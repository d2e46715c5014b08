//! Application constants for Datos Viewer
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// datos.gob.es catalog endpoints
pub mod catalog {
    /// Dataset index endpoint (JSON flavour of the catalog API)
    pub const INDEX_URL: &str = "https://datos.gob.es/apidata/catalog/dataset.json";

    /// Query parameter carrying the zero-based page number
    pub const PAGE_PARAM: &str = "_page";

    /// Language tag preferred when resolving multilingual titles
    pub const PREFERRED_LANGUAGE: &str = "es";

    /// Title shown when a dataset has no usable title
    pub const UNTITLED: &str = "Sin título";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "Datos-Viewer/0.1.0 (Open Data Preview Tool)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 4;

    /// Maximum number of characters of an error body kept in messages
    pub const MAX_ERROR_BODY_CHARS: usize = 200;

    /// Standing advisory shown while certificate validation is off
    pub const INSECURE_TLS_ADVISORY: &str = "TLS certificate validation is disabled. Downloads may be intercepted or tampered with.";
}

/// Rate limiting configuration
pub mod limits {
    /// Default rate limit for catalog and distribution requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 5;
}

/// Format sniffing and preview constants
pub mod preview {
    /// Rows shown in a preview table
    pub const DEFAULT_ROWS: usize = 5;

    /// Characters of the decoded body kept as a diagnostic snippet
    pub const SNIPPET_CHARS: usize = 500;

    /// Lines inspected when detecting a CSV delimiter
    pub const DELIMITER_SAMPLE_LINES: usize = 20;

    /// Delimiters tried in order; earlier wins ties
    pub const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

    /// Separator used when collapsing hierarchical column paths
    pub const PATH_SEPARATOR: &str = "_";

    /// Column whose nested values are always stringified for display
    pub const SELECTED_LANGUAGES_COLUMN: &str = "selectedLanguages";

    /// Maximum display width of a cell in text tables
    pub const MAX_CELL_WIDTH: usize = 32;
}

/// Logging and configuration file constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "warn";
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file
    pub const LOCAL_FILE: &str = "./datos-viewer.toml";

    /// Directory under the user config dir
    pub const APP_DIR: &str = "datos-viewer";

    /// File name under the per-user directory
    pub const FILE_NAME: &str = "config.toml";
}

// Re-export commonly used constants for convenience
pub use catalog::{INDEX_URL, UNTITLED};
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::DEFAULT_RATE_LIMIT_RPS;
pub use preview::DEFAULT_ROWS as DEFAULT_PREVIEW_ROWS;
