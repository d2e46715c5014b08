//! Error types for Datos Viewer
//!
//! This module defines the error types for every component of the application.
//! Catalog and loader failures are values the browser renders; the one-shot
//! commands convert them into [`AppError`] so the binary exits non-zero.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Transport-level errors raised by the HTTP client
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, DNS, TLS or timeout failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// URL could not be parsed
    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Client settings rejected before any request was made
    #[error("Invalid HTTP client settings: {reason}")]
    InvalidSettings { reason: String },
}

/// Catalog index errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Request never produced a response
    #[error("Could not reach the catalog index: {message}")]
    Network { message: String },

    /// Index answered with a non-success status
    #[error("Catalog index returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Body was not JSON
    #[error("Catalog index returned invalid JSON")]
    Decode(#[from] serde_json::Error),

    /// JSON was valid but lacked `result.items`
    #[error("Catalog index response has an unexpected shape: {reason}")]
    UnexpectedShape { reason: String },
}

impl CatalogError {
    /// Failure tag shown next to the message
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::Network { .. } => "NetworkError",
            CatalogError::Http { .. } => "HttpError",
            CatalogError::Decode(_) => "DecodeError",
            CatalogError::UnexpectedShape { .. } => "UnexpectedShape",
        }
    }
}

impl From<TransportError> for CatalogError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Status { status, message } => CatalogError::Http { status, message },
            other => CatalogError::Network {
                message: other.to_string(),
            },
        }
    }
}

/// Terminal classification of a failed dataset load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Distribution could not be downloaded
    FetchError,
    /// Endpoint served a web page instead of a data file
    NotDataContent,
    /// Body does not look like the resolved format at all
    InvalidFormat,
    /// Parser rejected the body
    ParseError,
    /// JSON parsed but its top level is not tabular
    UnsupportedShape,
    /// Neither hint nor Content-Type names a supported format
    UnsupportedFormat,
    /// Parsed frame has no rows or no columns
    EmptyResult,
}

impl FailureKind {
    /// Stable tag used in logs and the UI
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::FetchError => "FetchError",
            FailureKind::NotDataContent => "NotDataContent",
            FailureKind::InvalidFormat => "InvalidFormat",
            FailureKind::ParseError => "ParseError",
            FailureKind::UnsupportedShape => "UnsupportedShape",
            FailureKind::UnsupportedFormat => "UnsupportedFormat",
            FailureKind::EmptyResult => "EmptyResult",
        }
    }

    /// Whether a later call with the same inputs could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, FailureKind::FetchError)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure produced by the format-sniffing loader
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct LoadFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl LoadFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ParseError, message)
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Default configuration could not be rendered
    #[error("Could not serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// No per-user configuration directory on this platform
    #[error("Could not determine user config directory")]
    NoConfigDir,

    /// I/O error reading or writing the configuration file
    #[error("Configuration file I/O error: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP client error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Catalog index error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Dataset load failure
    #[error(transparent)]
    Load(#[from] LoadFailure),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error (terminal setup, stdout)
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Transport(TransportError::Network(_))
            | AppError::Catalog(CatalogError::Network { .. }) => true,
            AppError::Catalog(CatalogError::Http { status, .. }) => *status >= 500,
            AppError::Load(failure) => failure.kind.is_transient(),
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Transport(_) => "transport",
            AppError::Catalog(_) => "catalog",
            AppError::Load(_) => "load",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Transport result type alias
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Catalog result type alias
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
