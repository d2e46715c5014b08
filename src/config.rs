//! Configuration management for Datos Viewer
//!
//! Zero-config defaults, optionally overridden by a TOML file found in the
//! standard locations. Durations are written in humantime form (`"30s"`,
//! `"1m"`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::ClientConfig;
use crate::constants::{self, catalog, http, limits, preview};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Catalog index settings
    pub catalog: CatalogConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Preview rendering settings
    pub preview: PreviewConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Catalog index location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfigToml {
    /// Dataset index endpoint; pages are requested with `?_page=N`
    pub index_url: String,
}

impl Default for CatalogConfigToml {
    fn default() -> Self {
        Self {
            index_url: catalog::INDEX_URL.to_string(),
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Skip TLS certificate validation (several publishers need it)
    pub accept_invalid_certs: bool,
    /// Whole-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            accept_invalid_certs: true,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            accept_invalid_certs: self.accept_invalid_certs,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            rate_limit_rps: self.rate_limit_rps,
            user_agent: self.user_agent.clone(),
            ..ClientConfig::default()
        }
    }
}

/// Preview settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfigToml {
    /// Rows shown in the preview table
    pub rows: usize,
    /// Characters of the raw payload kept for diagnostics
    pub snippet_chars: usize,
}

impl Default for PreviewConfigToml {
    fn default() -> Self {
        Self {
            rows: preview::DEFAULT_ROWS,
            snippet_chars: preview::SNIPPET_CHARS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no verbosity flag is given
    pub level: String,
    /// Log file; required to see logs while the browser owns the terminal
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: constants::logging::DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Load configuration with precedence:
    /// 1. Explicit `--config` file (must exist)
    /// 2. First file found in the standard locations
    /// 3. Built-in defaults
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make the client or the pager unusable
    pub fn validate(&self) -> ConfigResult<()> {
        if let Err(e) = Url::parse(&self.catalog.index_url) {
            return Err(ConfigError::InvalidValue {
                field: "catalog.index_url".to_string(),
                value: self.catalog.index_url.clone(),
                reason: e.to_string(),
            });
        }
        if self.client.rate_limit_rps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.rate_limit_rps".to_string(),
                value: "0".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }
        if self.preview.rows == 0 {
            return Err(ConfigError::InvalidValue {
                field: "preview.rows".to_string(),
                value: "0".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Writes the commented default file to `path` (or the per-user
    /// location), leaving an existing file alone unless `force` is set
    pub async fn initialize(path: Option<PathBuf>, force: bool) -> ConfigResult<(PathBuf, bool)> {
        let config_path = match path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        if config_path.exists() && !force {
            debug!("Config file already exists: {}", config_path.display());
            return Ok((config_path, false));
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| ConfigError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: config_path.clone(),
                source,
            })?;

        info!("Wrote default configuration to {}", config_path.display());
        Ok((config_path, true))
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(constants::config::LOCAL_FILE)];
        if let Ok(user_path) = Self::default_config_path() {
            search_paths.push(user_path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Per-user config file path
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir
            .join(constants::config::APP_DIR)
            .join(constants::config::FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Effective configuration as TOML, for `config show`
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# Datos Viewer Configuration
# You can customize any of these settings to suit your needs.

[catalog]
# Dataset index endpoint; pages are requested with ?_page=N
index_url = "{}"

[client]
# Several publishers serve data over invalid certificates. While this is
# true the viewer shows a warning banner. Set to false to verify them.
accept_invalid_certs = true
request_timeout = "1m"
connect_timeout = "30s"
rate_limit_rps = {}
user_agent = "{}"

[preview]
# Rows shown in the preview table
rows = {}
# Characters of the raw payload shown with --show-snippet
snippet_chars = {}

[logging]
level = "{}"  # error, warn, info, debug, trace
# log_file = "/path/to/datos-viewer.log"  # needed to see logs in browse mode
"#,
            catalog::INDEX_URL,
            limits::DEFAULT_RATE_LIMIT_RPS,
            http::USER_AGENT,
            preview::DEFAULT_ROWS,
            preview::SNIPPET_CHARS,
            constants::logging::DEFAULT_LOG_LEVEL,
        )
    }
}
