//! Command-line argument parsing for Datos Viewer
//!
//! This module defines the CLI structure using clap derive macros. Page
//! numbers and dataset positions are 1-based on the command line, matching
//! what the browser and `list` display.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Datos Viewer - browse and preview the datos.gob.es open data catalog
#[derive(Parser, Debug)]
#[command(
    name = "datos_viewer",
    version,
    about = "Browse the datos.gob.es catalog and preview datasets as tables",
    long_about = "A terminal viewer for the Spanish open data catalog (datos.gob.es).
Pages through the dataset index and previews the first distribution of a dataset as a table,
detecting CSV, JSON, XML and spreadsheet payloads regardless of what the catalog declares."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Validate TLS certificates (disabled by default for the catalog's hosts)
    #[arg(long, global = true)]
    pub verify_certs: bool,

    /// Write logs to this file; the only way to see logs while browsing
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive catalog browser
    Browse(BrowseArgs),

    /// Print one page of the catalog
    List(ListArgs),

    /// Load one dataset and print a preview table
    Preview(PreviewArgs),

    /// Show or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the browse command
#[derive(Args, Debug, Clone)]
pub struct BrowseArgs {
    /// Page to open first (1-based)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Initial search term
    #[arg(short, long)]
    pub filter: Option<String>,
}

/// Arguments for the list command
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Page to list (1-based)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Only datasets whose title or description contains this term
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only datasets whose format hint contains one of these (e.g. csv,json)
    #[arg(long, value_delimiter = ',')]
    pub formats: Vec<String>,
}

/// Arguments for the preview command
#[derive(Args, Debug, Clone, Default)]
pub struct PreviewArgs {
    /// Catalog page holding the dataset (1-based)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: Option<u32>,

    /// Position of the dataset on that page, as shown by `list` (1-based)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub index: Option<u64>,

    /// Load this URL directly instead of a catalog entry
    #[arg(long, conflicts_with_all = ["page", "index"])]
    pub url: Option<String>,

    /// Format hint to pair with --url (csv, json, xml, xlsx, MIME types...)
    #[arg(long, requires = "url")]
    pub format: Option<String>,

    /// Rows to show (defaults to the configured preview rows)
    #[arg(short, long)]
    pub rows: Option<usize>,

    /// Also print the first characters of the raw payload
    #[arg(long)]
    pub show_snippet: bool,
}

/// What `preview` should load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewTarget {
    /// The n-th dataset (0-based) of a catalog page (0-based)
    Catalog { page_index: u32, position: usize },
    /// A URL and hint given directly
    Direct { url: String, format_hint: String },
}

/// Arguments for config management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a commented default configuration file
    Init {
        /// Where to write it (defaults to the per-user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging level requested by flags, `None` when no flag was given
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }

    /// True when the command takes over the terminal
    pub fn is_interactive(&self) -> bool {
        matches!(self.command, Commands::Browse(_))
    }
}

impl BrowseArgs {
    pub fn page_index(&self) -> u32 {
        self.page.saturating_sub(1)
    }
}

impl ListArgs {
    pub fn page_index(&self) -> u32 {
        self.page.saturating_sub(1)
    }
}

impl PreviewArgs {
    /// Resolves the arguments to a single target
    pub fn target(&self) -> Result<PreviewTarget, String> {
        if let Some(url) = &self.url {
            return Ok(PreviewTarget::Direct {
                url: url.trim().to_string(),
                format_hint: self
                    .format
                    .as_deref()
                    .unwrap_or_default()
                    .trim()
                    .to_lowercase(),
            });
        }

        let Some(index) = self.index else {
            return Err("Specify --index (with an optional --page) or --url".to_string());
        };
        Ok(PreviewTarget::Catalog {
            page_index: self.page.unwrap_or(1).saturating_sub(1),
            position: usize::try_from(index.saturating_sub(1))
                .map_err(|_| format!("Index {} is too large", index))?,
        })
    }
}
