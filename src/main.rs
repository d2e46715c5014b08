//! Datos Viewer CLI application
//!
//! Terminal viewer for the datos.gob.es open data catalog: page through the
//! dataset index and preview distributions as tables.

use std::fs::OpenOptions;
use std::process;
use std::sync::Mutex;

use tracing::{info, warn};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

use datos_viewer::cli::{
    handle_browse, handle_config, handle_list, handle_preview, Cli, CommandContext, Commands,
};
use datos_viewer::config::{AppConfig, LoggingConfig};
use datos_viewer::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &config.logging)?;

    info!("Datos Viewer v{} starting", env!("CARGO_PKG_VERSION"));

    let context = CommandContext::new(config.clone(), &cli.global);
    match cli.command {
        Commands::Browse(args) => {
            info!("Executing browse command");
            handle_browse(args, &context).await
        }
        Commands::List(args) => {
            info!("Executing list command");
            handle_list(args, &context).await
        }
        Commands::Preview(args) => {
            info!("Executing preview command");
            handle_preview(args, &context).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(args, &cli.global, &config).await
        }
    }
}

/// Initialize logging from the verbosity flags, falling back to the
/// configured level
///
/// Logs go to the log file when one is set. Without one they go to stderr,
/// except while browsing, where they are discarded.
fn init_logging(cli: &Cli, logging: &LoggingConfig) -> Result<()> {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| logging.level.trim().to_lowercase());

    let mut filter = EnvFilter::from_default_env();
    let mut rejected_level = None;
    match format!("datos_viewer={}", level).parse::<Directive>() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(_) => rejected_level = Some(level.clone()),
    }

    let log_file = cli.global.log_file.as_ref().or(logging.log_file.as_ref());
    let (writer, to_file) = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), true)
        }
        None if cli.is_interactive() => (BoxMakeWriter::new(std::io::sink), true),
        None => (BoxMakeWriter::new(std::io::stderr), false),
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(!to_file)
        .with_target(false)
        .with_level(cli.global.very_verbose || to_file)
        .init();

    if let Some(level) = rejected_level {
        warn!("Ignoring unknown log level '{}'", level);
    }
    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
    Ok(())
}
