//! Command handlers for the Datos Viewer CLI
//!
//! This module connects parsed arguments and loaded configuration to the
//! catalog pager, the loader and the session.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::app::{
    filter_candidates, CatalogPager, ClientConfig, DatosClient, FormatSniffingLoader,
    PayloadSource, SelectionOutcome, Session,
};
use crate::cli::args::{
    ConfigAction, ConfigArgs, GlobalArgs, ListArgs, PreviewArgs, PreviewTarget,
};
use crate::cli::render::{render_candidates, render_dataset};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Configuration and flags every network command needs
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: AppConfig,
    pub quiet: bool,
    client_config: ClientConfig,
}

impl CommandContext {
    /// Combines the file configuration with global flag overrides
    pub fn new(config: AppConfig, global: &GlobalArgs) -> Self {
        let mut client_config = config.client.to_runtime_config();
        if global.verify_certs {
            client_config.accept_invalid_certs = false;
        }
        Self {
            config,
            quiet: global.quiet,
            client_config,
        }
    }

    pub fn client_config(&self) -> &ClientConfig {
        &self.client_config
    }

    /// Builds the HTTP client shared by pager and loader
    pub fn connect(&self) -> Result<Arc<DatosClient>> {
        let client = DatosClient::with_config(self.client_config.clone())?;
        Ok(Arc::new(client))
    }

    /// Loader configured with the preview settings
    pub fn loader<S: PayloadSource>(&self, source: Arc<S>) -> FormatSniffingLoader<S> {
        FormatSniffingLoader::new(source).with_snippet_chars(self.config.preview.snippet_chars)
    }

    /// Prints the transport advisory unless quiet
    fn announce_advisory(&self, source: &impl PayloadSource) {
        if let Some(advisory) = source.advisory() {
            if !self.quiet {
                eprintln!("⚠️  {}", advisory);
            }
        }
    }
}

/// Spinner on stderr, hidden when quiet or not attached to a terminal
fn spinner(message: String, quiet: bool) -> ProgressBar {
    if quiet || !atty::is(atty::Stream::Stderr) {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["◐", "◓", "◑", "◒"]),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Handle the list command
pub async fn handle_list(args: ListArgs, context: &CommandContext) -> Result<()> {
    let client = context.connect()?;
    context.announce_advisory(client.as_ref());
    let pager = CatalogPager::new(client, &context.config.catalog.index_url)?;

    let page_index = args.page_index();
    let progress = spinner(
        format!("Fetching catalog page {}...", page_index + 1),
        context.quiet,
    );
    let page = pager.fetch_page(page_index).await;
    progress.finish_and_clear();
    let page = page?;

    let candidates = page.candidates();
    let visible = filter_candidates(&candidates, args.filter.as_deref(), &args.formats);
    debug!(
        "{} of {} candidates pass the filter",
        visible.len(),
        candidates.len()
    );

    println!(
        "📚 Catalog page {}{}",
        page_index + 1,
        page.total_items
            .map(|total| format!(" ({} datasets in catalog)", total))
            .unwrap_or_default()
    );
    println!();

    if visible.is_empty() {
        if page.is_empty() {
            println!("This page is empty; you are past the end of the catalog.");
        } else {
            println!("No datasets on this page match your criteria.");
        }
        return Ok(());
    }

    print!("{}", render_candidates(&visible));
    Ok(())
}

/// Handle the preview command
pub async fn handle_preview(args: PreviewArgs, context: &CommandContext) -> Result<()> {
    let target = args.target().map_err(AppError::generic)?;
    let rows = args.rows.unwrap_or(context.config.preview.rows);

    let client = context.connect()?;
    context.announce_advisory(client.as_ref());
    let pager = CatalogPager::new(client.clone(), &context.config.catalog.index_url)?;
    let mut session = Session::new(pager, context.loader(client.clone()));

    let outcome = match target {
        PreviewTarget::Direct { url, format_hint } => {
            info!("Previewing {} with hint {:?}", url, format_hint);
            let progress = spinner(format!("Loading {}...", url), context.quiet);
            let outcome =
                SelectionOutcome::Loaded(context.loader(client).load(&url, &format_hint).await);
            progress.finish_and_clear();
            outcome
        }
        PreviewTarget::Catalog {
            page_index,
            position,
        } => {
            let progress = spinner(
                format!("Fetching catalog page {}...", page_index + 1),
                context.quiet,
            );
            let view = session.open_page(page_index).await;
            if let Some(notice) = &view.notice {
                progress.finish_and_clear();
                return Err(AppError::generic(notice.clone()));
            }

            let Some(candidate) = session.select(position).cloned() else {
                progress.finish_and_clear();
                return Err(AppError::generic(format!(
                    "Page {} has no dataset at position {}",
                    page_index + 1,
                    position + 1
                )));
            };
            progress.set_message(format!("Loading {}...", candidate.title));
            let outcome = session.load_selected().await;
            progress.finish_and_clear();

            if !context.quiet {
                println!("📄 {}", candidate.title);
                if !candidate.description.is_empty() {
                    println!("{}", candidate.description);
                }
                println!();
            }
            outcome
        }
    };

    match outcome {
        SelectionOutcome::Loaded(Ok(dataset)) => {
            print!("{}", render_dataset(&dataset, rows, args.show_snippet));
            Ok(())
        }
        SelectionOutcome::Loaded(Err(failure)) => Err(failure.into()),
        SelectionOutcome::MissingUrl { title } => Err(AppError::generic(format!(
            "Dataset '{}' has no download URL",
            title
        ))),
        SelectionOutcome::NoSelection => Err(AppError::generic("No dataset selected")),
    }
}

/// Handle the config command
pub async fn handle_config(
    args: ConfigArgs,
    global: &GlobalArgs,
    config: &AppConfig,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let source = global.config.clone().or_else(AppConfig::find_config_file);
            match source {
                Some(path) => println!("# Loaded from {}", path.display()),
                None => println!("# No configuration file found; showing defaults"),
            }
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        ConfigAction::Init { path, force } => {
            let (path, written) = AppConfig::initialize(path, force).await?;
            if written {
                println!("📁 Created default configuration file:");
                println!("   {}", path.display());
                println!("   You can customize settings by editing this file.");
            } else {
                println!("Configuration file already exists: {}", path.display());
                println!("Use --force to overwrite it.");
            }
            Ok(())
        }
    }
}
