//! Command-line interface components
//!
//! This module contains CLI-specific code for Datos Viewer: argument
//! parsing, the non-interactive commands, their text rendering and the
//! interactive browser.

pub mod args;
pub mod browse;
pub mod commands;
pub mod render;

pub use args::{
    BrowseArgs, Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs, ListArgs, PreviewArgs,
    PreviewTarget,
};
pub use browse::{handle_browse, BrowserState};
pub use commands::{handle_config, handle_list, handle_preview, CommandContext};
pub use render::{render_candidates, render_dataset, render_failure, render_frame};
