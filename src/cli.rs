//! CLI argument definition for mdink.
//!
//! This module is intentionally free of non-clap dependencies so that
//! a future xtask could import it via `#[path]` for man page and
//! shell completion generation.

use clap::{Parser, ValueEnum};

/// Terminal WYSIWYG markdown editor.
#[derive(Parser)]
#[command(name = "mdink", version, about = "Terminal WYSIWYG markdown editor")]
pub struct Cli {
    /// Markdown file to open. Omit to start on the welcome screen.
    pub file: Option<String>,

    /// Color theme.
    #[arg(long, value_enum, default_value_t = CliTheme::Dark)]
    pub theme: CliTheme,

    /// Open the file read-only, without binding it for saving.
    #[arg(long)]
    pub plain: bool,

    /// Path to a config file, overriding the default config location.
    #[arg(long)]
    pub config: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliTheme {
    Light,
    Dark,
}

impl From<CliTheme> for crate::config::ThemeName {
    fn from(t: CliTheme) -> Self {
        match t {
            CliTheme::Light => crate::config::ThemeName::Light,
            CliTheme::Dark => crate::config::ThemeName::Dark,
        }
    }
}
