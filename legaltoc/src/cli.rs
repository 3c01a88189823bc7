//! Command-line interface definitions for legaltoc

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI structure for the legaltoc application
#[derive(Parser)]
#[command(name = "legaltoc")]
#[command(version)]
#[command(
    about = "Number document headings legal-style and build a linked table of contents",
    long_about = None
)]
pub struct Cli {
    /// Show progress and per-heading details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for legaltoc
#[derive(Subcommand)]
pub enum Commands {
    /// Build HTML with numbered headings and a table of contents
    Build {
        /// Markdown file or directory of Markdown files
        #[arg(value_name = "PATH", default_value = ".")]
        input: PathBuf,

        /// Output file (for a file input) or directory (for a directory input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (defaults to legaltoc.toml next to the input)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fail when any heading could not be numbered
        #[arg(long)]
        strict: bool,

        /// Do not write the merged page configured in legaltoc.toml
        #[arg(long)]
        skip_merge: bool,
    },

    /// Print the numbered outline of a Markdown file
    Outline {
        /// Markdown file
        input: PathBuf,

        /// Configuration file (defaults to legaltoc.toml next to the input)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Report headings that cannot be numbered (e.g. an h4 without an h3)
    Check {
        /// Markdown file
        input: PathBuf,

        /// Configuration file (defaults to legaltoc.toml next to the input)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
