//! legaltoc - legal-style section numbering for documents
//!
//! A CLI tool that numbers the headings of Markdown documents and renders
//! them to HTML with a linked table of contents.

#![deny(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use legaltoc::config::OutlineConfig;
use legaltoc::pipeline::{self, BuildSummary};
use std::path::{Path, PathBuf};

/// Main entry point for the legaltoc CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    // Skipped headings are reported at warn level even without --verbose
    let level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Build {
            input,
            output,
            config,
            strict,
            skip_merge,
        } => {
            handle_build_command(&input, output, config.as_deref(), strict, skip_merge)?;
        }

        Commands::Outline { input, config } => {
            handle_outline_command(&input, config.as_deref())?;
        }

        Commands::Check { input, config } => {
            handle_check_command(&input, config.as_deref())?;
        }
    }

    Ok(())
}

/// Handle the build command
fn handle_build_command(
    input: &Path,
    output: Option<PathBuf>,
    config_path: Option<&Path>,
    strict: bool,
    skip_merge: bool,
) -> Result<()> {
    let mut config = load_config(input, config_path)?;
    config.skip_merge |= skip_merge;

    let summaries: Vec<BuildSummary> = if input.is_dir() {
        let output_dir = output.unwrap_or_else(|| input.join("html"));
        println!("Building {} -> {}", input.display(), output_dir.display());
        pipeline::build_directory(input, &output_dir, &config)
            .with_context(|| format!("Failed to build {}", input.display()))?
            .summaries()
            .cloned()
            .collect()
    } else {
        // Next to the input, e.g. design.md -> design.html
        let output_path =
            output.unwrap_or_else(|| pipeline::output_path(Path::new(""), input, &config.suffix));
        vec![pipeline::build_file(input, &output_path, &config)
            .with_context(|| format!("Failed to build {}", input.display()))?]
    };

    let mut skipped = 0;
    for summary in &summaries {
        println!(
            "✓ {} ({} headings numbered)",
            summary.output.display(),
            summary.numbered
        );
        for failure in &summary.failures {
            println!("  ! {}", failure);
        }
        skipped += summary.failures.len();
    }

    if strict && skipped > 0 {
        anyhow::bail!("{} headings could not be numbered", skipped);
    }

    Ok(())
}

/// Handle the outline command
fn handle_outline_command(input: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(input, config_path)?;
    let built = pipeline::check_file(input, &config)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let lines = built.outline_lines();
    if lines.is_empty() {
        println!("No numbered headings found.");
    }
    for line in lines {
        println!("{}", line);
    }

    Ok(())
}

/// Handle the check command
fn handle_check_command(input: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(input, config_path)?;
    let built = pipeline::check_file(input, &config)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let failures = built.failure_messages();
    if failures.is_empty() {
        println!(
            "✓ All {} headings numbered",
            built.report.numbered.len()
        );
        return Ok(());
    }

    for failure in &failures {
        println!("! {}", failure);
    }
    anyhow::bail!(
        "{} of {} headings could not be numbered",
        failures.len(),
        built.report.headings_seen()
    );
}

/// Load an explicit config file, or legaltoc.toml next to the input
fn load_config(input: &Path, config_path: Option<&Path>) -> Result<OutlineConfig> {
    pipeline::resolve_config(input, config_path)
        .with_context(|| format!("Failed to load configuration for {}", input.display()))
}
