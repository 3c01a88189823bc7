//! Three-stage build pipeline
//!
//! This module orchestrates the stages of turning Markdown into a numbered page:
//! 1. **Parsing**: Markdown source into a document tree
//! 2. **Numbering**: locate or create the outline container, number the headings
//! 3. **Export**: write a standalone HTML page

use crate::config::{ConfigError, OutlineConfig, CONFIG_FILE_NAME};
use crate::dom::{Document, DomError, NodeId, NodeKind};
use crate::html_writer::{self, HtmlExportError};
use crate::markdown::parse_markdown;
use crate::toc::{build_table_of_contents, DocumentReport, HeadingLevel, TocError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use walkdir::WalkDir;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A parsed and numbered document
#[derive(Debug)]
pub struct BuiltDocument {
    pub document: Document,
    /// Element that received the outline
    pub container: NodeId,
    pub report: DocumentReport,
    /// Configured title, or the text of the first `h1`
    pub title: Option<String>,
}

impl BuiltDocument {
    /// The numbered headings as indented text, one line per heading
    pub fn outline_lines(&self) -> Vec<String> {
        self.report
            .numbered
            .iter()
            .map(|heading| {
                format!(
                    "{}{}",
                    "  ".repeat(heading.label.depth()),
                    self.document.text_content(heading.node).trim()
                )
            })
            .collect()
    }

    /// One line per heading that could not be numbered
    pub fn failure_messages(&self) -> Vec<String> {
        self.report
            .failures
            .iter()
            .map(|failure| {
                format!(
                    "{} \"{}\" (block {}): {}",
                    failure.level,
                    self.document.text_content(failure.node).trim(),
                    failure.position,
                    failure.error
                )
            })
            .collect()
    }

    /// Render as an HTML page, using `fallback_title` when the document has none
    pub fn to_html_string(&self, fallback_title: &str) -> String {
        html_writer::to_html_string(
            &self.document,
            self.title.as_deref().unwrap_or(fallback_title),
        )
    }
}

/// Result of building one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Headings that received a label
    pub numbered: usize,
    /// Messages for headings that were skipped
    pub failures: Vec<String>,
}

/// Result of building a directory
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryBuild {
    /// One summary per source file, in build order
    pub files: Vec<BuildSummary>,
    /// Summary of the merged page, when one was written
    pub merged: Option<BuildSummary>,
}

impl DirectoryBuild {
    /// Every summary, the merged page last
    pub fn summaries(&self) -> impl Iterator<Item = &BuildSummary> {
        self.files.iter().chain(self.merged.as_ref())
    }
}

/// Empty `div` or `nav` written as raw HTML, e.g. `<div id="toc"></div>`
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*<(div|nav)\b([^>]*)>\s*</(div|nav)\s*>\s*$")
        .expect("placeholder pattern is valid")
});

/// `id` attribute with a double-quoted, single-quoted or unquoted value
static ID_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)id\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("id attribute pattern is valid")
});

/// Stages 1 and 2: parse Markdown and number its headings
///
/// # Parameters
/// * `source` - Markdown content
/// * `config` - Build configuration
///
/// # Returns
/// * `Ok(BuiltDocument)` - Numbered document; skipped headings are listed in its report
/// * `Err(PipelineError)` - The outline container could not be set up
pub fn build_document(source: &str, config: &OutlineConfig) -> Result<BuiltDocument, PipelineError> {
    let mut document = parse_markdown(source, &config.markdown_options())?;

    let container = ensure_toc_container(&mut document, config)?;
    let body = document.body();
    let report = build_table_of_contents(&mut document, container, body)?;

    let title = config
        .document_title
        .clone()
        .filter(|title| !title.is_empty())
        .or_else(|| first_h1_text(&document));

    Ok(BuiltDocument {
        document,
        container,
        report,
        title,
    })
}

/// Read and number a Markdown file without writing anything
pub fn check_file(input: &Path, config: &OutlineConfig) -> Result<BuiltDocument, PipelineError> {
    let source = std::fs::read_to_string(input)
        .map_err(|e| PipelineError::IoError(input.to_path_buf(), e))?;
    build_document(&source, config)
}

/// All three stages for one Markdown file
///
/// # Parameters
/// * `input` - Markdown file to read
/// * `output` - HTML file to write; parent directories are created
/// * `config` - Build configuration
///
/// # Returns
/// * `Ok(BuildSummary)` - File written
/// * `Err(PipelineError)` - Error reading, numbering or writing
pub fn build_file(
    input: &Path,
    output: &Path,
    config: &OutlineConfig,
) -> Result<BuildSummary, PipelineError> {
    let built = check_file(input, config)?;

    let fallback_title = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Document");
    let title = built.title.as_deref().unwrap_or(fallback_title);
    html_writer::to_html(&built.document, title, output)
        .map_err(|e| PipelineError::ExportError(output.to_path_buf(), e))?;

    log::info!(
        "Built {} -> {} ({} headings numbered)",
        input.display(),
        output.display(),
        built.report.numbered.len()
    );

    Ok(BuildSummary {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        numbered: built.report.numbered.len(),
        failures: built.failure_messages(),
    })
}

/// Build the Markdown files of `input_dir` into a mirrored tree of `.html` files
///
/// Sources are `config.source_files` in the given order, followed by every
/// file matching `config.includes` and none of `config.excludes`, sorted by
/// file name ignoring case. Hidden files and directories are skipped. When
/// `config.merged_file` is set (and `skip_merge` is not), the sources are
/// also concatenated in that order and built as one numbered page.
///
/// # Parameters
/// * `input_dir` - Directory searched recursively for Markdown files
/// * `output_dir` - Directory receiving the HTML files
/// * `config` - Build configuration shared by all files
///
/// # Returns
/// * `Ok(DirectoryBuild)` - One summary per file, plus the merged page
/// * `Err(PipelineError)` - First error encountered
pub fn build_directory(
    input_dir: &Path,
    output_dir: &Path,
    config: &OutlineConfig,
) -> Result<DirectoryBuild, PipelineError> {
    let sources = collect_sources(input_dir, config)?;
    let jobs: Vec<(PathBuf, PathBuf)> = sources
        .iter()
        .map(|source| {
            let relative = source.strip_prefix(input_dir).unwrap_or(source);
            (source.clone(), output_path(output_dir, relative, &config.suffix))
        })
        .collect();

    log::info!(
        "Found {} markdown files in {}",
        jobs.len(),
        input_dir.display()
    );

    // Each file owns its own document, so files can be built independently
    #[cfg(feature = "parallel")]
    let files: Result<Vec<_>, _> = jobs
        .par_iter()
        .map(|(input, output)| build_file(input, output, config))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let files: Result<Vec<_>, _> = jobs
        .iter()
        .map(|(input, output)| build_file(input, output, config))
        .collect();

    let files = files?;

    let merged = match config.merged_file.as_deref() {
        Some(name) if !config.skip_merge && !sources.is_empty() => {
            Some(build_merged(input_dir, &sources, &output_dir.join(name), config)?)
        }
        Some(_) if config.skip_merge => {
            log::info!("Skipping merged page");
            None
        }
        _ => None,
    };

    Ok(DirectoryBuild { files, merged })
}

/// Source files of `input_dir` in build order
///
/// Explicit `source_files` come first; missing ones are skipped with a
/// warning. Files selected by the include patterns follow, sorted by file
/// name ignoring case, without repeating an explicit source.
pub fn collect_sources(
    input_dir: &Path,
    config: &OutlineConfig,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut sources = Vec::new();
    for name in &config.source_files {
        let path = input_dir.join(name);
        if path.is_file() {
            log::debug!("Source file {} added", path.display());
            sources.push(path);
        } else {
            log::warn!(
                "Source file {} was not included because it does not exist",
                path.display()
            );
        }
    }

    let includes = glob_set(&config.includes)?;
    let excludes = glob_set(&config.excludes)?;
    let mut included: Vec<PathBuf> = WalkDir::new(input_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let relative = e.path().strip_prefix(input_dir).unwrap_or(e.path());
            includes.is_match(relative) && !excludes.is_match(relative)
        })
        .map(|e| e.into_path())
        .filter(|path| !sources.contains(path))
        .collect();
    included.sort_by_cached_key(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    sources.extend(included);

    if let Some(merged) = config.merged_file.as_deref() {
        for source in &sources {
            let same_name = source
                .file_name()
                .is_some_and(|name| name.to_string_lossy().eq_ignore_ascii_case(merged));
            if same_name {
                log::warn!(
                    "Source file {} has the same name as the merged file",
                    source.display()
                );
            }
        }
    }

    Ok(sources)
}

/// `relative` under `output_dir` with `suffix` appended to its stem and an `.html` extension
pub fn output_path(output_dir: &Path, relative: &Path, suffix: &str) -> PathBuf {
    let stem = relative
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir
        .join(relative)
        .with_file_name(format!("{}{}.html", stem, suffix))
}

/// Concatenate `sources` and build them as a single numbered page
fn build_merged(
    input_dir: &Path,
    sources: &[PathBuf],
    output: &Path,
    config: &OutlineConfig,
) -> Result<BuildSummary, PipelineError> {
    log::info!("Creating merged page {}", output.display());

    let mut merged = String::new();
    for source in sources {
        let content = std::fs::read_to_string(source)
            .map_err(|e| PipelineError::IoError(source.clone(), e))?;
        if !merged.is_empty() {
            merged.push_str("\n\n");
        }
        merged.push_str(&content);
    }

    let built = build_document(&merged, config)?;
    let fallback_title = input_dir
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("Document");
    let title = built.title.as_deref().unwrap_or(fallback_title);
    html_writer::to_html(&built.document, title, output)
        .map_err(|e| PipelineError::ExportError(output.to_path_buf(), e))?;

    Ok(BuildSummary {
        input: input_dir.to_path_buf(),
        output: output.to_path_buf(),
        numbered: built.report.numbered.len(),
        failures: built.failure_messages(),
    })
}

fn glob_set(patterns: &[String]) -> Result<GlobSet, PipelineError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).map_err(|e| PipelineError::PatternError(pattern.clone(), e))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| PipelineError::PatternError(patterns.join(", "), e))
}

/// Configuration for `input`: the explicit file when given, else `legaltoc.toml`
/// in the input directory (or next to the input file), else the defaults
pub fn resolve_config(
    input: &Path,
    explicit: Option<&Path>,
) -> Result<OutlineConfig, PipelineError> {
    match explicit {
        Some(path) => OutlineConfig::load(path)
            .map_err(|e| PipelineError::ConfigError(path.to_path_buf(), Box::new(e))),
        None => {
            let dir = if input.is_dir() {
                input
            } else {
                input.parent().unwrap_or_else(|| Path::new("."))
            };
            OutlineConfig::load_or_default(dir)
                .map_err(|e| PipelineError::ConfigError(dir.join(CONFIG_FILE_NAME), Box::new(e)))
        }
    }
}

/// Find the element that receives the outline, creating a `<nav>` when there is none
///
/// Lookup order: an element carrying the configured id; a raw HTML
/// placeholder (an empty `div` or `nav` with that id) among the body's
/// children, which is replaced; otherwise a new `<nav>` right after the
/// leading `h1`, or at the top of the body. When a heading already owns
/// the configured id, the new `<nav>` gets the first free `id-N` instead.
fn ensure_toc_container(
    document: &mut Document,
    config: &OutlineConfig,
) -> Result<NodeId, DomError> {
    let body = document.body();
    let configured = config.toc_container_id.as_str();

    let mut id = configured.to_string();
    if let Some(existing) = document.find_element_by_id(body, configured) {
        if !is_heading(document, existing) {
            return Ok(existing);
        }
        id = (1..)
            .map(|n| format!("{}-{}", configured, n))
            .find(|candidate| document.find_element_by_id(body, candidate).is_none())
            .unwrap_or(id);
        log::warn!(
            "Id '{}' belongs to a heading; the outline container uses '{}'",
            configured,
            id
        );
    }

    let nav = document.create_element("nav");
    document.set_attribute(nav, "id", &id)?;
    document.set_attribute(nav, "class", "toc")?;
    if let Some(caption) = config.toc_title.as_deref().filter(|t| !t.is_empty()) {
        let title = document.create_element("p");
        document.set_attribute(title, "class", "toc-title")?;
        let text = document.create_text(caption);
        document.append_child(title, text)?;
        document.append_child(nav, title)?;
    }

    let placeholder = document
        .children(body)
        .iter()
        .copied()
        .find(|&child| is_placeholder(document, child, configured));
    if let Some(placeholder) = placeholder {
        document.replace_child(placeholder, nav)?;
        return Ok(nav);
    }

    let index = document
        .children(body)
        .iter()
        .position(|&child| document.tag_name(child).is_some())
        .filter(|&first| document.tag_name(document.children(body)[first]) == Some("h1"))
        .map_or(0, |first| first + 1);
    document.insert_child(body, index, nav)?;
    Ok(nav)
}

fn is_heading(document: &Document, node: NodeId) -> bool {
    document
        .tag_name(node)
        .is_some_and(|tag| tag == "h1" || HeadingLevel::from_tag(tag).is_some())
}

/// Whether `node` is a raw HTML placeholder carrying `id`
fn is_placeholder(document: &Document, node: NodeId, id: &str) -> bool {
    let Ok(data) = document.node(node) else {
        return false;
    };
    let NodeKind::RawHtml(html) = &data.kind else {
        return false;
    };
    placeholder_id(html) == Some(id)
}

/// Id of an empty `div` or `nav` element written as raw HTML
fn placeholder_id(html: &str) -> Option<&str> {
    let element = PLACEHOLDER.captures(html)?;
    if !element[1].eq_ignore_ascii_case(&element[3]) {
        return None;
    }
    let attribute = ID_ATTRIBUTE.captures(element.get(2)?.as_str())?;
    attribute
        .get(1)
        .or_else(|| attribute.get(2))
        .or_else(|| attribute.get(3))
        .map(|value| value.as_str())
}

fn first_h1_text(document: &Document) -> Option<String> {
    document
        .elements_by_tag(document.body(), "h1")
        .first()
        .map(|&h1| document.text_content(h1).trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error reading {path}: {source}", path = .0.display(), source = .1)]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("Config error loading {path}: {source}", path = .0.display(), source = .1)]
    ConfigError(PathBuf, #[source] Box<ConfigError>),

    #[error("Document error: {0}")]
    DomError(#[from] DomError),

    #[error("Outline error: {0}")]
    TocError(#[from] TocError<DomError>),

    #[error("Error writing {path}: {source}", path = .0.display(), source = .1)]
    ExportError(PathBuf, #[source] HtmlExportError),

    #[error("Invalid file pattern '{0}': {1}")]
    PatternError(String, #[source] globset::Error),
}
