//! Build configuration from legaltoc.toml

use crate::markdown::MarkdownOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the configuration file looked up next to the input
pub const CONFIG_FILE_NAME: &str = "legaltoc.toml";

/// Main configuration from legaltoc.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// Page title; falls back to the first `h1` of the document, then the file name
    pub document_title: Option<String>,

    /// Caption shown above the generated outline; an empty string omits it
    pub toc_title: Option<String>,

    /// Id of the element that receives the outline
    ///
    /// When the document has no element with this id, a `<nav>` carrying it
    /// is inserted after the leading `h1` (or at the top of the body).
    pub toc_container_id: String,

    /// Generate slug ids for headings that have none, so outline entries link somewhere
    pub heading_ids: bool,

    /// Markdown files built first, in this order, relative to the input directory
    pub source_files: Vec<String>,

    /// Glob patterns, relative to the input directory, selecting Markdown files to build
    pub includes: Vec<String>,

    /// Glob patterns removing files from `includes`
    pub excludes: Vec<String>,

    /// Text appended to each output file stem ("-numbered" gives `design-numbered.html`)
    pub suffix: String,

    /// Name of a single page, in the output directory, built from all sources concatenated in order
    pub merged_file: Option<String>,

    /// Do not write `merged_file` even when it is set
    pub skip_merge: bool,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            document_title: None,
            toc_title: Some("Table of Contents".to_string()),
            toc_container_id: "toc".to_string(),
            heading_ids: true,
            source_files: Vec::new(),
            includes: vec!["**/*.md".to_string()],
            excludes: Vec::new(),
            suffix: String::new(),
            merged_file: None,
            skip_merge: false,
        }
    }
}

impl OutlineConfig {
    /// Load configuration from a legaltoc.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(OutlineConfig)` - Successfully loaded configuration
    /// * `Err(ConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(ConfigError::IoError)?;

        let config: OutlineConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;

        Ok(config)
    }

    /// Load `legaltoc.toml` from `dir`, or the defaults when there is none
    pub fn load_or_default<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        if path.is_file() {
            log::info!("Using configuration {}", path.display());
            Self::load(&path)
        } else {
            log::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, dir.as_ref().display());
            Ok(Self::default())
        }
    }

    /// Save configuration to a legaltoc.toml file
    ///
    /// # Parameters
    /// * `path` - Path where the configuration file will be written
    ///
    /// # Returns
    /// * `Ok(())` - Successfully saved configuration
    /// * `Err(ConfigError)` - Error serializing or writing the configuration file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;

        fs::write(&path, content).map_err(ConfigError::IoError)?;

        Ok(())
    }

    /// Options for the Markdown front end
    pub fn markdown_options(&self) -> MarkdownOptions {
        MarkdownOptions {
            heading_ids: self.heading_ids,
            reserved_ids: vec![self.toc_container_id.clone()],
        }
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    /// IO error when reading or writing file
    IoError(std::io::Error),

    /// Error parsing TOML
    ParseError(toml::de::Error),

    /// Error serializing to TOML
    SerializeError(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "TOML serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
