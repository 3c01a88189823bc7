//! legaltoc - legal-style section numbering and table of contents generation
//!
//! Numbers the `h2`/`h3`/`h4` headings of a document in place ("1.", "1.2.",
//! "1.2.3.") and builds a nested, linked outline of them. The core builder
//! in [`toc`] works on any tree implementing [`toc::OutlineTree`]; the rest
//! of the crate wires it to Markdown input and HTML output.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod dom;
pub mod html_writer;
pub mod markdown;
pub mod pipeline;
pub mod section_label;
pub mod toc;

pub use config::OutlineConfig;
pub use dom::{Document, NodeId};
pub use section_label::SectionLabel;
pub use toc::{build_table_of_contents, HeadingLevel, OutlineTree, TocError, TocReport};
