//! Table of contents builder
//!
//! Walks the direct children of a document body once, prefixes every
//! `h2`, `h3` and `h4` element with a legal-style section label
//! ("1. ", "1.2. ", "1.2.3. ") and builds a nested `ul`/`li` outline whose
//! entries link back to the headings.
//!
//! The pass is single-use: running it twice on the same body numbers the
//! headings again, so prefixes accumulate ("1. 1. Scope") and a second
//! top-level list is appended to the container.
//!
//! A heading whose enclosing level never appeared (an `h4` before any
//! `h3` under the current `h2`, or an `h3` before the first `h2`) has no
//! list to attach to. It is left untouched, reported as a
//! [`TocError::MissingParentSection`] failure, and the pass carries on
//! with the next sibling. Its counter still advances, so the next heading
//! at that level continues from it.

use crate::dom::{Document, DomError, NodeId};
use crate::section_label::SectionLabel;
use std::fmt;
use thiserror::Error;

/// The capabilities the builder needs from a document tree
///
/// Implemented by [`Document`]; any other tree with child enumeration,
/// tag and id inspection, and node creation can host the builder too.
pub trait OutlineTree {
    /// Copyable node handle
    type Node: Copy + Eq + fmt::Debug;

    /// Error raised by mutating operations
    type Error: std::error::Error + 'static;

    fn child_at(&self, parent: Self::Node, index: usize) -> Option<Self::Node>;

    /// Tag name of an element, `None` for non-element nodes
    fn tag_name(&self, node: Self::Node) -> Option<&str>;

    /// The node's `id` attribute, empty when absent
    fn element_id(&self, node: Self::Node) -> &str;

    fn create_element(&mut self, tag: &str) -> Self::Node;

    fn create_text(&mut self, text: &str) -> Self::Node;

    fn set_attribute(
        &mut self,
        node: Self::Node,
        name: &str,
        value: &str,
    ) -> Result<(), Self::Error>;

    fn append_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), Self::Error>;

    fn prepend_child(&mut self, parent: Self::Node, child: Self::Node)
        -> Result<(), Self::Error>;

    /// Append a deep copy of `from`'s children to `to`
    fn copy_content(&mut self, from: Self::Node, to: Self::Node) -> Result<(), Self::Error>;
}

impl OutlineTree for Document {
    type Node = NodeId;
    type Error = DomError;

    fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        Document::child_at(self, parent, index)
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        Document::tag_name(self, node)
    }

    fn element_id(&self, node: NodeId) -> &str {
        Document::element_id(self, node)
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        Document::create_element(self, tag)
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        Document::create_text(self, text)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        Document::set_attribute(self, node, name, value)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        Document::append_child(self, parent, child)
    }

    fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        Document::prepend_child(self, parent, child)
    }

    fn copy_content(&mut self, from: NodeId, to: NodeId) -> Result<(), DomError> {
        self.clone_children_into(from, to)
    }
}

/// Heading levels that take part in the outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeadingLevel {
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    /// Classify a tag name, ignoring case
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("h2") {
            Some(Self::H2)
        } else if tag.eq_ignore_ascii_case("h3") {
            Some(Self::H3)
        } else if tag.eq_ignore_ascii_case("h4") {
            Some(Self::H4)
        } else {
            None
        }
    }

    /// Nesting depth in the outline, 0 for `h2`
    pub fn depth(self) -> usize {
        match self {
            Self::H2 => 0,
            Self::H3 => 1,
            Self::H4 => 2,
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::H2 => write!(f, "h2"),
            Self::H3 => write!(f, "h3"),
            Self::H4 => write!(f, "h4"),
        }
    }
}

/// The (h2, h3, h4) counter triple of one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionCounters {
    pub h2: u32,
    pub h3: u32,
    pub h4: u32,
}

impl SectionCounters {
    /// Count a heading at `level`, resetting the deeper counters, and return its label
    pub fn advance(&mut self, level: HeadingLevel) -> SectionLabel {
        match level {
            HeadingLevel::H2 => {
                self.h2 += 1;
                self.h3 = 0;
                self.h4 = 0;
            }
            HeadingLevel::H3 => {
                self.h3 += 1;
                self.h4 = 0;
            }
            HeadingLevel::H4 => self.h4 += 1,
        }
        self.label(level)
    }

    /// Current label at `level`
    pub fn label(&self, level: HeadingLevel) -> SectionLabel {
        match level {
            HeadingLevel::H2 => SectionLabel::new(vec![self.h2]),
            HeadingLevel::H3 => SectionLabel::new(vec![self.h2, self.h3]),
            HeadingLevel::H4 => SectionLabel::new(vec![self.h2, self.h3, self.h4]),
        }
    }

    /// Whether the last heading at `level` is the first one under its parent
    fn starts_sublist(&self, level: HeadingLevel) -> bool {
        match level {
            HeadingLevel::H2 => false,
            HeadingLevel::H3 => self.h3 == 1,
            HeadingLevel::H4 => self.h4 == 1,
        }
    }
}

/// Why a single heading could not be numbered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TocError<E: std::error::Error + 'static> {
    /// The heading's enclosing level has no entry to nest under
    #[error("Section {label} ({level}) has no enclosing {parent} entry in the outline")]
    MissingParentSection {
        /// Label the heading would have received
        label: SectionLabel,
        /// Level of the heading
        level: HeadingLevel,
        /// Level whose entry is missing
        parent: HeadingLevel,
    },

    /// The underlying tree rejected an operation
    #[error("Document tree error: {0}")]
    Tree(#[source] E),
}

/// A heading that received a label and an outline entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedHeading<N> {
    /// The heading element
    pub node: N,
    pub level: HeadingLevel,
    pub label: SectionLabel,
    /// The `li` created for it in the outline
    pub entry: N,
}

/// A heading that was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFailure<N, E: std::error::Error + 'static> {
    /// The heading element
    pub node: N,
    /// Index of the heading among the body's children
    pub position: usize,
    pub level: HeadingLevel,
    pub error: TocError<E>,
}

/// Outcome of one pass
#[derive(Debug, Clone)]
pub struct TocReport<N, E: std::error::Error + 'static> {
    /// Top-level `ul` appended to the container
    pub list: N,
    /// Headings numbered, in document order
    pub numbered: Vec<NumberedHeading<N>>,
    /// Headings skipped, in document order
    pub failures: Vec<NodeFailure<N, E>>,
}

impl<N, E: std::error::Error + 'static> TocReport<N, E> {
    fn new(list: N) -> Self {
        Self {
            list,
            numbered: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// True when every heading was numbered
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of headings visited, numbered or not
    pub fn headings_seen(&self) -> usize {
        self.numbered.len() + self.failures.len()
    }
}

/// Report produced when building over a [`Document`]
pub type DocumentReport = TocReport<NodeId, DomError>;

/// Build a numbered outline of `body`'s direct children into `container`
///
/// Appends one `ul` to `container`, then for every `h2`/`h3`/`h4` child of
/// `body`: inserts the section label as the heading's first child and
/// appends an `li > a` entry at the matching depth. The link points at
/// `#id` when the heading has an id and shows a copy of the prefixed
/// heading content.
///
/// Failures on individual headings are logged and collected in the
/// returned report; they never abort the pass. The only error returned is
/// a failure to attach the top-level list to `container`.
pub fn build_table_of_contents<T: OutlineTree>(
    tree: &mut T,
    container: T::Node,
    body: T::Node,
) -> Result<TocReport<T::Node, T::Error>, TocError<T::Error>> {
    let list = tree.create_element("ul");
    tree.append_child(container, list).map_err(TocError::Tree)?;

    let mut builder = OutlineBuilder::new(list);
    let mut report = TocReport::new(list);

    // Live index over the body: nodes attached during the pass are visited too.
    let mut position = 0;
    while let Some(node) = tree.child_at(body, position) {
        let current = position;
        position += 1;

        let Some(level) = tree.tag_name(node).and_then(HeadingLevel::from_tag) else {
            continue;
        };

        match builder.number_heading(tree, node, level) {
            Ok(numbered) => {
                log::debug!("Numbered {} heading as {}", level, numbered.label);
                report.numbered.push(numbered);
            }
            Err(error) => {
                log::warn!(
                    "Skipping {} heading at position {}: {}",
                    level,
                    current,
                    error
                );
                report.failures.push(NodeFailure {
                    node,
                    position: current,
                    level,
                    error,
                });
            }
        }
    }

    log::info!(
        "Outline built: {} headings numbered, {} skipped",
        report.numbered.len(),
        report.failures.len()
    );

    Ok(report)
}

/// Per-pass state: counters plus handles to the lists and items created so far
struct OutlineBuilder<N> {
    list: N,
    counters: SectionCounters,
    /// Latest `h2` entry
    top_item: Option<N>,
    /// List holding the `h3` entries of `top_item`
    h3_list: Option<N>,
    /// Latest `h3` entry
    h3_item: Option<N>,
    /// List holding the `h4` entries of `h3_item`
    h4_list: Option<N>,
}

impl<N: Copy> OutlineBuilder<N> {
    fn new(list: N) -> Self {
        Self {
            list,
            counters: SectionCounters::default(),
            top_item: None,
            h3_list: None,
            h3_item: None,
            h4_list: None,
        }
    }

    fn number_heading<T: OutlineTree<Node = N>>(
        &mut self,
        tree: &mut T,
        heading: N,
        level: HeadingLevel,
    ) -> Result<NumberedHeading<N>, TocError<T::Error>> {
        let label = self.counters.advance(level);
        let starts_sublist = self.counters.starts_sublist(level);

        let target = match level {
            HeadingLevel::H2 => {
                self.h3_list = None;
                self.h3_item = None;
                self.h4_list = None;
                self.list
            }
            HeadingLevel::H3 => {
                self.h3_item = None;
                self.h4_list = None;
                if starts_sublist {
                    let parent = self
                        .top_item
                        .ok_or_else(|| {
                            missing_parent::<T::Error>(&label, level, HeadingLevel::H2)
                        })?;
                    self.h3_list = Some(open_sublist(tree, parent)?);
                }
                self.h3_list
                    .ok_or_else(|| {
                        missing_parent::<T::Error>(&label, level, HeadingLevel::H2)
                    })?
            }
            HeadingLevel::H4 => {
                if starts_sublist {
                    let parent = self
                        .h3_item
                        .ok_or_else(|| {
                            missing_parent::<T::Error>(&label, level, HeadingLevel::H3)
                        })?;
                    self.h4_list = Some(open_sublist(tree, parent)?);
                }
                self.h4_list
                    .ok_or_else(|| {
                        missing_parent::<T::Error>(&label, level, HeadingLevel::H3)
                    })?
            }
        };

        let prefix = tree.create_text(&label.heading_prefix());
        tree.prepend_child(heading, prefix)
            .map_err(TocError::Tree)?;

        let entry = append_entry(tree, target, heading).map_err(TocError::Tree)?;
        match level {
            HeadingLevel::H2 => self.top_item = Some(entry),
            HeadingLevel::H3 => self.h3_item = Some(entry),
            HeadingLevel::H4 => {}
        }

        Ok(NumberedHeading {
            node: heading,
            level,
            label,
            entry,
        })
    }
}

fn missing_parent<E: std::error::Error + 'static>(
    label: &SectionLabel,
    level: HeadingLevel,
    parent: HeadingLevel,
) -> TocError<E> {
    TocError::MissingParentSection {
        label: label.clone(),
        level,
        parent,
    }
}

/// Append a fresh `ul` as the last child of `item`
fn open_sublist<T: OutlineTree>(
    tree: &mut T,
    item: T::Node,
) -> Result<T::Node, TocError<T::Error>> {
    let list = tree.create_element("ul");
    tree.append_child(item, list).map_err(TocError::Tree)?;
    Ok(list)
}

/// Append `li > a` linking to `heading` to `list`
fn append_entry<T: OutlineTree>(
    tree: &mut T,
    list: T::Node,
    heading: T::Node,
) -> Result<T::Node, T::Error> {
    let item = tree.create_element("li");
    let link = tree.create_element("a");

    let href = Some(tree.element_id(heading))
        .filter(|id| !id.is_empty())
        .map(|id| format!("#{}", id));
    if let Some(href) = href {
        tree.set_attribute(link, "href", &href)?;
    }

    tree.copy_content(heading, link)?;
    tree.append_child(item, link)?;
    tree.append_child(list, item)?;
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Document with a `div#toc` container as the body's first child
    fn setup() -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let container = doc.create_element("div");
        doc.set_attribute(container, "id", "toc").unwrap();
        doc.append_child(body, container).unwrap();
        (doc, container)
    }

    fn add(doc: &mut Document, tag: &str, id: &str, text: &str) -> NodeId {
        let body = doc.body();
        let node = doc.create_element(tag);
        if !id.is_empty() {
            doc.set_attribute(node, "id", id).unwrap();
        }
        let text = doc.create_text(text);
        doc.append_child(node, text).unwrap();
        doc.append_child(body, node).unwrap();
        node
    }

    fn items(doc: &Document, list: NodeId) -> Vec<NodeId> {
        doc.children(list)
            .iter()
            .copied()
            .filter(|&child| doc.tag_name(child) == Some("li"))
            .collect()
    }

    fn link(doc: &Document, item: NodeId) -> NodeId {
        doc.first_child(item).unwrap()
    }

    fn item_label(doc: &Document, item: NodeId) -> String {
        let text = doc.text_content(link(doc, item));
        text.split_once(". ").unwrap().0.to_string()
    }

    fn sublist(doc: &Document, item: NodeId) -> Option<NodeId> {
        doc.children(item)
            .iter()
            .copied()
            .find(|&child| doc.tag_name(child) == Some("ul"))
    }

    fn run(doc: &mut Document, container: NodeId) -> DocumentReport {
        let body = doc.body();
        build_table_of_contents(doc, container, body).unwrap()
    }

    #[test]
    fn test_sibling_sections_and_one_subsection() {
        let (mut doc, container) = setup();
        add(&mut doc, "h2", "a", "Alpha");
        add(&mut doc, "h2", "b", "Beta");
        add(&mut doc, "h3", "b1", "Beta one");
        add(&mut doc, "h2", "c", "Gamma");

        let report = run(&mut doc, container);

        assert!(report.is_clean());
        let top = items(&doc, report.list);
        assert_eq!(top.len(), 3);
        let labels: Vec<String> = top.iter().map(|&item| item_label(&doc, item)).collect();
        assert_eq!(labels, vec!["1", "2", "3"]);

        assert!(sublist(&doc, top[0]).is_none());
        assert!(sublist(&doc, top[2]).is_none());
        let nested = items(&doc, sublist(&doc, top[1]).unwrap());
        assert_eq!(nested.len(), 1);
        assert_eq!(item_label(&doc, nested[0]), "2.1");
    }

    #[test]
    fn test_no_headings_leaves_one_empty_list() {
        let (mut doc, container) = setup();
        add(&mut doc, "p", "", "Just text");
        add(&mut doc, "h1", "title", "Title");
        add(&mut doc, "h5", "", "Too deep");
        let body = doc.body();
        let stray = doc.create_text("loose text");
        doc.append_child(body, stray).unwrap();
        let before = doc.text_content(body);
        let body_children = doc.children(body).len();

        let report = run(&mut doc, container);

        assert_eq!(doc.children(container), &[report.list]);
        assert_eq!(doc.tag_name(report.list), Some("ul"));
        assert!(doc.children(report.list).is_empty());
        assert_eq!(report.headings_seen(), 0);
        assert_eq!(doc.text_content(body), before);
        assert_eq!(doc.children(body).len(), body_children);
    }

    #[test]
    fn test_empty_id_yields_link_without_href() {
        let (mut doc, container) = setup();
        let heading = add(&mut doc, "h2", "", "Intro");

        let report = run(&mut doc, container);

        let entry = items(&doc, report.list)[0];
        let anchor = link(&doc, entry);
        assert_eq!(doc.tag_name(anchor), Some("a"));
        assert_eq!(doc.attribute(anchor, "href"), None);
        assert_eq!(doc.text_content(anchor), "1. Intro");
        assert_eq!(doc.text_content(anchor), doc.text_content(heading));
    }

    #[test]
    fn test_link_targets_heading_id() {
        let (mut doc, container) = setup();
        add(&mut doc, "h2", "scope", "Scope");

        let report = run(&mut doc, container);

        let anchor = link(&doc, items(&doc, report.list)[0]);
        assert_eq!(doc.attribute(anchor, "href"), Some("#scope"));
    }

    #[test]
    fn test_prefix_is_first_child_of_heading() {
        let (mut doc, container) = setup();
        let heading = add(&mut doc, "h2", "", "Scope");
        add(&mut doc, "h3", "", "Purpose");

        run(&mut doc, container);

        let first = doc.first_child(heading).unwrap();
        assert_eq!(doc.text_content(first), "1. ");
        assert_eq!(doc.text_content(heading), "1. Scope");
    }

    #[test]
    fn test_second_pass_accumulates_prefixes() {
        let (mut doc, container) = setup();
        let heading = add(&mut doc, "h2", "", "Intro");
        let sub = add(&mut doc, "h3", "", "Detail");

        run(&mut doc, container);
        let second = run(&mut doc, container);

        assert_eq!(doc.text_content(heading), "1. 1. Intro");
        assert_eq!(doc.text_content(sub), "1.1. 1.1. Detail");
        assert_eq!(doc.children(container).len(), 2);
        let entry = items(&doc, second.list)[0];
        assert_eq!(doc.text_content(link(&doc, entry)), "1. 1. Intro");
    }

    #[test]
    fn test_h4_without_h3_is_skipped_and_pass_continues() {
        let (mut doc, container) = setup();
        add(&mut doc, "h2", "", "One");
        let orphan = add(&mut doc, "h4", "", "Orphan");
        add(&mut doc, "h2", "", "Two");
        add(&mut doc, "h3", "", "Two sub");

        let report = run(&mut doc, container);

        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.node, orphan);
        assert_eq!(failure.level, HeadingLevel::H4);
        assert_eq!(failure.position, 2);
        assert_eq!(
            failure.error,
            TocError::MissingParentSection {
                label: SectionLabel::new(vec![1, 0, 1]),
                level: HeadingLevel::H4,
                parent: HeadingLevel::H3,
            }
        );
        assert_eq!(doc.text_content(orphan), "Orphan");

        let top = items(&doc, report.list);
        assert_eq!(top.len(), 2);
        assert!(sublist(&doc, top[0]).is_none());
        let nested = items(&doc, sublist(&doc, top[1]).unwrap());
        assert_eq!(item_label(&doc, nested[0]), "2.1");
    }

    #[test]
    fn test_repeated_orphans_keep_failing() {
        let (mut doc, container) = setup();
        add(&mut doc, "h3", "", "Early");
        add(&mut doc, "h3", "", "Earlier still");
        add(&mut doc, "h2", "", "First");

        let report = run(&mut doc, container);

        let labels: Vec<String> = report
            .failures
            .iter()
            .map(|failure| match &failure.error {
                TocError::MissingParentSection { label, .. } => label.to_string(),
                other => panic!("unexpected error {other:?}"),
            })
            .collect();
        assert_eq!(labels, vec!["0.1", "0.2"]);
        assert_eq!(report.numbered.len(), 1);
        assert_eq!(report.numbered[0].label.to_string(), "1");
    }

    #[test]
    fn test_three_levels_create_one_list_per_depth() {
        let (mut doc, container) = setup();
        add(&mut doc, "h2", "", "A");
        add(&mut doc, "h3", "", "B");
        let deepest = add(&mut doc, "h4", "", "C");

        let report = run(&mut doc, container);

        assert_eq!(doc.elements_by_tag(container, "ul").len(), 3);
        let top = items(&doc, report.list);
        assert_eq!(top.len(), 1);
        let middle = items(&doc, sublist(&doc, top[0]).unwrap());
        assert_eq!(middle.len(), 1);
        let bottom = items(&doc, sublist(&doc, middle[0]).unwrap());
        assert_eq!(bottom.len(), 1);
        assert_eq!(item_label(&doc, bottom[0]), "1.1.1");
        assert_eq!(doc.text_content(deepest), "1.1.1. C");
    }

    #[test]
    fn test_h3_resets_h4_numbering() {
        let (mut doc, container) = setup();
        add(&mut doc, "h2", "", "A");
        add(&mut doc, "h3", "", "A1");
        add(&mut doc, "h4", "", "A1a");
        add(&mut doc, "h4", "", "A1b");
        add(&mut doc, "h3", "", "A2");
        add(&mut doc, "h4", "", "A2a");

        let report = run(&mut doc, container);

        let labels: Vec<String> = report
            .numbered
            .iter()
            .map(|heading| heading.label.to_string())
            .collect();
        assert_eq!(labels, vec!["1", "1.1", "1.1.1", "1.1.2", "1.2", "1.2.1"]);

        let top = items(&doc, report.list);
        let middle = items(&doc, sublist(&doc, top[0]).unwrap());
        assert_eq!(middle.len(), 2);
        assert_eq!(items(&doc, sublist(&doc, middle[0]).unwrap()).len(), 2);
        assert_eq!(items(&doc, sublist(&doc, middle[1]).unwrap()).len(), 1);
    }

    #[test]
    fn test_nested_headings_are_not_discovered() {
        let (mut doc, container) = setup();
        let body = doc.body();
        let section = doc.create_element("section");
        let hidden = doc.create_element("h2");
        let text = doc.create_text("Hidden");
        doc.append_child(hidden, text).unwrap();
        doc.append_child(section, hidden).unwrap();
        doc.append_child(body, section).unwrap();

        let report = run(&mut doc, container);

        assert!(report.numbered.is_empty());
        assert_eq!(doc.text_content(hidden), "Hidden");
    }

    #[test]
    fn test_link_copies_inline_markup() {
        let (mut doc, container) = setup();
        let body = doc.body();
        let heading = doc.create_element("h2");
        let code = doc.create_element("code");
        let name = doc.create_text("parse()");
        doc.append_child(code, name).unwrap();
        doc.append_child(heading, code).unwrap();
        doc.append_child(body, heading).unwrap();

        let report = run(&mut doc, container);

        let anchor = link(&doc, items(&doc, report.list)[0]);
        let children = doc.children(anchor).to_vec();
        assert_eq!(children.len(), 2);
        assert_eq!(doc.text_content(children[0]), "1. ");
        assert_eq!(doc.tag_name(children[1]), Some("code"));
        assert_ne!(children[1], code);
    }

    #[test]
    fn test_heading_level_from_tag_ignores_case() {
        assert_eq!(HeadingLevel::from_tag("H2"), Some(HeadingLevel::H2));
        assert_eq!(HeadingLevel::from_tag("h3"), Some(HeadingLevel::H3));
        assert_eq!(HeadingLevel::from_tag("H4"), Some(HeadingLevel::H4));
        assert_eq!(HeadingLevel::from_tag("h1"), None);
        assert_eq!(HeadingLevel::from_tag("h5"), None);
        assert_eq!(HeadingLevel::from_tag("header"), None);
    }

    #[test]
    fn test_counters_reset_deeper_levels() {
        let mut counters = SectionCounters::default();
        assert_eq!(counters.advance(HeadingLevel::H2).to_string(), "1");
        assert_eq!(counters.advance(HeadingLevel::H3).to_string(), "1.1");
        assert_eq!(counters.advance(HeadingLevel::H4).to_string(), "1.1.1");
        assert_eq!(counters.advance(HeadingLevel::H2).to_string(), "2");
        assert_eq!(
            counters,
            SectionCounters {
                h2: 2,
                h3: 0,
                h4: 0
            }
        );
        assert_eq!(counters.advance(HeadingLevel::H4).to_string(), "2.0.1");
    }

    /// Tree that refuses to prefix one particular heading
    struct RefusingTree {
        inner: Document,
        refuse: NodeId,
    }

    impl OutlineTree for RefusingTree {
        type Node = NodeId;
        type Error = DomError;

        fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
            self.inner.child_at(parent, index)
        }

        fn tag_name(&self, node: NodeId) -> Option<&str> {
            self.inner.tag_name(node)
        }

        fn element_id(&self, node: NodeId) -> &str {
            self.inner.element_id(node)
        }

        fn create_element(&mut self, tag: &str) -> NodeId {
            self.inner.create_element(tag)
        }

        fn create_text(&mut self, text: &str) -> NodeId {
            self.inner.create_text(text)
        }

        fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
            self.inner.set_attribute(node, name, value)
        }

        fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
            self.inner.append_child(parent, child)
        }

        fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
            if parent == self.refuse {
                return Err(DomError::NotAContainer(parent));
            }
            self.inner.prepend_child(parent, child)
        }

        fn copy_content(&mut self, from: NodeId, to: NodeId) -> Result<(), DomError> {
            self.inner.clone_children_into(from, to)
        }
    }

    #[test]
    fn test_tree_errors_are_contained_to_one_heading() {
        let (mut doc, container) = setup();
        add(&mut doc, "h2", "", "One");
        let broken = add(&mut doc, "h2", "", "Two");
        add(&mut doc, "h2", "", "Three");
        let body = doc.body();
        let mut tree = RefusingTree {
            inner: doc,
            refuse: broken,
        };

        let report = build_table_of_contents(&mut tree, container, body).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures[0].error,
            TocError::Tree(DomError::NotAContainer(broken))
        );
        let labels: Vec<String> = report
            .numbered
            .iter()
            .map(|heading| heading.label.to_string())
            .collect();
        assert_eq!(labels, vec!["1", "3"]);
        assert_eq!(tree.inner.text_content(broken), "Two");
    }

    #[test]
    fn test_container_must_accept_children() {
        let mut doc = Document::new();
        let body = doc.body();
        let text = doc.create_text("not a container");
        let result = build_table_of_contents(&mut doc, text, body);
        assert!(matches!(
            result,
            Err(TocError::Tree(DomError::NotAContainer(_)))
        ));
    }

    /// Records log messages together with the thread that emitted them
    struct RecordingLogger {
        records: std::sync::Mutex<Vec<(std::thread::ThreadId, log::Level, String)>>,
    }

    impl log::Log for RecordingLogger {
        fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            if let Ok(mut records) = self.records.lock() {
                records.push((
                    std::thread::current().id(),
                    record.level(),
                    record.args().to_string(),
                ));
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: RecordingLogger = RecordingLogger {
        records: std::sync::Mutex::new(Vec::new()),
    };

    /// Messages logged at `level` by the current thread
    fn logged_on_this_thread(level: log::Level) -> Vec<String> {
        let this = std::thread::current().id();
        LOGGER
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(thread, recorded, _)| *thread == this && *recorded == level)
            .map(|(_, _, message)| message.clone())
            .collect()
    }

    #[test]
    fn test_each_skipped_heading_logs_one_warning() {
        // Only the first test to install a logger wins; all share this one
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);

        let (mut doc, container) = setup();
        add(&mut doc, "h3", "", "Early");
        add(&mut doc, "h2", "", "One");
        add(&mut doc, "h4", "", "Orphan");
        add(&mut doc, "h3", "", "One sub");

        let report = run(&mut doc, container);

        assert_eq!(report.failures.len(), 2);
        let warnings = logged_on_this_thread(log::Level::Warn);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("h3 heading at position 1"));
        assert!(warnings[0].contains("Section 0.1 (h3)"));
        assert!(warnings[1].contains("h4 heading at position 3"));
        assert!(warnings[1].contains("Section 1.0.1 (h4)"));
    }
}
