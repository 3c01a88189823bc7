//! Markdown front end
//!
//! Converts pulldown-cmark's event stream into a [`Document`]. Block-level
//! elements (paragraphs, headings, lists, tables, ...) become direct
//! children of `body`, so the outline builder sees every top-level
//! heading. Inline markup becomes nested elements and raw HTML is passed
//! through untouched.

use crate::dom::{Document, DomError, NodeId};
use itertools::Itertools;
use pulldown_cmark::{CodeBlockKind, Event, Options, Tag, TagEnd};
use std::collections::HashSet;

/// Options controlling how Markdown is turned into a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Give headings without an explicit `{#id}` a slug id derived from their text
    pub heading_ids: bool,
    /// Ids generated heading ids must avoid
    pub reserved_ids: Vec<String>,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            heading_ids: true,
            reserved_ids: Vec::new(),
        }
    }
}

/// Parse Markdown into a new document
pub fn parse_markdown(content: &str, options: &MarkdownOptions) -> Result<Document, DomError> {
    let mut parser = MarkdownParser::new(options);
    let md_parser = pulldown_cmark::Parser::new_ext(content, parser_options());

    for event in md_parser {
        parser.process_event(event)?;
    }

    parser.finish()
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// What an open tag contributes while its content streams in
enum Frame {
    /// Children are appended to this node
    Element(NodeId),
    /// Image: text content becomes the `alt` attribute on close
    Image { node: NodeId, alt: String },
    /// Heading: may need a generated id on close
    Heading(NodeId),
    /// HTML block: its lines are collected into one raw HTML node on close
    HtmlBlock(String),
    /// Tag without a node of its own; children go to the enclosing frame
    Transparent,
}

/// Parser state for converting markdown events to document nodes
struct MarkdownParser {
    document: Document,
    heading_ids: bool,
    /// Open tags, innermost last
    stack: Vec<Frame>,
    /// Whether cells currently being built belong to the table head
    in_table_head: bool,
    /// Ids already present in the document
    used_ids: HashSet<String>,
}

impl MarkdownParser {
    fn new(options: &MarkdownOptions) -> Self {
        Self {
            document: Document::new(),
            heading_ids: options.heading_ids,
            stack: Vec::new(),
            in_table_head: false,
            used_ids: options.reserved_ids.iter().cloned().collect(),
        }
    }

    /// Node that receives content at this point of the stream
    fn current_parent(&self) -> NodeId {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| match frame {
                Frame::Element(node) | Frame::Heading(node) => Some(*node),
                Frame::Image { .. } | Frame::HtmlBlock(_) | Frame::Transparent => None,
            })
            .unwrap_or_else(|| self.document.body())
    }

    /// Create an element and attach it to the current parent
    fn open_element(&mut self, tag: &str) -> Result<NodeId, DomError> {
        let node = self.document.create_element(tag);
        let parent = self.current_parent();
        self.document.append_child(parent, node)?;
        Ok(node)
    }

    fn push_element(&mut self, tag: &str) -> Result<NodeId, DomError> {
        let node = self.open_element(tag)?;
        self.stack.push(Frame::Element(node));
        Ok(node)
    }

    fn process_event(&mut self, event: Event<'_>) -> Result<(), DomError> {
        match event {
            Event::Start(tag) => self.handle_start_tag(tag),
            Event::End(tag_end) => self.handle_end_tag(tag_end),
            Event::Text(text) => self.handle_text(&text),
            Event::Code(code) => {
                let node = self.open_element("code")?;
                let text = self.document.create_text(&code);
                self.document.append_child(node, text)
            }
            Event::SoftBreak => self.handle_text("\n"),
            Event::HardBreak => self.open_element("br").map(|_| ()),
            Event::Html(html) | Event::InlineHtml(html) => {
                if let Some(Frame::HtmlBlock(block)) = self.stack.last_mut() {
                    block.push_str(&html);
                    return Ok(());
                }
                let node = self.document.create_raw_html(&html);
                let parent = self.current_parent();
                self.document.append_child(parent, node)
            }
            Event::Rule => self.open_element("hr").map(|_| ()),
            Event::FootnoteReference(name) => {
                let node = self.open_element("sup")?;
                let text = self.document.create_text(&format!("[{}]", name));
                self.document.append_child(node, text)
            }
            Event::TaskListMarker(checked) => {
                let node = self.open_element("input")?;
                self.document.set_attribute(node, "type", "checkbox")?;
                self.document.set_attribute(node, "disabled", "")?;
                if checked {
                    self.document.set_attribute(node, "checked", "")?;
                }
                Ok(())
            }
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                let node = self.open_element("span")?;
                self.document.set_attribute(node, "class", "math")?;
                let text = self.document.create_text(&math);
                self.document.append_child(node, text)
            }
        }
    }

    fn handle_text(&mut self, text: &str) -> Result<(), DomError> {
        if let Some(Frame::Image { alt, .. }) = self.stack.last_mut() {
            alt.push_str(text);
            return Ok(());
        }
        let node = self.document.create_text(text);
        let parent = self.current_parent();
        self.document.append_child(parent, node)
    }

    fn handle_start_tag(&mut self, tag: Tag<'_>) -> Result<(), DomError> {
        match tag {
            Tag::Paragraph => {
                self.push_element("p")?;
            }
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                let node = self.open_element(&format!("h{}", level as usize))?;
                if let Some(id) = id {
                    self.document.set_attribute(node, "id", &id)?;
                    self.used_ids.insert(id.to_string());
                }
                if !classes.is_empty() {
                    let class = classes.iter().join(" ");
                    self.document.set_attribute(node, "class", &class)?;
                }
                for (name, value) in attrs {
                    self.document
                        .set_attribute(node, &name, value.as_deref().unwrap_or(""))?;
                }
                self.stack.push(Frame::Heading(node));
            }
            Tag::BlockQuote(_) => {
                self.push_element("blockquote")?;
            }
            Tag::CodeBlock(kind) => {
                let pre = self.open_element("pre")?;
                let code = self.document.create_element("code");
                if let CodeBlockKind::Fenced(lang) = kind {
                    let lang = lang.split_whitespace().next().unwrap_or("");
                    if !lang.is_empty() {
                        self.document
                            .set_attribute(code, "class", &format!("language-{}", lang))?;
                    }
                }
                self.document.append_child(pre, code)?;
                self.stack.push(Frame::Element(code));
            }
            Tag::List(start) => match start {
                Some(number) => {
                    let list = self.push_element("ol")?;
                    if number != 1 {
                        self.document
                            .set_attribute(list, "start", &number.to_string())?;
                    }
                }
                None => {
                    self.push_element("ul")?;
                }
            },
            Tag::Item => {
                self.push_element("li")?;
            }
            Tag::Table(_) => {
                self.push_element("table")?;
            }
            Tag::TableHead => {
                // pulldown-cmark emits head cells without a row of their own
                let head = self.open_element("thead")?;
                let row = self.document.create_element("tr");
                self.document.append_child(head, row)?;
                self.stack.push(Frame::Element(row));
                self.in_table_head = true;
            }
            Tag::TableRow => {
                self.push_element("tr")?;
            }
            Tag::TableCell => {
                let tag = if self.in_table_head { "th" } else { "td" };
                self.push_element(tag)?;
            }
            Tag::Emphasis => {
                self.push_element("em")?;
            }
            Tag::Strong => {
                self.push_element("strong")?;
            }
            Tag::Strikethrough => {
                self.push_element("del")?;
            }
            Tag::Superscript => {
                self.push_element("sup")?;
            }
            Tag::Subscript => {
                self.push_element("sub")?;
            }
            Tag::Link {
                dest_url, title, ..
            } => {
                let link = self.push_element("a")?;
                self.document.set_attribute(link, "href", &dest_url)?;
                if !title.is_empty() {
                    self.document.set_attribute(link, "title", &title)?;
                }
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let node = self.open_element("img")?;
                self.document.set_attribute(node, "src", &dest_url)?;
                if !title.is_empty() {
                    self.document.set_attribute(node, "title", &title)?;
                }
                self.stack.push(Frame::Image {
                    node,
                    alt: String::new(),
                });
            }
            Tag::FootnoteDefinition(name) => {
                let node = self.push_element("div")?;
                self.document.set_attribute(node, "class", "footnote")?;
                self.document
                    .set_attribute(node, "id", &format!("fn-{}", name))?;
            }
            Tag::DefinitionList => {
                self.push_element("dl")?;
            }
            Tag::DefinitionListTitle => {
                self.push_element("dt")?;
            }
            Tag::DefinitionListDefinition => {
                self.push_element("dd")?;
            }
            Tag::HtmlBlock => self.stack.push(Frame::HtmlBlock(String::new())),
            // Metadata blocks are not rendered
            Tag::MetadataBlock(_) => self.stack.push(Frame::Transparent),
        }
        Ok(())
    }

    fn handle_end_tag(&mut self, tag_end: TagEnd) -> Result<(), DomError> {
        if matches!(tag_end, TagEnd::TableHead) {
            self.in_table_head = false;
        }

        match self.stack.pop() {
            Some(Frame::Image { node, alt }) => self.document.set_attribute(node, "alt", &alt),
            Some(Frame::Heading(node)) => self.finish_heading(node),
            Some(Frame::HtmlBlock(html)) => {
                let node = self.document.create_raw_html(&html);
                let parent = self.current_parent();
                self.document.append_child(parent, node)
            }
            Some(Frame::Element(_)) | Some(Frame::Transparent) => Ok(()),
            None => {
                log::warn!("Unbalanced markdown end tag {:?}", tag_end);
                Ok(())
            }
        }
    }

    /// Assign a generated id to a heading that has none
    fn finish_heading(&mut self, node: NodeId) -> Result<(), DomError> {
        if !self.heading_ids || !self.document.element_id(node).is_empty() {
            return Ok(());
        }
        let base = slugify(&self.document.text_content(node));
        if base.is_empty() {
            return Ok(());
        }
        let id = unique_id(&base, &self.used_ids);
        self.document.set_attribute(node, "id", &id)?;
        self.used_ids.insert(id);
        Ok(())
    }

    fn finish(self) -> Result<Document, DomError> {
        if !self.stack.is_empty() {
            log::warn!("{} markdown tags left open at end of input", self.stack.len());
        }
        Ok(self.document)
    }
}

/// Lower-case alphanumerics with every other run collapsed to a single `-`
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// `base`, or `base-1`, `base-2`, ... whichever is not taken yet
fn unique_id(base: &str, used: &HashSet<String>) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
