//! HTML writer for numbered documents
//!
//! Serializes a [`Document`] into a standalone HTML page with:
//! - the numbered headings and the generated outline as built in the tree
//! - escaped text and attribute values; raw HTML nodes written verbatim
//! - embedded CSS styling with sans-serif fonts

use crate::dom::{Document, NodeId, NodeKind};
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during HTML export
#[derive(Error, Debug)]
pub enum HtmlExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Elements that never have content or a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements followed by a line break to keep the output readable
const BLOCK_ELEMENTS: &[&str] = &[
    "blockquote", "body", "dd", "div", "dl", "dt", "h1", "h2", "h3", "h4", "h5", "h6", "hr",
    "li", "nav", "ol", "p", "pre", "table", "tbody", "thead", "tr", "ul",
];

/// Export a document to an HTML file
///
/// # Parameters
/// * `doc` - The document to export
/// * `title` - Text for the page's `<title>`
/// * `output_path` - Path where the HTML file will be written
///
/// # Returns
/// * `Ok(())` - Successfully exported to HTML
/// * `Err(HtmlExportError)` - Error during export
pub fn to_html(doc: &Document, title: &str, output_path: &Path) -> Result<(), HtmlExportError> {
    let output = to_html_string(doc, title);

    // Write to file - create parent directories if they don't exist
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(output_path)?;
    file.write_all(output.as_bytes())?;

    log::info!("Wrote {} bytes to {}", output.len(), output_path.display());
    Ok(())
}

/// Render a document as a complete HTML page
pub fn to_html_string(doc: &Document, title: &str) -> String {
    let mut output = String::new();

    write_html_header(&mut output, title);

    output.push_str("<body>\n");
    output.push_str("<div class=\"container\">\n");
    for &child in doc.children(doc.body()) {
        write_node(&mut output, doc, child);
    }
    output.push_str("</div>\n");
    output.push_str("</body>\n");
    output.push_str("</html>\n");

    output
}

/// Write HTML header with CSS styling
fn write_html_header(output: &mut String, title: &str) {
    output.push_str("<!DOCTYPE html>\n");
    output.push_str("<html lang=\"en\">\n");
    output.push_str("<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n");
    output.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    output.push_str("<style>\n");
    output.push_str(CSS_STYLES);
    output.push_str("</style>\n");
    output.push_str("</head>\n");
}

fn write_node(output: &mut String, doc: &Document, node: NodeId) {
    let Ok(data) = doc.node(node) else {
        return;
    };

    match &data.kind {
        NodeKind::Text(text) => output.push_str(&escape_html(text)),
        NodeKind::RawHtml(html) => output.push_str(html),
        NodeKind::Element { tag, attributes } => {
            output.push('<');
            output.push_str(tag);
            for (name, value) in attributes {
                if value.is_empty() {
                    output.push_str(&format!(" {}", name));
                } else {
                    output.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
                }
            }
            output.push('>');

            if VOID_ELEMENTS.contains(&tag.as_str()) {
                if BLOCK_ELEMENTS.contains(&tag.as_str()) {
                    output.push('\n');
                }
                return;
            }

            // List containers read better with their items on separate lines
            if matches!(tag.as_str(), "ul" | "ol" | "table" | "thead" | "tr") {
                output.push('\n');
            }
            for &child in doc.children(node) {
                write_node(output, doc, child);
            }
            output.push_str(&format!("</{}>", tag));
            if BLOCK_ELEMENTS.contains(&tag.as_str()) {
                output.push('\n');
            }
        }
    }
}

/// Escape text for use in HTML content and attribute values
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Page styling, including the generated outline
const CSS_STYLES: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', 'Oxygen',
                 'Ubuntu', 'Cantarell', 'Fira Sans', 'Droid Sans', 'Helvetica Neue',
                 sans-serif;
    line-height: 1.6;
    color: #333;
    background-color: #f5f5f5;
    padding: 20px;
}

.container {
    max-width: 900px;
    margin: 0 auto;
    background: white;
    padding: 60px;
    box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);
    border-radius: 4px;
}

h1 {
    font-size: 2.5em;
    font-weight: 700;
    margin-bottom: 20px;
    color: #1a1a1a;
    border-bottom: 3px solid #0066cc;
    padding-bottom: 10px;
}

h2, h3, h4 {
    margin-top: 40px;
    margin-bottom: 20px;
    color: #1a1a1a;
    font-weight: 600;
    border-bottom: 2px solid #e0e0e0;
    padding-bottom: 8px;
}

h2 {
    font-size: 2em;
}

h3 {
    font-size: 1.6em;
}

h4 {
    font-size: 1.3em;
}

nav.toc {
    margin-bottom: 40px;
    padding: 20px;
    background-color: #f9f9f9;
    border-left: 4px solid #0066cc;
    border-radius: 4px;
}

nav.toc .toc-title {
    font-size: 1.3em;
    color: #555;
    margin-bottom: 10px;
    font-weight: 500;
    text-align: left;
}

nav.toc ul {
    list-style: none;
    margin-bottom: 0;
    padding-left: 20px;
}

nav.toc > ul {
    padding-left: 0;
}

nav.toc li {
    margin-bottom: 4px;
}

nav.toc a {
    color: #0066cc;
    text-decoration: none;
}

nav.toc a:hover {
    text-decoration: underline;
}

p {
    margin-bottom: 16px;
    text-align: justify;
}

strong {
    font-weight: 600;
    color: #1a1a1a;
}

em {
    font-style: italic;
}

del {
    text-decoration: line-through;
    color: #888;
}

code {
    font-family: 'Monaco', 'Menlo', 'Ubuntu Mono', 'Consolas', monospace;
    background-color: #f4f4f4;
    padding: 2px 6px;
    border-radius: 3px;
    font-size: 0.9em;
    color: #d73a49;
}

pre {
    background-color: #f6f8fa;
    border: 1px solid #e1e4e8;
    border-radius: 4px;
    padding: 16px;
    margin-bottom: 16px;
    overflow-x: auto;
}

pre code {
    background: none;
    padding: 0;
    color: #24292e;
    font-size: 0.9em;
    line-height: 1.45;
}

blockquote {
    border-left: 4px solid #ddd;
    padding-left: 16px;
    margin: 16px 0;
    color: #666;
    font-style: italic;
}

ul, ol {
    margin-bottom: 16px;
    padding-left: 30px;
}

li {
    margin-bottom: 8px;
}

table {
    width: 100%;
    border-collapse: collapse;
    margin-bottom: 20px;
    font-size: 0.95em;
}

th, td {
    padding: 8px 12px;
    border: 1px solid #ddd;
    text-align: left;
}

thead {
    background-color: #f6f8fa;
    font-weight: 600;
}

img {
    max-width: 100%;
    height: auto;
}
"#;
