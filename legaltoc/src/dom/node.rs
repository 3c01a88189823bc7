//! Node storage for the document arena

use std::fmt;

/// Handle to a node inside a [`Document`](super::Document)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(super) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Element with a lower-cased tag name and ordered attributes
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    /// Plain text, escaped on output
    Text(String),
    /// Markup passed through verbatim
    RawHtml(String),
}

/// A single node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    /// Payload of the node
    pub kind: NodeKind,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
}

impl Node {
    pub(super) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Tag name if this node is an element
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }
}
