//! In-memory document tree
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! copyable [`NodeId`] handles. The tree offers the operations needed to
//! number headings and build an outline in place:
//! - child enumeration, parent and sibling lookup
//! - tag, attribute and `id` inspection
//! - node creation, attachment and deep copying of content

mod error;
mod node;

pub use error::DomError;
pub use node::{Node, NodeId, NodeKind};

/// A document tree rooted at an `html` element with a single `body` child
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing `<html><body></body></html>`
    pub fn new() -> Self {
        let mut document = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
        };
        let root = document.create_element("html");
        let body = document.create_element("body");
        document.nodes[body.0].parent = Some(root);
        document.nodes[root.0].children.push(body);
        document.root = root;
        document.body = body;
        document
    }

    /// The `html` element
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `body` element
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Look up a node by handle
    pub fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind));
        id
    }

    /// Create a detached element; the tag is stored lower-cased
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    /// Create a detached node whose markup is written out verbatim
    pub fn create_raw_html(&mut self, html: &str) -> NodeId {
        self.push(NodeKind::RawHtml(html.to_string()))
    }

    /// Attach `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let index = self.node(parent)?.children.len();
        self.insert_child(parent, index, child)
    }

    /// Attach `child` as the first child of `parent`, before any existing content
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_child(parent, 0, child)
    }

    /// Attach `child` at `index` among the children of `parent`
    ///
    /// An index past the end appends.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        if !self.node(parent)?.is_element() {
            return Err(DomError::NotAContainer(parent));
        }
        if let Some(existing) = self.node(child)?.parent {
            return Err(DomError::AlreadyAttached {
                child,
                parent: existing,
            });
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(DomError::Cycle { child, parent });
        }

        let children = &mut self.node_mut(parent)?.children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Put the detached node `new` where the attached node `old` is, detaching `old`
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> Result<(), DomError> {
        let parent = self.parent(old).ok_or(DomError::Detached(old))?;
        let index = self
            .children(parent)
            .iter()
            .position(|&child| child == old)
            .ok_or(DomError::Detached(old))?;
        self.insert_child(parent, index, new)?;
        self.node_mut(parent)?.children.retain(|&child| child != old);
        self.node_mut(old)?.parent = None;
        Ok(())
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Children of a node in document order; empty for leaves and unknown handles
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Child at `index`, if any
    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    /// Lower-cased tag name for elements, `None` for text and raw markup
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.0).and_then(Node::tag)
    }

    /// Value of an attribute, matched case-insensitively
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Attributes of an element in insertion order
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.nodes.get(id.0).map(|node| &node.kind) {
            Some(NodeKind::Element { attributes, .. }) => attributes.as_slice(),
            _ => &[],
        }
    }

    /// Set or replace an attribute
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element { attributes, .. } => {
                match attributes
                    .iter()
                    .position(|(key, _)| key.eq_ignore_ascii_case(name))
                {
                    Some(index) => attributes[index].1 = value.to_string(),
                    None => attributes.push((name.to_ascii_lowercase(), value.to_string())),
                }
                Ok(())
            }
            _ => Err(DomError::NotAContainer(id)),
        }
    }

    /// The element's `id` attribute, or an empty string when it has none
    pub fn element_id(&self, id: NodeId) -> &str {
        self.attribute(id, "id").unwrap_or("")
    }

    /// Concatenated text of a node and its descendants
    ///
    /// Raw markup contributes nothing.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::RawHtml(_) => {}
            NodeKind::Element { .. } => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Deep-copy every child of `source` and append the copies to `target`
    pub fn clone_children_into(&mut self, source: NodeId, target: NodeId) -> Result<(), DomError> {
        self.node(source)?;
        if !self.node(target)?.is_element() {
            return Err(DomError::NotAContainer(target));
        }
        // Snapshot first so copying a node into its own subtree terminates.
        let children = self.children(source).to_vec();
        for child in children {
            let copy = self.deep_clone(child)?;
            self.append_child(target, copy)?;
        }
        Ok(())
    }

    /// Detached deep copy of a node and its subtree
    pub fn deep_clone(&mut self, id: NodeId) -> Result<NodeId, DomError> {
        let kind = self.node(id)?.kind.clone();
        let copy = self.push(kind);
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.deep_clone(child)?;
            self.append_child(copy, child_copy)?;
        }
        Ok(copy)
    }

    /// Depth-first search for the element whose `id` attribute equals `element_id`
    pub fn find_element_by_id(&self, start: NodeId, element_id: &str) -> Option<NodeId> {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if self.attribute(id, "id") == Some(element_id) {
                return Some(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        None
    }

    /// Elements with the given tag below `start`, in document order
    pub fn elements_by_tag(&self, start: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if self
                .tag_name(id)
                .is_some_and(|name| name.eq_ignore_ascii_case(tag))
            {
                found.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        found
    }
}
