//! The document tree, stored as an arena of nodes addressed by [`NodeId`].

use crate::parser::rules::NodeKind;

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One element of the tree.
///
/// The kind is fixed at construction. Downgrading a node (for example to literal text) means
/// building a new node and [replacing](Document::replace) the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    value: String,
    attribute: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    paired: bool,
}

impl Node {
    pub fn new(kind: NodeKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            attribute: String::new(),
            children: Vec::new(),
            parent: None,
            paired: true,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(NodeKind::Text, value)
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The raw tag name as written, or the literal text of a text node.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The raw attribute, stored verbatim. Empty when the tag had none.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Whether the node's closing tag has been consumed (always true for leaves).
    pub fn is_paired(&self) -> bool {
        self.paired
    }
}

/// A parsed document. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Root, "")],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Total number of slots in the arena, including nodes no longer reachable from the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    /// Append `node` as the last child of `parent`.
    pub(crate) fn append(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Put `node` in the slot of `id`, keeping the old parent link and children.
    pub(crate) fn replace(&mut self, id: NodeId, mut node: Node) {
        let old = &mut self.nodes[id.0];
        node.parent = old.parent;
        if node.children.is_empty() {
            node.children = std::mem::take(&mut old.children);
        }
        *old = node;
    }

    pub(crate) fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        self.nodes[id.0].children = children;
    }

    pub(crate) fn set_paired(&mut self, id: NodeId, paired: bool) {
        self.nodes[id.0].paired = paired;
    }

    pub(crate) fn push_attribute(&mut self, id: NodeId, c: char) {
        self.nodes[id.0].attribute.push(c);
    }

    /// Every node reachable from the root, in document order. The root itself is excluded.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: self.nodes[0].children.iter().rev().copied().collect(),
        }
    }

    /// The concatenated literal text of the subtree under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        if node.kind == NodeKind::Text {
            out.push_str(&node.value);
        }
        for child in &node.children {
            self.collect_text(*child, out);
        }
    }

    /// Rebuild markup for the subtree under `id`, used to point at the offending region in
    /// parse errors. Open tags are written without a closing counterpart.
    pub fn reconstruct(&self, id: NodeId) -> String {
        let mut out = String::new();
        let node = self.node(id);
        if node.kind != NodeKind::Root {
            write_open_tag(node, &mut out);
        }
        for child in &node.children {
            self.reconstruct_into(*child, &mut out);
        }
        out
    }

    fn reconstruct_into(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        match node.kind {
            NodeKind::Root | NodeKind::ParagraphStart | NodeKind::ParagraphEnd => {}
            NodeKind::Text => out.push_str(&node.value),
            NodeKind::LineBreak if node.value.is_empty() => out.push('\n'),
            NodeKind::LineBreak => write_open_tag(node, out),
            NodeKind::Smilies => {
                out.push('(');
                out.push_str(&node.value);
                out.push_str(&node.attribute);
                out.push(')');
            }
            NodeKind::Bmo => {
                out.push('(');
                out.push_str(&node.attribute);
                out.push(')');
            }
            _ => {
                write_open_tag(node, out);
                for child in &node.children {
                    self.reconstruct_into(*child, out);
                }
                if node.paired {
                    out.push_str("[/");
                    out.push_str(&node.value);
                    out.push(']');
                }
            }
        }
    }
}

fn write_open_tag(node: &Node, out: &mut String) {
    out.push('[');
    out.push_str(&node.value);
    if !node.attribute.is_empty() {
        out.push('=');
        out.push_str(&node.attribute);
    }
    out.push(']');
}

/// Depth-first iterator returned by [`Document::descendants`].
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.doc.node(id);
        self.stack.extend(node.children.iter().rev().copied());
        Some((id, node))
    }
}
