//! HTML rendering of a parsed [`Document`].
//!
//! Each node kind is rendered by an [`HtmlTagWriter`]. [`HtmlSerializer`] picks the writer for a
//! node and recurses through the tree. Kinds without a writer render only their children.
use std::borrow::Cow;

use once_cell::sync::Lazy;
use static_assertions::assert_obj_safe;

use crate::{
    args::RenderArgs,
    parser::rules::NodeKind,
    tree::{Document, Node, NodeId},
};

pub mod builtins;

/// Converts nodes of one or more kinds to HTML.
pub trait HtmlTagWriter: Send + Sync {
    /// Whether this writer renders nodes of `kind`.
    /// # Remarks
    /// The serializer takes the first registered writer that matches, this function MUST always
    /// return the same output for each possible input.
    fn match_kind(&self, kind: NodeKind) -> bool;

    /// Write HTML for the node `id`, pushing it into the given buffer.
    /// # Remarks
    /// The `out` buffer provided may already have contents, an implementation must not overwrite
    /// prior contents. Children are written through [`HtmlContext::write_children`].
    fn write(&self, ctx: &HtmlContext<'_>, id: NodeId, out: &mut String);
}

assert_obj_safe!(HtmlTagWriter);

/// Escape text for use in HTML content or a quoted attribute value.
pub fn escape(text: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(text)
}

/// State handed to writers while a document is serialized.
pub struct HtmlContext<'a> {
    serializer: &'a HtmlSerializer,
    doc: &'a Document,
    args: &'a RenderArgs,
}

impl<'a> HtmlContext<'a> {
    pub fn doc(&self) -> &'a Document {
        self.doc
    }

    pub fn node(&self, id: NodeId) -> &'a Node {
        self.doc.node(id)
    }

    pub fn args(&self) -> &'a RenderArgs {
        self.args
    }

    pub fn write_node(&self, id: NodeId, out: &mut String) {
        match self.serializer.get_writer_for_kind(self.doc.kind(id)) {
            Some(writer) => writer.write(self, id, out),
            None => self.write_children(id, out),
        }
    }

    pub fn write_children(&self, id: NodeId, out: &mut String) {
        for child in self.doc.children(id) {
            self.write_node(*child, out);
        }
    }

    /// The rendered children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_children(id, &mut out);
        out
    }

    /// Whether every child of `id` is literal text.
    pub fn is_plain(&self, id: NodeId) -> bool {
        self.doc
            .children(id)
            .iter()
            .all(|c| self.doc.kind(*c) == NodeKind::Text)
    }
}

static STANDARD: Lazy<HtmlSerializer> =
    Lazy::new(|| HtmlSerializer::with_tags(builtins::all_tags()));

/// Serializes a [`Document`] to HTML using the registered writers.
pub struct HtmlSerializer {
    tag_impls: Vec<Box<dyn HtmlTagWriter>>,
}

impl HtmlSerializer {
    /// Construct a new serializer with no writers. It writes nothing, not even text.
    pub fn empty() -> Self {
        Self::with_tags(vec![])
    }

    /// Construct a new serializer with the given writers.
    pub fn with_tags(tag_impls: Vec<Box<dyn HtmlTagWriter>>) -> Self {
        Self { tag_impls }
    }

    /// The serializer for the stock vocabulary, shared.
    pub fn standard() -> &'static HtmlSerializer {
        &STANDARD
    }

    /// Register the provided writers, after the existing ones.
    pub fn register_tags(&mut self, tags: &mut Vec<Box<dyn HtmlTagWriter>>) {
        self.tag_impls.append(tags);
    }

    /// Register the provided writer, after the existing ones.
    pub fn register_tag(&mut self, tag: Box<dyn HtmlTagWriter>) {
        self.tag_impls.push(tag);
    }

    /// Attempt to locate the writer for the given kind, if one exists.
    pub fn get_writer_for_kind(&self, kind: NodeKind) -> Option<&dyn HtmlTagWriter> {
        self.tag_impls
            .iter()
            .find(|imp| imp.match_kind(kind))
            .map(|imp| imp.as_ref())
    }

    /// Serialize the given document to HTML.
    pub fn serialize(&self, doc: &Document, args: &RenderArgs) -> String {
        let ctx = HtmlContext {
            serializer: self,
            doc,
            args,
        };
        let mut out = String::with_capacity(doc.len() * 8);
        ctx.write_node(doc.root(), &mut out);
        out
    }
}
