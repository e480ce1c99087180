//! Post-pass turning runs of line breaks into paragraph boundaries.

use crate::{
    parser::rules::{NodeKind, TagRegistry},
    tree::{Document, Node, NodeId},
};

/// Normalize line breaks throughout `doc`.
///
/// In every container, leading and trailing breaks are dropped and a break directly after a
/// block-level sibling becomes empty text. Inside block-level containers, a run of two or more
/// breaks becomes one [`ParagraphEnd`](NodeKind::ParagraphEnd) followed by one
/// [`ParagraphStart`](NodeKind::ParagraphStart). Single breaks are kept.
pub fn normalize(doc: &mut Document, registry: &TagRegistry) {
    let root = doc.root();
    normalize_node(doc, root, registry);
}

fn is_break(doc: &Document, id: NodeId) -> bool {
    doc.kind(id) == NodeKind::LineBreak
}

fn normalize_node(doc: &mut Document, id: NodeId, registry: &TagRegistry) {
    let children = doc.children(id);
    let start = children
        .iter()
        .position(|c| !is_break(doc, *c))
        .unwrap_or(children.len());
    let end = children
        .iter()
        .rposition(|c| !is_break(doc, *c))
        .map_or(start, |i| i + 1);
    let children = children[start..end].to_vec();

    let block = registry.is_block(doc.kind(id));
    let mut out = Vec::with_capacity(children.len());
    let mut previous_is_block = false;
    let mut i = 0;

    while i < children.len() {
        let child = children[i];

        if !is_break(doc, child) {
            previous_is_block = registry.is_block(doc.kind(child));
            normalize_node(doc, child, registry);
            out.push(child);
            i += 1;
            continue;
        }

        if previous_is_block {
            doc.replace(child, Node::text(""));
            out.push(child);
            previous_is_block = false;
            i += 1;
            continue;
        }

        let run_start = i;
        while i < children.len() && is_break(doc, children[i]) {
            i += 1;
        }
        let run = &children[run_start..i];

        if block && run.len() >= 2 {
            doc.replace(run[0], Node::new(NodeKind::ParagraphEnd, ""));
            doc.replace(run[1], Node::new(NodeKind::ParagraphStart, ""));
            out.extend_from_slice(&run[..2]);
        } else {
            out.extend_from_slice(run);
        }
    }

    doc.set_children(id, out);
}
