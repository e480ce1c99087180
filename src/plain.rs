//! Plain-text rendering: the prose of a document without its markup.
//!
//! Links, images, quotes, code and emoticons are left out, masked text is blanked out, and line
//! breaks become spaces, so the result reads as a one-line summary.

use unicode_segmentation::UnicodeSegmentation;

use crate::{
    args::RenderArgs,
    parser::rules::NodeKind,
    tree::{Document, NodeId},
};

/// Character standing in for each grapheme of masked text.
pub const MASK_CHAR: char = '■';

/// Render `doc` as plain text.
///
/// No argument currently changes plain output; `args` is taken so all targets share a shape.
pub fn render(doc: &Document, _args: &RenderArgs) -> String {
    let mut out = String::new();
    write_node(doc, doc.root(), &mut out);
    out
}

fn write_children(doc: &Document, id: NodeId, out: &mut String) {
    for child in doc.children(id) {
        write_node(doc, *child, out);
    }
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.kind(id) {
        NodeKind::Text => out.push_str(doc.node(id).value()),
        NodeKind::LineBreak => out.push(' '),
        NodeKind::ParagraphStart | NodeKind::ParagraphEnd => {}
        NodeKind::Mask => {
            let mut inner = String::new();
            write_children(doc, id, &mut inner);
            out.extend(std::iter::repeat(MASK_CHAR).take(inner.graphemes(true).count()));
        }
        NodeKind::Quote
        | NodeKind::Code
        | NodeKind::Url
        | NodeKind::Image
        | NodeKind::Photo
        | NodeKind::Subject
        | NodeKind::User
        | NodeKind::Smilies
        | NodeKind::Bmo => {}
        NodeKind::Root
        | NodeKind::Center
        | NodeKind::Left
        | NodeKind::Right
        | NodeKind::Align
        | NodeKind::List
        | NodeKind::ListItem
        | NodeKind::Bold
        | NodeKind::Italic
        | NodeKind::Underline
        | NodeKind::Delete
        | NodeKind::Color
        | NodeKind::Size => write_children(doc, id, out),
    }
}

#[cfg(test)]
mod tests {
    use crate::{parse, render_plain, RenderArgs};

    fn plain(input: &str) -> String {
        render_plain(&parse(input).unwrap(), &RenderArgs::default())
    }

    #[test]
    fn styles_keep_text() {
        assert_eq!(plain("我是[b]粗体字[/b]"), "我是粗体字");
        assert_eq!(plain("我是[i]斜体字[/i][u]下[/u][s]删[/s]"), "我是斜体字下删");
        assert_eq!(plain("[align=center]居中文字[/align]"), "居中文字");
        assert_eq!(
            plain("[size=10]不同[/size][size=big]大小的[/size][color=red]文字[/color]"),
            "不同大小的文字"
        );
    }

    #[test]
    fn mask_counts_graphemes() {
        assert_eq!(plain("我是[mask]马赛克文字[/mask]"), "我是■■■■■");
        assert_eq!(plain("[mask]e\u{301}👍🏽[/mask]"), "■■");
    }

    #[test]
    fn summaries_skip_embeds() {
        assert_eq!(plain("[url=https://www.baidu.com]百度[/url]"), "");
        assert_eq!(plain("[url]https://www.baidu.com[/url]"), "");
        assert_eq!(plain("a[quote]b[/quote]c[code]d[/code]"), "ac");
        assert_eq!(plain("[img]https://a.b/c.png[/img][photo]x.jpg[/photo]"), "");
        assert_eq!(plain("[subject=1]x[/subject][user=2]y[/user]"), "");
    }

    #[test]
    fn emoticons_are_dropped() {
        assert_eq!(plain("a(bgm38)b"), "ab");
        assert_eq!(plain("(bmoCAkiCE0CATYIiNA) hi"), " hi");
        assert_eq!(plain("(bmoC)"), "");
    }

    #[test]
    fn breaks_become_spaces() {
        assert_eq!(plain("a\nb"), "a b");
        assert_eq!(plain("a\n\n\nb"), "ab");
        assert_eq!(plain("[list][*]a[*]b[/list]"), "ab");
    }
}
