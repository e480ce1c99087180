//! Built-in writers for the stock vocabulary.
use std::fmt::Write as _;

use super::{escape, HtmlContext, HtmlTagWriter};
use crate::{
    args::{image_dimensions, is_valid_color, parse_size, DEFAULT_COLOR},
    emoticon::{codec, short_code_path},
    parser::rules::NodeKind,
    tree::NodeId,
};

const LINK_ATTRS: &str = r#"target="_blank" rel="nofollow external noopener noreferrer""#;
const IMAGE_ATTRS: &str = r#"rel="noreferrer" referrerpolicy="no-referrer""#;

impl<T: SimpleHtmlTagWriter + Send + Sync> HtmlTagWriter for T {
    fn match_kind(&self, kind: NodeKind) -> bool {
        Self::KINDS.contains(&kind)
    }

    fn write(&self, ctx: &HtmlContext<'_>, id: NodeId, out: &mut String) {
        out.push_str(Self::HTML_OPEN);
        ctx.write_children(id, out);
        out.push_str(Self::HTML_CLOSE);
    }
}

trait SimpleHtmlTagWriter {
    const KINDS: &'static [NodeKind];

    const HTML_OPEN: &'static str;

    const HTML_CLOSE: &'static str;
}

macro_rules! simple_tag {
    ($doc:expr, $name:ident, $kinds:expr, $open:expr, $close:expr) => {
        #[derive(Copy, Clone, Debug, Default)]
        #[doc = $doc]
        #[doc = "# Exact output"]
        #[doc = "```html"]
        #[doc = $open]
        #[doc = " contents"]
        #[doc = $close]
        #[doc = "```"]
        pub struct $name;

        impl SimpleHtmlTagWriter for $name {
            const KINDS: &'static [NodeKind] = &$kinds;
            const HTML_OPEN: &'static str = $open;
            const HTML_CLOSE: &'static str = $close;
        }
    };
}

macro_rules! simple_standalone_tag {
    ($doc:expr, $name:ident, $kinds:expr, $standalone:expr) => {
        #[derive(Copy, Clone, Debug, Default)]
        #[doc = $doc]
        #[doc = "# Exact output"]
        #[doc = "```html"]
        #[doc = $standalone]
        #[doc = "```"]
        pub struct $name;

        impl SimpleHtmlTagWriter for $name {
            const KINDS: &'static [NodeKind] = &$kinds;
            const HTML_OPEN: &'static str = $standalone;
            const HTML_CLOSE: &'static str = "";
        }
    };
}

simple_tag! {
    "`[b]`, converts directly to HTML5 `<strong>`.",
    BoldTag, [NodeKind::Bold], "<strong>", "</strong>"
}
simple_tag! {
    "`[i]`, converts directly to HTML5 `<em>`.",
    ItalicTag, [NodeKind::Italic], "<em>", "</em>"
}
simple_tag! {
    "`[u]`, converts directly to HTML5 `<u>`.",
    UnderlineTag, [NodeKind::Underline], "<u>", "</u>"
}
simple_tag! {
    "`[s]`, converts directly to HTML5 `<del>`.",
    DeleteTag, [NodeKind::Delete], "<del>", "</del>"
}
simple_tag! {
    "`[mask]`, spoiler text hidden until hovered.",
    MaskTag, [NodeKind::Mask], "<span class=\"mask\">", "</span>"
}
simple_tag! {
    "`[center]`, a centred paragraph.",
    CenterTag, [NodeKind::Center], "<p style=\"text-align: center;\">", "</p>"
}
simple_tag! {
    "`[left]`, a left-aligned paragraph.",
    LeftTag, [NodeKind::Left], "<p style=\"text-align: left;\">", "</p>"
}
simple_tag! {
    "`[right]`, a right-aligned paragraph.",
    RightTag, [NodeKind::Right], "<p style=\"text-align: right;\">", "</p>"
}
simple_tag! {
    "`[code]`, preformatted code.",
    CodeTag, [NodeKind::Code], "<div class=\"code\"><pre><code>", "</code></pre></div>"
}
simple_tag! {
    "`[quote]`, a block quote.",
    QuoteTag, [NodeKind::Quote], "<div class=\"quote\"><blockquote>", "</blockquote></div>"
}
simple_tag! {
    "`[*]`, one item of a list.",
    ListItemTag, [NodeKind::ListItem], "<li>", "</li>"
}
simple_standalone_tag! {
    "A line break.",
    LinebreakTag, [NodeKind::LineBreak], "<br>"
}
simple_standalone_tag! {
    "Start of a paragraph.",
    ParagraphStartTag, [NodeKind::ParagraphStart], "<p>"
}
simple_standalone_tag! {
    "End of a paragraph.",
    ParagraphEndTag, [NodeKind::ParagraphEnd], "</p>"
}

/// Literal text, escaped.
#[derive(Copy, Clone, Debug, Default)]
pub struct TextTag;

impl HtmlTagWriter for TextTag {
    fn match_kind(&self, kind: NodeKind) -> bool {
        kind == NodeKind::Text
    }

    fn write(&self, ctx: &HtmlContext<'_>, id: NodeId, out: &mut String) {
        out.push_str(&escape(ctx.node(id).value()));
    }
}

/// `[align=left|right|center]`. Any other alignment renders only the content.
#[derive(Copy, Clone, Debug, Default)]
pub struct AlignTag;

impl HtmlTagWriter for AlignTag {
    fn match_kind(&self, kind: NodeKind) -> bool {
        kind == NodeKind::Align
    }

    fn write(&self, ctx: &HtmlContext<'_>, id: NodeId, out: &mut String) {
        let attr = ctx.node(id).attribute().to_ascii_lowercase();
        if !matches!(attr.as_str(), "left" | "right" | "center") {
            ctx.write_children(id, out);
            return;
        }

        let _ = write!(out, "<p style=\"text-align: {attr};\">");
        ctx.write_children(id, out);
        out.push_str("</p>");
    }
}

/// `[list]` as `<ul>`, `[list=...]` as `<ol>`.
#[derive(Copy, Clone, Debug, Default)]
pub struct ListTag;

impl HtmlTagWriter for ListTag {
    fn match_kind(&self, kind: NodeKind) -> bool {
        kind == NodeKind::List
    }

    fn write(&self, ctx: &HtmlContext<'_>, id: NodeId, out: &mut String) {
        let element = if ctx.node(id).attribute().is_empty() {
            "ul"
        } else {
            "ol"
        };
        let _ = write!(out, "<{element}>");
        ctx.write_children(id, out);
        let _ = write!(out, "</{element}>");
    }
}

fn write_link(out: &mut String, href: &str, content: &str) {
    let _ = write!(
        out,
        "<a href=\"{}\" {LINK_ATTRS}>{content}</a>",
        escape(href)
    );
}

fn write_image(out: &mut String, src: &str, attr: &str) {
    let _ = write!(out, "<img src=\"{}\" {IMAGE_ATTRS}", escape(src));
    match image_dimensions(attr) {
        Some((width, height)) => {
            let _ = write!(out, " alt=\"\" width=\"{width}\" height=\"{height}\" />");
        }
        None => {
            let _ = write!(out, " alt=\"{}\" />", escape(attr));
        }
    }
}

/// `[url]address[/url]` and `[url=address]text[/url]`.
///
/// Addresses that can't be completed into an absolute URL render without a link.
#[derive(Copy, Clone, Debug, Default)]
pub struct LinkTag;

impl HtmlTagWriter for LinkTag {
    fn match_kind(&self, kind: NodeKind) -> bool {
        kind == NodeKind::Url
    }

    fn write(&self, ctx: &HtmlContext<'_>, id: NodeId, out: &mut String) {
        let node = ctx.node(id);

        if node.attribute().is_empty() {
            if !ctx.is_plain(id) {
                ctx.write_children(id, out);
                return;
            }

            let raw = ctx.doc().text_content(id);
            match ctx.args().complete_url(&raw) {
                Some(href) => write_link(out, &href, &escape(&raw)),
                None => out.push_str(&escape(&raw)),
            }
            return;
        }

        match ctx.args().complete_url(node.attribute()) {
            Some(href) => write_link(out, &href, &ctx.inner_html(id)),
            None => ctx.write_children(id, out),
        }
    }
}

/// `[img]address[/img]`, with an optional `width,height` or alt text attribute.
#[derive(Copy, Clone, Debug, Default)]
pub struct ImageTag;

impl HtmlTagWriter for ImageTag {
    fn match_kind(&self, kind: NodeKind) -> bool {
        kind == NodeKind::Image
    }

    fn write(&self, ctx: &HtmlContext<'_>, id: NodeId, out: &mut String) {
        let raw = ctx.doc().text_content(id);
        match ctx.args().complete_url(&raw) {
            Some(src) => write_image(out, &src, ctx.node(id).attribute()),
            None => out.push_str(&escape(&raw)),
        }
    }
}

/// `[photo]path[/photo]`, an image hosted on the media server.
#[derive(Copy, Clone, Debug, Default)]
pub struct PhotoTag;

impl HtmlTagWriter for PhotoTag {
    fn match_kind(&self, kind: NodeKind) -> bool {
        kind == NodeKind::Photo
    }

    fn write(&self, ctx: &HtmlContext<'_>, id: NodeId, out: &mut String) {
        let raw = ctx.doc().text_content(id);
        match ctx.args().complete_url(&ctx.args().photo_url(&raw)) {
            Some(src) => write_image(out, &src, ctx.node(id).attribute()),
            None => out.push_str(&escape(&raw)),
        }
    }
}

/// `[subject=id]` and `[user=id]`, links into the site.
#[derive(Copy, Clone, Debug, Default)]
pub struct SiteLinkTag;

impl HtmlTagWriter for SiteLinkTag {
    fn match_kind(&self, kind: NodeKind) -> bool {
        matches!(kind, NodeKind::Subject | NodeKind::User)
    }

    fn write(&self, ctx: &HtmlContext<'_>, id: NodeId, out: &mut String) {
        let node = ctx.node(id);
        let attr = node.attribute();
        if attr.is_empty() {
            ctx.write_children(id, out);
            return;
        }

        let (href, prefix) = match node.kind() {
            NodeKind::User => (ctx.args().user_url(attr), "@"),
            _ => (ctx.args().subject_url(attr), ""),
        };
        match ctx.args().complete_url(&href) {
            Some(href) => write_link(out, &href, &format!("{prefix}{}", ctx.inner_html(id))),
            None => ctx.write_children(id, out),
        }
    }
}

/// Write the tag back as literal markup around its rendered content.
fn write_literal(ctx: &HtmlContext<'_>, id: NodeId, out: &mut String) {
    let node = ctx.node(id);
    let _ = write!(out, "[{}", escape(node.value()));
    if !node.attribute().is_empty() {
        let _ = write!(out, "={}", escape(node.attribute()));
    }
    out.push(']');
    ctx.write_children(id, out);
    let _ = write!(out, "[/{}]", escape(node.value()));
}

/// `[color=name]` or `[color=#hex]`. Invalid colours are kept as literal markup, and a bare
/// `[color]` is black.
#[derive(Copy, Clone, Debug, Default)]
pub struct ColorTag;

impl HtmlTagWriter for ColorTag {
    fn match_kind(&self, kind: NodeKind) -> bool {
        kind == NodeKind::Color
    }

    fn write(&self, ctx: &HtmlContext<'_>, id: NodeId, out: &mut String) {
        let attr = match ctx.node(id).attribute() {
            "" => DEFAULT_COLOR,
            attr => attr,
        };
        if !is_valid_color(attr) {
            write_literal(ctx, id, out);
            return;
        }

        let _ = write!(out, "<span style=\"color: {}\">", escape(attr));
        ctx.write_children(id, out);
        out.push_str("</span>");
    }
}

/// `[size=px]`. Non-numeric sizes are kept as literal markup, and a bare `[size]` renders only
/// its content.
#[derive(Copy, Clone, Debug, Default)]
pub struct SizeTag;

impl HtmlTagWriter for SizeTag {
    fn match_kind(&self, kind: NodeKind) -> bool {
        kind == NodeKind::Size
    }

    fn write(&self, ctx: &HtmlContext<'_>, id: NodeId, out: &mut String) {
        let attr = ctx.node(id).attribute();
        if attr.is_empty() {
            ctx.write_children(id, out);
            return;
        }
        let Some(size) = parse_size(attr) else {
            write_literal(ctx, id, out);
            return;
        };

        let _ = write!(out, "<span style=\"font-size: {size}px\">");
        ctx.write_children(id, out);
        out.push_str("</span>");
    }
}

/// `(bgmN)` short-code emoticons.
#[derive(Copy, Clone, Debug, Default)]
pub struct SmiliesTag;

impl HtmlTagWriter for SmiliesTag {
    fn match_kind(&self, kind: NodeKind) -> bool {
        kind == NodeKind::Smilies
    }

    fn write(&self, ctx: &HtmlContext<'_>, id: NodeId, out: &mut String) {
        let node = ctx.node(id);
        let Ok(smilies) = node.attribute().parse::<u32>() else {
            let _ = write!(out, "({}{})", escape(node.value()), escape(node.attribute()));
            return;
        };

        let size = ctx.args().display_size;
        let src = ctx.args().smilies_url(&short_code_path(smilies));
        let _ = write!(
            out,
            "<img src=\"{}\" alt=\"(bgm{smilies})\" style=\"width: {size}px; height: {size}px;\" />",
            escape(&src)
        );
    }
}

/// `(bmoC...)` compact emoticons, drawn as stacked images.
///
/// Without a manifest, or when nothing decodes, the token is shown in a placeholder.
#[derive(Copy, Clone, Debug, Default)]
pub struct BmoTag;

impl HtmlTagWriter for BmoTag {
    fn match_kind(&self, kind: NodeKind) -> bool {
        kind == NodeKind::Bmo
    }

    fn write(&self, ctx: &HtmlContext<'_>, id: NodeId, out: &mut String) {
        let token = ctx.node(id).attribute();
        let decoded = codec::decode(token, ctx.args().manifest());
        if decoded.is_empty() {
            let _ = write!(out, "<span class=\"bmo-placeholder\">({})</span>", escape(token));
            return;
        }

        let size = ctx.args().display_size;
        let _ = write!(
            out,
            "<span class=\"bmo\" title=\"({})\" style=\"display: inline-block; position: relative; width: {size}px; height: {size}px;\">",
            escape(token)
        );
        for entry in decoded.layered() {
            let _ = write!(
                out,
                "<img src=\"{}\" alt=\"\" style=\"position: absolute; left: 0; top: 0; width: 100%; height: 100%;",
                escape(&entry.src)
            );
            write_modifiers(&entry.modifiers, out);
            out.push_str("\" />");
        }
        out.push_str("</span>");
    }
}

fn write_modifiers(modifiers: &codec::Modifiers, out: &mut String) {
    let mut transform = Vec::new();
    if modifiers.x.is_some() || modifiers.y.is_some() {
        transform.push(format!(
            "translate({}px, {}px)",
            modifiers.x.unwrap_or(0),
            modifiers.y.unwrap_or(0)
        ));
    }
    if modifiers.flip_horizontal() {
        transform.push("scaleX(-1)".to_owned());
    }
    if modifiers.flip_vertical() {
        transform.push("scaleY(-1)".to_owned());
    }
    if modifiers.rotation() != 0 {
        transform.push(format!("rotate({}deg)", modifiers.rotation()));
    }
    if !transform.is_empty() {
        let _ = write!(out, " transform: {};", transform.join(" "));
    }

    if modifiers.has_colour_adjustment() {
        let _ = write!(
            out,
            " filter: hue-rotate({}deg) saturate({}%) brightness({}%);",
            modifiers.hue.unwrap_or(0),
            modifiers.saturation.unwrap_or(codec::DEFAULT_SATURATION),
            modifiers.brightness()
        );
    }
}

macro_rules! tag_list {
    ($($tag:ident),*) => {
        {
            let v: Vec<Box<dyn HtmlTagWriter>> = vec![
                $(
                    Box::new($tag::default()),
                )*
            ];

            v
        }
    };
}

/// Returns a writer for every kind of the stock vocabulary.
pub fn all_tags() -> Vec<Box<dyn HtmlTagWriter>> {
    tag_list! {
        TextTag,
        LinebreakTag,
        ParagraphStartTag,
        ParagraphEndTag,
        BoldTag,
        ItalicTag,
        UnderlineTag,
        DeleteTag,
        MaskTag,
        CenterTag,
        LeftTag,
        RightTag,
        AlignTag,
        CodeTag,
        QuoteTag,
        ListTag,
        ListItemTag,
        LinkTag,
        ImageTag,
        PhotoTag,
        SiteLinkTag,
        ColorTag,
        SizeTag,
        SmiliesTag,
        BmoTag
    }
}

/// Returns only the writers that never produce links, images or inline styles, for contexts
/// where user markup should stay visually inert. Other kinds render as their content.
pub fn text_only_tags() -> Vec<Box<dyn HtmlTagWriter>> {
    tag_list! {
        TextTag,
        LinebreakTag,
        ParagraphStartTag,
        ParagraphEndTag,
        BoldTag,
        ItalicTag,
        UnderlineTag,
        DeleteTag,
        CodeTag,
        QuoteTag,
        ListTag,
        ListItemTag
    }
}
