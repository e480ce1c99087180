//! Semantic rich text, for hosts that lay out documents with their own widgets.
//!
//! Rendering produces a [`RichText`] value that only says *what* the content is: runs of styled
//! text, emoticons, and blocks such as quotes and lists. Turning that into views is left to the
//! host.

use serde::Serialize;

use crate::{
    args::{
        image_dimensions, is_valid_color, parse_size, RenderArgs, DEFAULT_COLOR, NAMED_COLORS,
    },
    emoticon::{codec, codec::Modifiers, short_code_path},
    parser::rules::NodeKind,
    tree::{Document, NodeId},
};


/// The result of rendering a node, from simplest to most structured.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "camelCase")]
pub enum RichText {
    /// Unstyled text.
    Plain(String),
    /// Inline content with at least one styled run or emoticon.
    Styled(Vec<Inline>),
    /// Block content.
    Layout(Vec<Block>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub masked: bool,
    pub color: Option<TextColor>,
    /// Font size in pixels.
    pub size: Option<i32>,
    /// Target of the link the run belongs to.
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TextColor {
    /// A lowercase colour name.
    Named(String),
    Rgb(u8, u8, u8),
}

impl TextColor {
    /// Parse a `[color=...]` attribute.
    pub fn parse(attr: &str) -> Option<TextColor> {
        if !is_valid_color(attr) {
            return None;
        }
        if NAMED_COLORS.iter().any(|name| name.eq_ignore_ascii_case(attr)) {
            return Some(TextColor::Named(attr.to_ascii_lowercase()));
        }

        let hex = attr.strip_prefix('#').unwrap_or(attr);
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()?;
        match digits.as_slice() {
            [r, g, b] => Some(TextColor::Rgb(r * 17, g * 17, b * 17)),
            [r1, r0, g1, g0, b1, b0] => Some(TextColor::Rgb(
                r1 * 16 + r0,
                g1 * 16 + g0,
                b1 * 16 + b0,
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inline {
    Text { text: String, style: Style },
    Emoticon(Emoticon),
}

/// An emoticon drawn inline, as one or more stacked images.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Emoticon {
    /// The emoticon as written, for accessibility and copy.
    pub alt: String,
    /// Bottom layer first.
    pub layers: Vec<EmoticonLayer>,
    /// Pixel size.
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmoticonLayer {
    pub src: String,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Text {
        content: Vec<Inline>,
    },
    Aligned {
        alignment: Alignment,
        content: Vec<Block>,
    },
    Quote {
        content: Vec<Block>,
    },
    Code {
        text: String,
    },
    List {
        ordered: bool,
        items: Vec<Vec<Block>>,
    },
    Image {
        url: String,
        dimensions: Option<(u32, u32)>,
        alt: Option<String>,
    },
}

impl RichText {
    pub fn empty() -> Self {
        RichText::Plain(String::new())
    }

    /// The visible text, without styling. Blocks are separated by line breaks.
    pub fn text(&self) -> String {
        let mut out = String::new();
        match self {
            RichText::Plain(s) => out.push_str(s),
            RichText::Styled(inlines) => inline_text(inlines, &mut out),
            RichText::Layout(blocks) => blocks_text(blocks, &mut out),
        }
        out
    }

    fn into_blocks(self) -> Vec<Block> {
        match self {
            RichText::Plain(s) if s.is_empty() => Vec::new(),
            RichText::Plain(text) => vec![Block::Text {
                content: vec![Inline::Text {
                    text,
                    style: Style::default(),
                }],
            }],
            RichText::Styled(content) => vec![Block::Text { content }],
            RichText::Layout(blocks) => blocks,
        }
    }

    fn styled(self, apply: &dyn Fn(&mut Style)) -> RichText {
        match self {
            RichText::Plain(text) => {
                let mut style = Style::default();
                apply(&mut style);
                RichText::Styled(vec![Inline::Text { text, style }])
            }
            RichText::Styled(inlines) => RichText::Styled(style_inlines(inlines, apply)),
            RichText::Layout(blocks) => RichText::Layout(style_blocks(blocks, apply)),
        }
    }
}

fn inline_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text { text, .. } => out.push_str(text),
            Inline::Emoticon(emoticon) => out.push_str(&emoticon.alt),
        }
    }
}

fn blocks_text(blocks: &[Block], out: &mut String) {
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match block {
            Block::Text { content } => inline_text(content, out),
            Block::Aligned { content, .. } | Block::Quote { content } => blocks_text(content, out),
            Block::Code { text } => out.push_str(text),
            Block::List { items, .. } => {
                for (j, item) in items.iter().enumerate() {
                    if j > 0 {
                        out.push('\n');
                    }
                    blocks_text(item, out);
                }
            }
            Block::Image { alt, .. } => out.push_str(alt.as_deref().unwrap_or_default()),
        }
    }
}

fn style_inlines(inlines: Vec<Inline>, apply: &dyn Fn(&mut Style)) -> Vec<Inline> {
    inlines
        .into_iter()
        .map(|inline| match inline {
            Inline::Text { text, mut style } => {
                apply(&mut style);
                Inline::Text { text, style }
            }
            emoticon => emoticon,
        })
        .collect()
}

fn style_blocks(blocks: Vec<Block>, apply: &dyn Fn(&mut Style)) -> Vec<Block> {
    blocks
        .into_iter()
        .map(|block| match block {
            Block::Text { content } => Block::Text {
                content: style_inlines(content, apply),
            },
            Block::Aligned { alignment, content } => Block::Aligned {
                alignment,
                content: style_blocks(content, apply),
            },
            Block::Quote { content } => Block::Quote {
                content: style_blocks(content, apply),
            },
            Block::List { ordered, items } => Block::List {
                ordered,
                items: items
                    .into_iter()
                    .map(|item| style_blocks(item, apply))
                    .collect(),
            },
            other => other,
        })
        .collect()
}

/// Left-to-right aggregation of sibling renders.
#[derive(Default)]
struct Aggregate {
    blocks: Vec<Block>,
    inlines: Vec<Inline>,
    styled: bool,
    layout: bool,
}

impl Aggregate {
    fn push_inline(&mut self, inline: Inline) {
        if let (
            Some(Inline::Text { text, style }),
            Inline::Text {
                text: next,
                style: next_style,
            },
        ) = (self.inlines.last_mut(), &inline)
        {
            if style == next_style {
                text.push_str(next);
                return;
            }
        }
        self.inlines.push(inline);
    }

    fn flush(&mut self) {
        if !self.inlines.is_empty() {
            self.blocks.push(Block::Text {
                content: std::mem::take(&mut self.inlines),
            });
        }
    }

    fn push(&mut self, part: RichText) {
        match part {
            RichText::Plain(text) if text.is_empty() => {}
            RichText::Plain(text) => self.push_inline(Inline::Text {
                text,
                style: Style::default(),
            }),
            RichText::Styled(inlines) => {
                self.styled = true;
                for inline in inlines {
                    self.push_inline(inline);
                }
            }
            RichText::Layout(blocks) => {
                self.layout = true;
                self.flush();
                self.blocks.extend(blocks);
            }
        }
    }

    fn finish(mut self) -> RichText {
        if self.layout {
            self.flush();
            return RichText::Layout(self.blocks);
        }
        if self.styled {
            return RichText::Styled(self.inlines);
        }

        let mut text = String::new();
        inline_text(&self.inlines, &mut text);
        RichText::Plain(text)
    }
}

struct Renderer<'a> {
    doc: &'a Document,
    args: &'a RenderArgs,
}

/// Render `doc` as [`RichText`].
pub fn render(doc: &Document, args: &RenderArgs) -> RichText {
    Renderer { doc, args }.node(doc.root())
}

impl<'a> Renderer<'a> {
    fn children(&self, id: NodeId) -> RichText {
        let mut aggregate = Aggregate::default();
        for child in self.doc.children(id) {
            aggregate.push(self.node(*child));
        }
        aggregate.finish()
    }

    fn block_children(&self, id: NodeId) -> Vec<Block> {
        self.children(id).into_blocks()
    }

    fn linked(&self, content: RichText, href: Option<String>) -> RichText {
        match href {
            Some(href) => {
                content.styled(&move |style: &mut Style| style.link = Some(href.clone()))
            }
            None => content,
        }
    }

    fn image(&self, raw: &str, url: Option<String>, attr: &str) -> RichText {
        let Some(url) = url else {
            return RichText::Plain(raw.to_owned());
        };
        let dimensions = image_dimensions(attr);
        let alt = (dimensions.is_none() && !attr.is_empty()).then(|| attr.to_owned());
        RichText::Layout(vec![Block::Image {
            url,
            dimensions,
            alt,
        }])
    }

    fn aligned(&self, id: NodeId, alignment: Alignment) -> RichText {
        RichText::Layout(vec![Block::Aligned {
            alignment,
            content: self.block_children(id),
        }])
    }

    fn node(&self, id: NodeId) -> RichText {
        let node = self.doc.node(id);
        let attr = node.attribute();
        let args = self.args;

        match node.kind() {
            NodeKind::Text => RichText::Plain(node.value().to_owned()),
            NodeKind::LineBreak => RichText::Plain("\n".to_owned()),
            NodeKind::ParagraphStart | NodeKind::ParagraphEnd => RichText::empty(),
            NodeKind::Root | NodeKind::ListItem => self.children(id),

            NodeKind::Bold => self.children(id).styled(&|s: &mut Style| s.bold = true),
            NodeKind::Italic => self.children(id).styled(&|s: &mut Style| s.italic = true),
            NodeKind::Underline => {
                self.children(id).styled(&|s: &mut Style| s.underline = true)
            }
            NodeKind::Delete => {
                self.children(id).styled(&|s: &mut Style| s.strikethrough = true)
            }
            NodeKind::Mask => self.children(id).styled(&|s: &mut Style| s.masked = true),
            NodeKind::Color => match TextColor::parse(match attr {
                "" => DEFAULT_COLOR,
                attr => attr,
            }) {
                Some(color) => self
                    .children(id)
                    .styled(&move |s: &mut Style| s.color = Some(color.clone())),
                None => self.children(id),
            },
            NodeKind::Size => match parse_size(attr) {
                Some(size) => self
                    .children(id)
                    .styled(&move |s: &mut Style| s.size = Some(size)),
                None => self.children(id),
            },

            NodeKind::Url => {
                if attr.is_empty() {
                    if !self.doc.children(id).iter().all(|c| self.doc.kind(*c) == NodeKind::Text)
                    {
                        return self.children(id);
                    }
                    let raw = self.doc.text_content(id);
                    let href = args.complete_url(&raw);
                    self.linked(RichText::Plain(raw), href)
                } else {
                    self.linked(self.children(id), args.complete_url(attr))
                }
            }
            NodeKind::Subject | NodeKind::User => {
                if attr.is_empty() {
                    return self.children(id);
                }
                let (href, content) = if node.kind() == NodeKind::User {
                    let mut aggregate = Aggregate::default();
                    aggregate.push(RichText::Plain("@".to_owned()));
                    aggregate.push(self.children(id));
                    (args.user_url(attr), aggregate.finish())
                } else {
                    (args.subject_url(attr), self.children(id))
                };
                self.linked(content, args.complete_url(&href))
            }

            NodeKind::Center => self.aligned(id, Alignment::Center),
            NodeKind::Left => self.aligned(id, Alignment::Left),
            NodeKind::Right => self.aligned(id, Alignment::Right),
            NodeKind::Align => match attr.to_ascii_lowercase().as_str() {
                "left" => self.aligned(id, Alignment::Left),
                "center" => self.aligned(id, Alignment::Center),
                "right" => self.aligned(id, Alignment::Right),
                _ => self.children(id),
            },
            NodeKind::Quote => RichText::Layout(vec![Block::Quote {
                content: self.block_children(id),
            }]),
            NodeKind::Code => RichText::Layout(vec![Block::Code {
                text: self.doc.text_content(id),
            }]),
            NodeKind::List => {
                let items = self
                    .doc
                    .children(id)
                    .iter()
                    .filter(|c| self.doc.kind(**c) == NodeKind::ListItem)
                    .map(|c| self.block_children(*c))
                    .collect();
                RichText::Layout(vec![Block::List {
                    ordered: !attr.is_empty(),
                    items,
                }])
            }

            NodeKind::Image => {
                let raw = self.doc.text_content(id);
                self.image(&raw, args.complete_url(&raw), attr)
            }
            NodeKind::Photo => {
                let raw = self.doc.text_content(id);
                self.image(&raw, args.complete_url(&args.photo_url(&raw)), attr)
            }

            NodeKind::Smilies => {
                let alt = format!("({}{attr})", node.value());
                let Ok(smilies) = attr.parse::<u32>() else {
                    return RichText::Plain(alt);
                };
                RichText::Styled(vec![Inline::Emoticon(Emoticon {
                    alt,
                    layers: vec![EmoticonLayer {
                        src: args.smilies_url(&short_code_path(smilies)),
                        modifiers: Modifiers::default(),
                    }],
                    size: args.display_size,
                })])
            }
            NodeKind::Bmo => {
                let alt = format!("({attr})");
                let decoded = codec::decode(attr, args.manifest());
                if decoded.is_empty() {
                    return RichText::Plain(alt);
                }
                let layers = decoded
                    .layered()
                    .into_iter()
                    .map(|entry| EmoticonLayer {
                        src: entry.src.clone(),
                        modifiers: entry.modifiers.clone(),
                    })
                    .collect();
                RichText::Styled(vec![Inline::Emoticon(Emoticon {
                    alt,
                    layers,
                    size: args.display_size,
                })])
            }
        }
    }
}
