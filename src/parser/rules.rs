//! The tag registry: one immutable [`TagRule`] per node kind, governing which tags may nest where
//! and which accept an attribute.

use bitflags::bitflags;
use once_cell::sync::Lazy;

/// The closed set of categories a document node can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Root,
    Text,
    LineBreak,
    ParagraphStart,
    ParagraphEnd,
    Quote,
    Code,
    Url,
    Image,
    Photo,
    Subject,
    User,
    Center,
    Left,
    Right,
    Align,
    List,
    ListItem,
    Bold,
    Italic,
    Underline,
    Delete,
    Color,
    Size,
    Mask,
    /// Short-code emoticon, `(bgmNN)`.
    Smilies,
    /// Compact binary emoticon, `(bmoC...)`.
    Bmo,
}

bitflags! {
    /// A set of [`NodeKind`]s, used for the permitted children of a container.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KindSet: u32 {
        const ROOT = 1 << 0;
        const TEXT = 1 << 1;
        const LINE_BREAK = 1 << 2;
        const PARAGRAPH_START = 1 << 3;
        const PARAGRAPH_END = 1 << 4;
        const QUOTE = 1 << 5;
        const CODE = 1 << 6;
        const URL = 1 << 7;
        const IMAGE = 1 << 8;
        const PHOTO = 1 << 9;
        const SUBJECT = 1 << 10;
        const USER = 1 << 11;
        const CENTER = 1 << 12;
        const LEFT = 1 << 13;
        const RIGHT = 1 << 14;
        const ALIGN = 1 << 15;
        const LIST = 1 << 16;
        const LIST_ITEM = 1 << 17;
        const BOLD = 1 << 18;
        const ITALIC = 1 << 19;
        const UNDERLINE = 1 << 20;
        const DELETE = 1 << 21;
        const COLOR = 1 << 22;
        const SIZE = 1 << 23;
        const MASK = 1 << 24;
        const SMILIES = 1 << 25;
        const BMO = 1 << 26;

        /// Character-level styling.
        const STYLES = Self::BOLD.bits()
            | Self::ITALIC.bits()
            | Self::UNDERLINE.bits()
            | Self::DELETE.bits()
            | Self::COLOR.bits()
            | Self::SIZE.bits()
            | Self::MASK.bits();
        const EMOTICONS = Self::SMILIES.bits() | Self::BMO.bits();
        /// Content of a link: no line breaks, no nested links.
        const LINK_CONTENT = Self::STYLES.bits()
            | Self::EMOTICONS.bits()
            | Self::IMAGE.bits()
            | Self::PHOTO.bits();
        /// Content of an inline container.
        const INLINE = Self::LINK_CONTENT.bits()
            | Self::LINE_BREAK.bits()
            | Self::URL.bits()
            | Self::SUBJECT.bits()
            | Self::USER.bits();
        /// Content of a block container.
        const BLOCK = Self::INLINE.bits()
            | Self::QUOTE.bits()
            | Self::CODE.bits()
            | Self::CENTER.bits()
            | Self::LEFT.bits()
            | Self::RIGHT.bits()
            | Self::ALIGN.bits()
            | Self::LIST.bits();
        const LIST_CONTENT = Self::LIST_ITEM.bits() | Self::LINE_BREAK.bits();
    }
}

impl NodeKind {
    /// The single-member [`KindSet`] for this kind.
    pub const fn bit(self) -> KindSet {
        match self {
            NodeKind::Root => KindSet::ROOT,
            NodeKind::Text => KindSet::TEXT,
            NodeKind::LineBreak => KindSet::LINE_BREAK,
            NodeKind::ParagraphStart => KindSet::PARAGRAPH_START,
            NodeKind::ParagraphEnd => KindSet::PARAGRAPH_END,
            NodeKind::Quote => KindSet::QUOTE,
            NodeKind::Code => KindSet::CODE,
            NodeKind::Url => KindSet::URL,
            NodeKind::Image => KindSet::IMAGE,
            NodeKind::Photo => KindSet::PHOTO,
            NodeKind::Subject => KindSet::SUBJECT,
            NodeKind::User => KindSet::USER,
            NodeKind::Center => KindSet::CENTER,
            NodeKind::Left => KindSet::LEFT,
            NodeKind::Right => KindSet::RIGHT,
            NodeKind::Align => KindSet::ALIGN,
            NodeKind::List => KindSet::LIST,
            NodeKind::ListItem => KindSet::LIST_ITEM,
            NodeKind::Bold => KindSet::BOLD,
            NodeKind::Italic => KindSet::ITALIC,
            NodeKind::Underline => KindSet::UNDERLINE,
            NodeKind::Delete => KindSet::DELETE,
            NodeKind::Color => KindSet::COLOR,
            NodeKind::Size => KindSet::SIZE,
            NodeKind::Mask => KindSet::MASK,
            NodeKind::Smilies => KindSet::SMILIES,
            NodeKind::Bmo => KindSet::BMO,
        }
    }
}

/// Parsing rules for one node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRule {
    /// Tag name as written between brackets. Empty for pseudo-kinds that never come from a tag.
    pub label: &'static str,
    pub kind: NodeKind,
    /// Whether the tag must be closed explicitly. Tags that don't are closed implicitly by a
    /// sibling of the same kind or by the closing tag of their parent.
    pub closing_required: bool,
    pub self_closing: bool,
    /// `None` marks opaque content: everything inside is literal text, nothing is checked.
    pub allowed_children: Option<KindSet>,
    pub accepts_attribute: bool,
    pub block_level: bool,
}

impl TagRule {
    /// A leaf rule with no label, for kinds produced by the parser itself.
    pub const fn pseudo(kind: NodeKind) -> Self {
        Self {
            label: "",
            kind,
            closing_required: false,
            self_closing: true,
            allowed_children: None,
            accepts_attribute: false,
            block_level: false,
        }
    }

    const fn tag(label: &'static str, kind: NodeKind, allowed_children: Option<KindSet>) -> Self {
        Self {
            label,
            kind,
            closing_required: true,
            self_closing: false,
            allowed_children,
            accepts_attribute: false,
            block_level: false,
        }
    }

    const fn with_attribute(mut self) -> Self {
        self.accepts_attribute = true;
        self
    }

    const fn block(mut self) -> Self {
        self.block_level = true;
        self
    }

    /// Whether a node of `kind` may be placed directly inside this one.
    pub fn allows(&self, kind: NodeKind) -> bool {
        self.allowed_children
            .map_or(false, |set| set.contains(kind.bit()))
    }

    pub fn is_container(&self) -> bool {
        self.allowed_children.is_some()
    }
}

/// The rules of the stock vocabulary.
pub const STANDARD_RULES: &[TagRule] = &[
    TagRule {
        allowed_children: Some(KindSet::BLOCK),
        block_level: true,
        self_closing: false,
        ..TagRule::pseudo(NodeKind::Root)
    },
    TagRule::pseudo(NodeKind::Text),
    TagRule::pseudo(NodeKind::LineBreak),
    TagRule::pseudo(NodeKind::ParagraphStart),
    TagRule::pseudo(NodeKind::ParagraphEnd),
    TagRule {
        accepts_attribute: true,
        ..TagRule::pseudo(NodeKind::Smilies)
    },
    TagRule {
        accepts_attribute: true,
        ..TagRule::pseudo(NodeKind::Bmo)
    },
    TagRule::tag("quote", NodeKind::Quote, Some(KindSet::BLOCK)).block(),
    TagRule::tag("code", NodeKind::Code, None).block(),
    TagRule::tag("url", NodeKind::Url, Some(KindSet::LINK_CONTENT)).with_attribute(),
    TagRule::tag("img", NodeKind::Image, None).with_attribute(),
    TagRule::tag("photo", NodeKind::Photo, None).with_attribute(),
    TagRule::tag("subject", NodeKind::Subject, None).with_attribute(),
    TagRule::tag("user", NodeKind::User, None).with_attribute(),
    TagRule::tag("center", NodeKind::Center, Some(KindSet::BLOCK)).block(),
    TagRule::tag("left", NodeKind::Left, Some(KindSet::BLOCK)).block(),
    TagRule::tag("right", NodeKind::Right, Some(KindSet::BLOCK)).block(),
    TagRule::tag("align", NodeKind::Align, Some(KindSet::BLOCK))
        .with_attribute()
        .block(),
    TagRule::tag("list", NodeKind::List, Some(KindSet::LIST_CONTENT))
        .with_attribute()
        .block(),
    TagRule {
        closing_required: false,
        ..TagRule::tag("*", NodeKind::ListItem, Some(KindSet::BLOCK)).block()
    },
    TagRule::tag("b", NodeKind::Bold, Some(KindSet::INLINE)),
    TagRule::tag("i", NodeKind::Italic, Some(KindSet::INLINE)),
    TagRule::tag("u", NodeKind::Underline, Some(KindSet::INLINE)),
    TagRule::tag("s", NodeKind::Delete, Some(KindSet::INLINE)),
    TagRule::tag("color", NodeKind::Color, Some(KindSet::INLINE)).with_attribute(),
    TagRule::tag("size", NodeKind::Size, Some(KindSet::INLINE)).with_attribute(),
    TagRule::tag("mask", NodeKind::Mask, Some(KindSet::INLINE)),
];

static STANDARD: Lazy<TagRegistry> = Lazy::new(|| TagRegistry::new(STANDARD_RULES.to_vec()));

/// Lookup table over a fixed set of [`TagRule`]s. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct TagRegistry {
    /// Sorted longest label first.
    rules: Vec<TagRule>,
}

impl TagRegistry {
    /// Build a registry. Labels and kinds are expected to be unique; this is not checked.
    pub fn new(mut rules: Vec<TagRule>) -> Self {
        rules.sort_by(|a, b| b.label.len().cmp(&a.label.len()));
        Self { rules }
    }

    /// The shared registry for the stock vocabulary.
    pub fn standard() -> &'static TagRegistry {
        &STANDARD
    }

    /// Find the rule for a tag name, ignoring ASCII case. Pseudo-kinds are never matched.
    pub fn lookup_by_label(&self, text: &str) -> Option<&TagRule> {
        if text.is_empty() {
            return None;
        }

        self.rules
            .iter()
            .find(|rule| rule.label.eq_ignore_ascii_case(text))
    }

    pub fn lookup_by_kind(&self, kind: NodeKind) -> Option<&TagRule> {
        self.rules.iter().find(|rule| rule.kind == kind)
    }

    /// Whether `kind` is block level. Kinds without a rule are inline.
    pub fn is_block(&self, kind: NodeKind) -> bool {
        self.lookup_by_kind(kind).map_or(false, |rule| rule.block_level)
    }

    pub fn rules(&self) -> &[TagRule] {
        &self.rules
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::standard().clone()
    }
}
