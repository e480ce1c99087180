use bitflags::bitflags;

use crate::emoticon::{self, COMPACT_PREFIX, SHORT_CODE_PREFIX};
use crate::error::ParseError;
use crate::tree::{Document, Node, NodeId};

use self::rules::{NodeKind, TagRegistry, TagRule};

pub mod rules;

/// Longest tag name, in scalars, accepted between brackets.
pub const TAG_NAME_MAX_LEN: usize = 8;

/// Longest emoticon token, in scalars, accepted between parentheses.
pub const EMOTICON_TOKEN_MAX_LEN: usize = 128;

const TARGET: &str = "bbdom::parser";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub feature_flags: ParserFeature,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            feature_flags: ParserFeature::EXTENDED_SMILIES | ParserFeature::COMPACT_EMOTICONS,
        }
    }
}

bitflags! {
    /// Represents a set of flags.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ParserFeature: u32 {
        /// Treat a closing tag that doesn't match the open tag, but names a kind the open tag
        /// could contain, as an error instead of silently dropping it.
        const STRICT_PAIRING = 1 << 0;

        /// Accept the short-code bands added after the first 24-125 set.
        const EXTENDED_SMILIES = 1 << 1;

        /// Recognise compact binary emoticons, `(bmoC...)`.
        const COMPACT_EMOTICONS = 1 << 2;

        /// All current and future feature flags.
        const ALL = u32::MAX;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Content,
    TagOpen,
    TagClose,
    Attribute,
    Emoticon,
}

/// Parses markup into a [`Document`].
///
/// The parser is a small state machine reading the input one scalar at a time, growing the tree
/// as it goes. `cursor` is the container currently being filled; it is unpaired until its
/// closing tag is read, at which point the cursor moves back to its parent.
#[doc(alias = "parser")]
pub struct BBParser<'a> {
    input: &'a str,
    config: ParserConfig,
    registry: &'a TagRegistry,
    loc: usize,
    doc: Document,
    cursor: NodeId,
    /// Literal text not yet committed to a node.
    pending: String,
}

impl<'a> BBParser<'a> {
    pub fn new(input: &'a str) -> BBParser<'a> {
        Self::with_config(input, ParserConfig::default())
    }

    pub fn with_config(input: &'a str, config: ParserConfig) -> BBParser<'a> {
        Self::with_registry(input, config, TagRegistry::standard())
    }

    pub fn with_registry(
        input: &'a str,
        config: ParserConfig,
        registry: &'a TagRegistry,
    ) -> BBParser<'a> {
        let doc = Document::new();
        let cursor = doc.root();
        Self {
            input,
            config,
            registry,
            loc: 0,
            doc,
            cursor,
            pending: String::new(),
        }
    }

    /// Returns all input text left to parse
    pub fn remaining(&self) -> &str {
        &self.input[self.loc..]
    }

    /// Run the state machine to the end of the input.
    ///
    /// The returned tree has not been through the
    /// [paragraph normalizer](crate::paragraph::normalize).
    pub fn parse(mut self) -> Result<Document, ParseError> {
        let mut state = State::Content;
        loop {
            log::trace!(target: TARGET, "{state:?} at byte {}", self.loc);
            state = match state {
                State::Content => match self.content()? {
                    Some(next) => next,
                    None => break,
                },
                State::TagOpen => self.tag_open()?,
                State::TagClose => self.tag_close()?,
                State::Attribute => self.attribute()?,
                State::Emoticon => self.emoticon()?,
            };
        }

        self.flush_text();
        if self.cursor != self.doc.root() {
            let context = self.error_context();
            log::debug!(target: TARGET, "input ended with an open tag: {context}");
            return Err(ParseError::UnclosedTag(context));
        }

        Ok(self.doc)
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.loc += c.len_utf8();
        Some(c)
    }

    fn rule_of(&self, kind: NodeKind) -> TagRule {
        self.registry
            .lookup_by_kind(kind)
            .copied()
            .unwrap_or(TagRule::pseudo(kind))
    }

    fn cursor_rule(&self) -> TagRule {
        self.rule_of(self.doc.kind(self.cursor))
    }

    fn cursor_paired(&self) -> bool {
        self.doc.node(self.cursor).is_paired()
    }

    fn flush_text(&mut self) {
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            self.doc.append(self.cursor, Node::text(text));
        }
    }

    fn append_node(&mut self, node: Node) -> NodeId {
        self.flush_text();
        self.doc.append(self.cursor, node)
    }

    /// Append an opening tag and make it the cursor.
    fn open(&mut self, rule: TagRule, name: String) {
        let id = self.append_node(Node::new(rule.kind, name));
        self.doc.set_paired(id, false);
        self.cursor = id;
    }

    /// Mark the cursor paired and move it to its parent.
    fn pop_cursor(&mut self) -> Result<(), ParseError> {
        self.flush_text();
        let Some(parent) = self.doc.node(self.cursor).parent() else {
            return Err(ParseError::Internal(
                "closing tag matched the document root".to_owned(),
            ));
        };
        self.doc.set_paired(self.cursor, true);
        self.cursor = parent;
        Ok(())
    }

    /// The open tag and its content so far, for error messages. Empty at the root.
    fn error_context(&mut self) -> String {
        self.flush_text();
        if self.cursor == self.doc.root() {
            String::new()
        } else {
            self.doc.reconstruct(self.cursor)
        }
    }

    /// Whether opening a `kind` tag here closes the cursor first: the cursor doesn't need an
    /// explicit closing tag, can't hold `kind`, and its parent can.
    fn implicitly_closed_by(&self, kind: NodeKind) -> bool {
        let rule = self.cursor_rule();
        if rule.closing_required || self.cursor_paired() {
            return false;
        }
        match self.doc.node(self.cursor).parent() {
            Some(parent) => self.rule_of(self.doc.kind(parent)).allows(kind),
            None => false,
        }
    }

    /// Resolve a tag name to a rule that may be opened at the cursor. `with_attribute` requires
    /// the rule to accept one.
    ///
    /// The cursor is only implicitly closed once the tag is known to open, so a failed attempt
    /// leaves the tree untouched.
    fn resolve(
        &mut self,
        name: &str,
        with_attribute: bool,
    ) -> Result<Option<TagRule>, ParseError> {
        let Some(rule) = self.registry.lookup_by_label(name).copied() else {
            return Ok(None);
        };
        if with_attribute && !rule.accepts_attribute {
            return Ok(None);
        }

        if self.cursor_rule().allows(rule.kind) {
            return Ok(Some(rule));
        }

        if self.implicitly_closed_by(rule.kind) {
            self.pop_cursor()?;
            return Ok(Some(rule));
        }

        Ok(None)
    }

    /// Emit a failed tag attempt back as text.
    fn literal(&mut self, parts: &[&str]) {
        for part in parts {
            self.pending.push_str(part);
        }
        log::debug!(target: TARGET, "kept {:?} as literal text", parts.concat());
    }

    fn content(&mut self) -> Result<Option<State>, ParseError> {
        let mut last_was_cr = false;
        while let Some(c) = self.bump() {
            if c == '\n' || c == '\r' {
                let rule = self.cursor_rule();
                if rule.allows(NodeKind::LineBreak) {
                    // \r\n, \r and \n each make exactly one break.
                    if c == '\r' || !last_was_cr {
                        self.append_node(Node::new(NodeKind::LineBreak, ""));
                    }
                    last_was_cr = c == '\r';
                } else if !rule.is_container() && rule.block_level {
                    self.pending.push(c);
                } else {
                    let context = self.error_context();
                    log::debug!(target: TARGET, "line break inside {context}");
                    return Err(ParseError::UnclosedTag(context));
                }
                continue;
            }

            last_was_cr = false;
            match c {
                '[' if self.cursor_rule().is_container() || !self.cursor_paired() => {
                    return Ok(Some(State::TagOpen));
                }
                '(' => return Ok(Some(State::Emoticon)),
                _ => self.pending.push(c),
            }
        }

        Ok(None)
    }

    fn tag_open(&mut self) -> Result<State, ParseError> {
        let mut name = String::new();
        let mut len = 0;

        while let Some(c) = self.peek() {
            if c == '\n' || c == '\r' {
                self.literal(&["[", &name]);
                return Ok(State::Content);
            }
            self.bump();

            match c {
                '/' if len == 0 => {
                    if !self.cursor_paired() {
                        return Ok(State::TagClose);
                    }
                    // A closing tag with nothing open to close.
                    self.literal(&["[/"]);
                    return Ok(State::Content);
                }
                '=' => {
                    if let Some(rule) = self.resolve(&name, true)? {
                        self.open(rule, name);
                        return Ok(State::Attribute);
                    }
                    self.literal(&["[", &name, "="]);
                    return Ok(State::Content);
                }
                ']' => {
                    if let Some(rule) = self.resolve(&name, false)? {
                        if rule.self_closing {
                            self.append_node(Node::new(rule.kind, name));
                        } else {
                            self.open(rule, name);
                        }
                        return Ok(State::Content);
                    }
                    self.literal(&["[", &name, "]"]);
                    return Ok(State::Content);
                }
                '[' => {
                    // Restart from the new bracket.
                    self.literal(&["[", &name]);
                    return Ok(State::TagOpen);
                }
                _ if len < TAG_NAME_MAX_LEN => {
                    name.push(c);
                    len += 1;
                }
                _ => {
                    let mut buf = [0; 4];
                    self.literal(&["[", &name, c.encode_utf8(&mut buf)]);
                    return Ok(State::Content);
                }
            }
        }

        let context = self.error_context();
        Err(ParseError::UnfinishedOpeningTag(format!("{context}[{name}")))
    }

    fn tag_close(&mut self) -> Result<State, ParseError> {
        let mut name = String::new();
        let mut len = 0;

        while let Some(c) = self.peek() {
            if c == '\n' || c == '\r' {
                self.literal(&["[/", &name]);
                return Ok(State::Content);
            }
            self.bump();

            match c {
                ']' => return self.close_tag(&name),
                '[' => {
                    self.literal(&["[/", &name]);
                    return Ok(State::TagOpen);
                }
                '=' => {
                    self.literal(&["[/", &name, "="]);
                    return Ok(State::Content);
                }
                _ if len < TAG_NAME_MAX_LEN => {
                    name.push(c);
                    len += 1;
                }
                _ => {
                    let mut buf = [0; 4];
                    self.literal(&["[/", &name, c.encode_utf8(&mut buf)]);
                    return Ok(State::Content);
                }
            }
        }

        let context = self.error_context();
        Err(ParseError::UnfinishedClosingTag(format!("{context}[/{name}")))
    }

    fn close_tag(&mut self, name: &str) -> Result<State, ParseError> {
        if name.is_empty() {
            self.literal(&["[/]"]);
            return Ok(State::Content);
        }

        let cursor = self.doc.node(self.cursor);
        if name.eq_ignore_ascii_case(cursor.value()) {
            self.pop_cursor()?;
            return Ok(State::Content);
        }

        // The parent's closing tag also closes a child that doesn't need its own.
        if !self.cursor_rule().closing_required {
            if let Some(parent) = cursor.parent() {
                if name.eq_ignore_ascii_case(self.doc.node(parent).value()) {
                    self.pop_cursor()?;
                    self.pop_cursor()?;
                    return Ok(State::Content);
                }
            }
        }

        if let Some(rule) = self.registry.lookup_by_label(name) {
            if self.cursor_rule().allows(rule.kind) {
                if self
                    .config
                    .feature_flags
                    .contains(ParserFeature::STRICT_PAIRING)
                {
                    let context = self.error_context();
                    return Err(ParseError::UnpairedTag(format!("{context}[/{name}]")));
                }
                log::debug!(target: TARGET, "dropped unmatched closing tag [/{name}]");
                return Ok(State::Content);
            }
        }

        self.literal(&["[/", name, "]"]);
        Ok(State::Content)
    }

    fn attribute(&mut self) -> Result<State, ParseError> {
        while let Some(c) = self.bump() {
            match c {
                ']' => {
                    if self.cursor_rule().self_closing {
                        self.pop_cursor()?;
                    }
                    return Ok(State::Content);
                }
                '\n' | '\r' => break,
                _ => self.doc.push_attribute(self.cursor, c),
            }
        }

        self.flush_text();
        let node = self.doc.node(self.cursor);
        Err(ParseError::UnfinishedAttribute(format!(
            "[{}={}",
            node.value(),
            node.attribute()
        )))
    }

    fn emoticon(&mut self) -> Result<State, ParseError> {
        let mut token = String::new();
        let mut len = 0;

        loop {
            match self.peek() {
                Some(')') => {
                    self.bump();
                    self.resolve_emoticon(&token);
                    return Ok(State::Content);
                }
                Some(c) if is_token_char(c) && len < EMOTICON_TOKEN_MAX_LEN => {
                    self.bump();
                    token.push(c);
                    len += 1;
                }
                // Anything else, including the end of input, means this was ordinary prose.
                _ => {
                    self.pending.push('(');
                    self.pending.push_str(&token);
                    return Ok(State::Content);
                }
            }
        }
    }

    fn resolve_emoticon(&mut self, token: &str) {
        let features = self.config.feature_flags;
        let node = if let Some(id) = emoticon::parse_short_code(
            token,
            features.contains(ParserFeature::EXTENDED_SMILIES),
        ) {
            Some(Node::new(NodeKind::Smilies, SHORT_CODE_PREFIX).with_attribute(id.to_string()))
        } else if features.contains(ParserFeature::COMPACT_EMOTICONS)
            && token.starts_with(COMPACT_PREFIX)
        {
            Some(Node::new(NodeKind::Bmo, "bmo").with_attribute(token))
        } else {
            None
        };

        match node {
            Some(node) if self.cursor_rule().allows(node.kind()) => {
                self.append_node(node);
            }
            _ => self.literal(&["(", token, ")"]),
        }
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests;
