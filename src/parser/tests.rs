use crate::{
    error::{ParseError, ParseErrorKind},
    parser::{
        rules::{NodeKind, TagRegistry, TagRule, STANDARD_RULES},
        ParserConfig, ParserFeature,
    },
    tree::{Document, NodeId},
    BBParser,
};

const LOREM_IPSUM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. In lorem quam, fermentum id porttitor ac, iaculis eu arcu. Aliquam vulputate tempus felis consequat elementum.";

fn parse(input: &str) -> Document {
    BBParser::new(input).parse().unwrap()
}

fn parse_err(input: &str) -> ParseError {
    BBParser::new(input).parse().unwrap_err()
}

fn child_kinds(doc: &Document, id: NodeId) -> Vec<NodeKind> {
    doc.children(id).iter().map(|c| doc.kind(*c)).collect()
}

fn nth_child(doc: &Document, id: NodeId, n: usize) -> NodeId {
    doc.children(id)[n]
}

#[test]
pub fn just_text() {
    let doc = parse(LOREM_IPSUM);
    assert_eq!(child_kinds(&doc, doc.root()), [NodeKind::Text]);
    assert_eq!(doc.text_content(doc.root()), LOREM_IPSUM);
}

#[test]
pub fn empty_input() {
    let doc = parse("");
    assert!(doc.is_empty());
}

#[test]
pub fn simple_tags() {
    let doc = parse("[b]bold[/b] and it's very cool.");
    assert_eq!(
        child_kinds(&doc, doc.root()),
        [NodeKind::Bold, NodeKind::Text]
    );

    let bold = doc.node(nth_child(&doc, doc.root(), 0));
    assert!(bold.is_paired());
    assert_eq!(bold.value(), "b");
    assert_eq!(doc.text_content(nth_child(&doc, doc.root(), 0)), "bold");
}

#[test]
pub fn tag_names_ignore_case() {
    let doc = parse("[B]x[/b]");
    let bold = doc.node(nth_child(&doc, doc.root(), 0));
    assert_eq!(bold.kind(), NodeKind::Bold);
    assert_eq!(bold.value(), "B");
    assert!(bold.is_paired());
}

#[test]
pub fn attributes_are_kept_verbatim() {
    let doc = parse("[color=Red Blue]x[/color]");
    let color = doc.node(nth_child(&doc, doc.root(), 0));
    assert_eq!(color.kind(), NodeKind::Color);
    assert_eq!(color.attribute(), "Red Blue");
}

#[test]
pub fn short_code_emoticon() {
    let doc = parse("a(bgm38)b");
    assert_eq!(
        child_kinds(&doc, doc.root()),
        [NodeKind::Text, NodeKind::Smilies, NodeKind::Text]
    );
    let smilies = doc.node(nth_child(&doc, doc.root(), 1));
    assert_eq!(smilies.value(), "bgm");
    assert_eq!(smilies.attribute(), "38");
}

#[test]
pub fn unknown_short_code_is_text() {
    let doc = parse("a(bgm999)b");
    assert_eq!(child_kinds(&doc, doc.root()), [NodeKind::Text]);
    assert_eq!(doc.text_content(doc.root()), "a(bgm999)b");
}

#[test]
pub fn short_code_bands_follow_config() {
    let doc = parse("(bgm1)");
    assert_eq!(child_kinds(&doc, doc.root()), [NodeKind::Smilies]);

    let config = ParserConfig {
        feature_flags: ParserFeature::COMPACT_EMOTICONS,
    };
    let doc = BBParser::with_config("(bgm1)(bgm24)", config)
        .parse()
        .unwrap();
    assert_eq!(
        child_kinds(&doc, doc.root()),
        [NodeKind::Text, NodeKind::Smilies]
    );
    assert_eq!(doc.text_content(doc.root()), "(bgm1)");
}

#[test]
pub fn compact_emoticon_token() {
    let doc = parse("hi (bmoCAkiCE0CATYIiNA)");
    assert_eq!(
        child_kinds(&doc, doc.root()),
        [NodeKind::Text, NodeKind::Bmo]
    );
    let bmo = doc.node(nth_child(&doc, doc.root(), 1));
    assert_eq!(bmo.attribute(), "bmoCAkiCE0CATYIiNA");

    let config = ParserConfig {
        feature_flags: ParserFeature::EXTENDED_SMILIES,
    };
    let doc = BBParser::with_config("(bmoC)", config).parse().unwrap();
    assert_eq!(doc.text_content(doc.root()), "(bmoC)");
}

#[test]
pub fn parentheses_in_prose() {
    for input in ["f(x)", "(hello world)", "()", "a (b", "(bgm38"] {
        let doc = parse(input);
        assert_eq!(child_kinds(&doc, doc.root()), [NodeKind::Text], "{input}");
        assert_eq!(doc.text_content(doc.root()), input);
    }
}

#[test]
pub fn misspelled_close_is_unclosed() {
    let err = parse_err("[quote]x[/qoute]");
    assert_eq!(err.kind(), ParseErrorKind::UnclosedTag);
    assert_eq!(err.context(), "[quote]x[/qoute]");
}

#[test]
pub fn unclosed_at_end_of_input() {
    let err = parse_err("[b]x");
    assert_eq!(err, ParseError::UnclosedTag("[b]x".to_owned()));
}

#[test]
pub fn unfinished_opening_tag() {
    let err = parse_err("abc [b");
    assert_eq!(err, ParseError::UnfinishedOpeningTag("[b".to_owned()));

    let err = parse_err("[i]abc [b");
    assert_eq!(err, ParseError::UnfinishedOpeningTag("[i]abc [b".to_owned()));
}

#[test]
pub fn unfinished_closing_tag() {
    let err = parse_err("[b]x[/b");
    assert_eq!(err, ParseError::UnfinishedClosingTag("[b]x[/b".to_owned()));
}

#[test]
pub fn unfinished_attribute() {
    let err = parse_err("[color=red");
    assert_eq!(err, ParseError::UnfinishedAttribute("[color=red".to_owned()));

    let err = parse_err("[color=red\n]x[/color]");
    assert_eq!(err.kind(), ParseErrorKind::UnfinishedAttribute);
}

#[test]
pub fn line_break_inside_link() {
    let err = parse_err("[url]a\nb[/url]");
    assert_eq!(err, ParseError::UnclosedTag("[url]a".to_owned()));
}

#[test]
pub fn line_breaks() {
    let doc = parse("a\r\nb\rc\nd");
    assert_eq!(
        child_kinds(&doc, doc.root()),
        [
            NodeKind::Text,
            NodeKind::LineBreak,
            NodeKind::Text,
            NodeKind::LineBreak,
            NodeKind::Text,
            NodeKind::LineBreak,
            NodeKind::Text,
        ]
    );

    let doc = parse("a\n\r\nb");
    assert_eq!(
        child_kinds(&doc, doc.root()),
        [
            NodeKind::Text,
            NodeKind::LineBreak,
            NodeKind::LineBreak,
            NodeKind::Text,
        ]
    );
}

#[test]
pub fn code_is_opaque() {
    let doc = parse("[code][b]x[/b]\n(bgm38)[/code]");
    let code = nth_child(&doc, doc.root(), 0);
    assert_eq!(doc.kind(code), NodeKind::Code);
    assert_eq!(child_kinds(&doc, code), [NodeKind::Text]);
    assert_eq!(doc.text_content(code), "[b]x[/b]\n(bgm38)");
}

#[test]
pub fn illegal_nesting_is_text() {
    let doc = parse("[b][quote]x[/quote][/b]");
    let bold = nth_child(&doc, doc.root(), 0);
    assert_eq!(child_kinds(&doc, bold), [NodeKind::Text]);
    assert_eq!(doc.text_content(bold), "[quote]x[/quote]");
}

#[test]
pub fn unknown_tags_are_text() {
    let doc = parse("[foo]x[/foo] [] [/b] [*]");
    assert_eq!(child_kinds(&doc, doc.root()), [NodeKind::Text]);
    assert_eq!(doc.text_content(doc.root()), "[foo]x[/foo] [] [/b] [*]");
}

#[test]
pub fn long_tag_names_are_text() {
    let doc = parse("[abcdefghij] [b]x[/abcdefghij][/b]");
    let kinds = child_kinds(&doc, doc.root());
    assert_eq!(kinds, [NodeKind::Text, NodeKind::Bold]);
    assert_eq!(doc.text_content(doc.root()), "[abcdefghij] x[/abcdefghij]");
}

#[test]
pub fn bracket_restarts_tag() {
    let doc = parse("[b][[i]x[/i][/b]");
    let bold = nth_child(&doc, doc.root(), 0);
    assert_eq!(child_kinds(&doc, bold), [NodeKind::Text, NodeKind::Italic]);
    assert_eq!(doc.node(nth_child(&doc, bold, 0)).value(), "[");
}

#[test]
pub fn list_items_close_implicitly() {
    let doc = parse("[list][*]one[*]two[/list]");
    let list = nth_child(&doc, doc.root(), 0);
    assert_eq!(child_kinds(&doc, list), [NodeKind::ListItem, NodeKind::ListItem]);
    for item in doc.children(list) {
        assert!(doc.node(*item).is_paired());
    }
    assert_eq!(doc.text_content(nth_child(&doc, list, 1)), "two");
    assert!(doc.node(list).is_paired());
}

#[test]
pub fn failed_attribute_keeps_list_item_open() {
    let doc = parse("[list][*]a[*=x]b[/list]");
    let list = nth_child(&doc, doc.root(), 0);
    assert_eq!(child_kinds(&doc, list), [NodeKind::ListItem]);
    assert_eq!(doc.text_content(nth_child(&doc, list, 0)), "a[*=x]b");
}

#[test]
pub fn mismatched_close_is_dropped() {
    let doc = parse("[b]x[/i]y[/b]");
    let bold = nth_child(&doc, doc.root(), 0);
    assert_eq!(doc.text_content(bold), "xy");
    assert!(doc.node(bold).is_paired());
}

#[test]
pub fn strict_pairing() {
    let config = ParserConfig {
        feature_flags: ParserConfig::default().feature_flags | ParserFeature::STRICT_PAIRING,
    };
    let err = BBParser::with_config("[b]x[/i]y[/b]", config)
        .parse()
        .unwrap_err();
    assert_eq!(err, ParseError::UnpairedTag("[b]x[/i]".to_owned()));
}

#[test]
pub fn custom_registry() {
    let br = TagRule {
        label: "br",
        ..TagRule::pseudo(NodeKind::LineBreak)
    };
    let rules = STANDARD_RULES
        .iter()
        .copied()
        .filter(|rule| rule.kind != NodeKind::LineBreak)
        .chain([br])
        .collect();
    let registry = TagRegistry::new(rules);

    let doc = BBParser::with_registry("a[BR]b", ParserConfig::default(), &registry)
        .parse()
        .unwrap();
    assert_eq!(
        child_kinds(&doc, doc.root()),
        [NodeKind::Text, NodeKind::LineBreak, NodeKind::Text]
    );
    assert_eq!(doc.reconstruct(doc.root()), "a[BR]b");
}

#[test]
pub fn remaining_starts_with_input() {
    let parser = BBParser::new(LOREM_IPSUM);
    assert_eq!(parser.remaining(), LOREM_IPSUM);
}

#[test]
pub fn reconstruct_round_trips() {
    for input in ["[b]x[/b] y", "[url=http://a]b[/url]", "a(bgm38)b(bmoCAk)"] {
        let doc = parse(input);
        assert_eq!(doc.reconstruct(doc.root()), input);
    }
}
