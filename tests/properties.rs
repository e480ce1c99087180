//! Property-based tests over arbitrary and generated markup.

use bbdom::{
    parse, render_plain, render_rich, validate, BBParser, Document, NodeKind, ParseErrorKind,
    RenderArgs, TagRegistry,
};
use proptest::prelude::*;

/// Strings dense in markup characters, so most inputs exercise the tag and emoticon states.
fn markup_soup() -> impl Strategy<Value = String> {
    "[\\[\\]/=()*a-z0-9 \n\r]{0,64}"
}

fn prose() -> impl Strategy<Value = String> {
    "[a-z0-9 ,.!?]{0,12}"
}

/// Well-formed nesting of inline style tags around prose.
fn styled_markup() -> impl Strategy<Value = String> {
    let leaf = prose();
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            (
                prop::sample::select(vec!["b", "i", "u", "s", "mask", "B"]),
                prop::collection::vec(inner.clone(), 0..4)
            )
                .prop_map(|(tag, parts)| format!("[{tag}]{}[/{tag}]", parts.concat())),
            (
                prop::sample::select(vec!["color=red", "size=12"]),
                prop::collection::vec(inner, 0..4)
            )
                .prop_map(|(tag, parts)| {
                    let name = &tag[..tag.find('=').unwrap_or(tag.len())];
                    format!("[{tag}]{}[/{name}]", parts.concat())
                }),
        ]
    })
}

fn check_children_allowed(doc: &Document) -> Result<(), TestCaseError> {
    let registry = TagRegistry::standard();
    for (_, node) in doc.descendants() {
        prop_assert!(node.is_paired(), "node {:?} left open", node.kind());
        if node.kind() == NodeKind::Text {
            continue;
        }
        let parent = node.parent().expect("descendants have parents");
        let rule = registry
            .lookup_by_kind(doc.kind(parent))
            .expect("parents are registered kinds");
        prop_assert!(
            rule.allows(node.kind()),
            "{:?} inside {:?}",
            node.kind(),
            rule.kind
        );
    }
    Ok(())
}

proptest! {
    /// Malformed input never panics and never trips an internal invariant.
    #[test]
    fn arbitrary_input_is_handled(input in markup_soup()) {
        match parse(&input) {
            Ok(doc) => {
                let args = RenderArgs::default();
                render_plain(&doc, &args);
                render_rich(&doc, &args);
                #[cfg(feature = "html_gen")]
                bbdom::render_html(&doc, &args);
            }
            Err(e) => prop_assert_ne!(e.kind(), ParseErrorKind::Internal),
        }
    }

    #[test]
    fn unicode_input_is_handled(input in "\\PC{0,64}") {
        if let Ok(doc) = parse(&input) {
            render_plain(&doc, &RenderArgs::default());
        }
    }

    #[test]
    fn validate_agrees_with_parse(input in markup_soup()) {
        prop_assert_eq!(validate(&input).is_ok(), parse(&input).is_ok());
    }

    /// Every node in a successful parse was closed and sits where its parent permits it.
    #[test]
    fn parsed_trees_are_well_nested(input in markup_soup()) {
        if let Ok(doc) = BBParser::new(&input).parse() {
            check_children_allowed(&doc)?;
        }
    }

    #[test]
    fn well_formed_markup_round_trips(input in styled_markup()) {
        let doc = BBParser::new(&input).parse().unwrap();
        check_children_allowed(&doc)?;
        prop_assert_eq!(doc.reconstruct(doc.root()), input);
    }

    #[test]
    fn plain_text_keeps_prose(input in styled_markup()) {
        let doc = parse(&input).unwrap();
        let expected = doc.text_content(doc.root());
        let plain = render_plain(&doc, &RenderArgs::default());
        prop_assert_eq!(plain.chars().count(), expected.chars().count());
        prop_assert_eq!(render_rich(&doc, &RenderArgs::default()).text(), expected);
    }

    /// Without brackets, parentheses or line breaks the plain target returns the input.
    #[test]
    fn plain_round_trip(input in "[^\\[\\]()\r\n]{0,48}") {
        let doc = parse(&input).unwrap();
        prop_assert_eq!(render_plain(&doc, &RenderArgs::default()), input);
    }

    #[test]
    fn paragraph_collapse(a in "[a-z]{1,8}", b in "[a-z]{1,8}", breaks in 1usize..6) {
        let doc = parse(&format!("{a}{}{b}", "\n".repeat(breaks))).unwrap();
        let kinds: Vec<_> = doc.children(doc.root()).iter().map(|id| doc.kind(*id)).collect();
        if breaks == 1 {
            prop_assert_eq!(kinds, vec![NodeKind::Text, NodeKind::LineBreak, NodeKind::Text]);
        } else {
            prop_assert_eq!(
                kinds,
                vec![NodeKind::Text, NodeKind::ParagraphEnd, NodeKind::ParagraphStart, NodeKind::Text]
            );
        }
    }
}

#[cfg(feature = "html_gen")]
proptest! {
    /// Text outside of tags reaches HTML escaped, and unescaping gives it back.
    #[test]
    fn html_text_is_escaped(input in "[^\\[(\r\n]{0,48}") {
        let doc = parse(&input).unwrap();
        let out = bbdom::render_html(&doc, &RenderArgs::default());
        prop_assert!(!out.contains(['<', '>', '"']), "{}", out);
        prop_assert_eq!(html_escape::decode_html_entities(&out).into_owned(), input);
    }

    /// Escaping the plain rendering of prose equals rendering it to HTML directly.
    #[test]
    fn escaping_plain_matches_html(input in "[^\\[\\]()\r\n]{0,48}") {
        let doc = parse(&input).unwrap();
        let args = RenderArgs::default();
        let plain = render_plain(&doc, &args);
        prop_assert_eq!(bbdom::html::escape(&plain), bbdom::render_html(&doc, &args));
    }

    /// Escaping already-safe text changes nothing.
    #[test]
    fn escape_is_identity_on_safe_text(input in "[a-zA-Z0-9 .,!?]{0,48}") {
        prop_assert_eq!(bbdom::html::escape(&input), input.as_str());
    }
}
