//! BBCode parser that builds a validated document tree, with HTML, plain text and rich text
//! renderers.
//!
//! ```
//! let doc = bbdom::parse("[b]hello[/b] (bgm38)").unwrap();
//! let args = bbdom::RenderArgs::default();
//! assert_eq!(bbdom::render_plain(&doc, &args), "hello ");
//! ```
//!
//! For control over parsing, such as strict tag pairing, build a [`BBParser`] directly.

use static_assertions::assert_impl_all;

pub mod args;
pub mod emoticon;
pub mod error;
#[cfg(feature = "html_gen")]
pub mod html;
pub mod paragraph;
pub mod parser;
pub mod plain;
pub mod rich;
pub mod tree;

pub use args::RenderArgs;
pub use emoticon::{EmoticonManifest, ManifestCell};
pub use error::{ManifestError, ParseError, ParseErrorKind};
pub use parser::{
    rules::{NodeKind, TagRegistry, TagRule},
    BBParser, ParserConfig, ParserFeature,
};
pub use rich::RichText;
pub use tree::{Document, Node, NodeId};

assert_impl_all!(TagRegistry: Send, Sync);
assert_impl_all!(EmoticonManifest: Send, Sync);
assert_impl_all!(Document: Send, Sync);

/// Parse `input` with the default configuration and normalize its paragraphs.
pub fn parse(input: &str) -> Result<Document, ParseError> {
    let mut doc = BBParser::new(input).parse()?;
    paragraph::normalize(&mut doc, TagRegistry::standard());
    Ok(doc)
}

/// Check that `input` parses, without keeping the tree.
pub fn validate(input: &str) -> Result<(), ParseError> {
    BBParser::new(input).parse().map(|_| ())
}

#[cfg(feature = "html_gen")]
pub fn render_html(doc: &Document, args: &RenderArgs) -> String {
    html::HtmlSerializer::standard().serialize(doc, args)
}

pub fn render_plain(doc: &Document, args: &RenderArgs) -> String {
    plain::render(doc, args)
}

pub fn render_rich(doc: &Document, args: &RenderArgs) -> RichText {
    rich::render(doc, args)
}
