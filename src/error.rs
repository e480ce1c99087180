use std::fmt;

/// The category of a [`ParseError`], without its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    Internal,
    UnfinishedOpeningTag,
    UnfinishedClosingTag,
    UnfinishedAttribute,
    UnpairedTag,
    UnclosedTag,
}

/// A structural failure that aborts a parse.
///
/// Each variant carries a best-effort reconstruction of the offending region of the input (not
/// the whole input), meant to be shown to the author of the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An invariant of the parser was violated.
    Internal(String),
    /// Input ended inside an opening tag name.
    UnfinishedOpeningTag(String),
    /// Input ended inside a closing tag name.
    UnfinishedClosingTag(String),
    /// A line break or the end of input was reached inside an attribute value.
    UnfinishedAttribute(String),
    /// A closing tag did not match the open tag. Only raised with
    /// [`ParserFeature::STRICT_PAIRING`](crate::ParserFeature::STRICT_PAIRING).
    UnpairedTag(String),
    /// A tag was still open at a line break it cannot contain, or at the end of input.
    UnclosedTag(String),
}

impl ParseError {
    pub fn kind(&self) -> ParseErrorKind {
        match self {
            ParseError::Internal(_) => ParseErrorKind::Internal,
            ParseError::UnfinishedOpeningTag(_) => ParseErrorKind::UnfinishedOpeningTag,
            ParseError::UnfinishedClosingTag(_) => ParseErrorKind::UnfinishedClosingTag,
            ParseError::UnfinishedAttribute(_) => ParseErrorKind::UnfinishedAttribute,
            ParseError::UnpairedTag(_) => ParseErrorKind::UnpairedTag,
            ParseError::UnclosedTag(_) => ParseErrorKind::UnclosedTag,
        }
    }

    /// The reconstructed markup around the failure.
    pub fn context(&self) -> &str {
        match self {
            ParseError::Internal(ctx)
            | ParseError::UnfinishedOpeningTag(ctx)
            | ParseError::UnfinishedClosingTag(ctx)
            | ParseError::UnfinishedAttribute(ctx)
            | ParseError::UnpairedTag(ctx)
            | ParseError::UnclosedTag(ctx) => ctx,
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParseErrorKind::Internal => "internal parser error",
            ParseErrorKind::UnfinishedOpeningTag => "unfinished opening tag",
            ParseErrorKind::UnfinishedClosingTag => "unfinished closing tag",
            ParseErrorKind::UnfinishedAttribute => "unfinished attribute",
            ParseErrorKind::UnpairedTag => "unpaired tag",
            ParseErrorKind::UnclosedTag => "unclosed tag",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.context())
    }
}

impl std::error::Error for ParseError {}

/// Failure to load an [`EmoticonManifest`](crate::EmoticonManifest).
#[derive(Debug)]
pub enum ManifestError {
    Json(serde_json::Error),
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Json(e) => write!(f, "invalid emoticon manifest: {e}"),
        }
    }
}

impl std::error::Error for ManifestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManifestError::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for ManifestError {
    fn from(e: serde_json::Error) -> Self {
        ManifestError::Json(e)
    }
}
