//! Render arguments and the attribute checks shared by every render target.

use std::sync::Arc;

use serde::Deserialize;
use url::Url;

use crate::emoticon::EmoticonManifest;

const TARGET: &str = "bbdom::render";

/// Largest width or height honoured in an image dimension attribute.
pub const MAX_IMAGE_DIMENSION: u32 = 4096;

/// Colour of a `[color]` tag written without an attribute.
pub const DEFAULT_COLOR: &str = "black";

/// Colour names accepted by `[color=...]` besides hexadecimal values.
pub const NAMED_COLORS: &[&str] = &[
    "black", "green", "silver", "gray", "olive", "white", "yellow", "orange", "maroon", "navy",
    "red", "blue", "purple", "teal", "fuchsia", "aqua", "violet", "pink", "lime", "magenta",
    "brown",
];

/// Options shared by the render targets. Every key is optional.
///
/// Deserializes from a JSON-like map with camelCase keys. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderArgs {
    /// Scheme given to links written without one.
    #[serde(alias = "current_scheme")]
    pub default_scheme: String,
    /// Host given to links written without one. Without it such links are not linked.
    #[serde(alias = "host")]
    pub default_host: Option<String>,
    /// Pixel size of emoticons.
    #[serde(alias = "textSize")]
    pub display_size: u32,
    /// Base of `[subject]` and `[user]` links.
    pub site_url: String,
    /// Base of `[photo]` images and short-code emoticons.
    pub media_url: String,
    #[serde(skip)]
    pub manifest: Option<Arc<EmoticonManifest>>,
}

impl Default for RenderArgs {
    fn default() -> Self {
        Self {
            default_scheme: "https".to_owned(),
            default_host: None,
            display_size: 16,
            site_url: "https://bgm.tv".to_owned(),
            media_url: "https://lain.bgm.tv".to_owned(),
            manifest: None,
        }
    }
}

impl RenderArgs {
    /// Build arguments from loose string pairs, as passed by a host application.
    ///
    /// Unknown keys are ignored. A value that doesn't parse keeps the default.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut args = Self::default();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "defaultScheme" | "default_scheme" | "current_scheme" => {
                    if value.is_empty() {
                        log::warn!(target: TARGET, "ignoring empty {key}");
                    } else {
                        args.default_scheme = value.to_owned();
                    }
                }
                "defaultHost" | "default_host" | "host" => {
                    args.default_host = (!value.is_empty()).then(|| value.to_owned());
                }
                "displaySize" | "display_size" | "textSize" => match value.trim().parse() {
                    Ok(size) => args.display_size = size,
                    Err(e) => log::warn!(target: TARGET, "ignoring {key}={value:?}: {e}"),
                },
                "siteUrl" | "site_url" => args.site_url = value.trim_end_matches('/').to_owned(),
                "mediaUrl" | "media_url" => {
                    args.media_url = value.trim_end_matches('/').to_owned()
                }
                _ => {}
            }
        }
        args
    }

    pub fn with_manifest(mut self, manifest: Arc<EmoticonManifest>) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn manifest(&self) -> Option<&EmoticonManifest> {
        self.manifest.as_deref()
    }

    /// Turn link text into an absolute URL, or `None` if it can't be linked.
    ///
    /// Absolute URLs are kept as written, as long as they have a host and an `http`, `https` or
    /// [`default_scheme`](Self::default_scheme) scheme. Scheme-relative URLs get
    /// [`default_scheme`](Self::default_scheme); other relative URLs are resolved against
    /// [`default_host`](Self::default_host).
    pub fn complete_url(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        match Url::parse(raw) {
            Ok(url) if url.has_host() && self.is_linkable_scheme(url.scheme()) => {
                return Some(raw.to_owned())
            }
            Ok(url) => {
                log::debug!(target: TARGET, "not a link: {raw:?}: {} URL", url.scheme());
                return None;
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => {}
            Err(e) => {
                log::debug!(target: TARGET, "not a link: {raw:?}: {e}");
                return None;
            }
        }

        if raw.starts_with("//") {
            let candidate = format!("{}:{raw}", self.default_scheme);
            return Url::parse(&candidate)
                .ok()
                .filter(Url::has_host)
                .map(|_| candidate);
        }

        let host = self.default_host.as_deref()?;
        let base = Url::parse(&format!("{}://{host}/", self.default_scheme)).ok()?;
        base.join(raw).ok().map(String::from)
    }

    fn is_linkable_scheme(&self, scheme: &str) -> bool {
        matches!(scheme, "http" | "https") || scheme.eq_ignore_ascii_case(&self.default_scheme)
    }

    pub(crate) fn subject_url(&self, id: &str) -> String {
        format!("{}/subject/{id}", self.site_url)
    }

    pub(crate) fn user_url(&self, id: &str) -> String {
        format!("{}/user/{id}", self.site_url)
    }

    pub(crate) fn photo_url(&self, path: &str) -> String {
        format!("{}/pic/photo/l/{path}", self.media_url)
    }

    pub(crate) fn smilies_url(&self, path: &str) -> String {
        format!("{}/img/smiles/{path}", self.media_url)
    }
}

/// Whether `attr` is a named colour or a 3 or 6 digit hex colour, `#` optional.
pub fn is_valid_color(attr: &str) -> bool {
    if NAMED_COLORS
        .iter()
        .any(|name| name.eq_ignore_ascii_case(attr))
    {
        return true;
    }

    let hex = attr.strip_prefix('#').unwrap_or(attr);
    matches!(hex.len(), 3 | 6) && hex.bytes().all(|b| b.is_ascii_hexdigit())
}

/// The font size in a `[size=...]` attribute.
pub fn parse_size(attr: &str) -> Option<i32> {
    attr.trim().parse().ok()
}

/// `width,height` from an image attribute, if both are within `1..=4096`.
pub fn image_dimensions(attr: &str) -> Option<(u32, u32)> {
    let (width, height) = attr.split_once(',')?;
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .ok()
            .filter(|v| (1..=MAX_IMAGE_DIMENSION).contains(v))
    };
    Some((parse(width)?, parse(height)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = RenderArgs::default();
        assert_eq!(args.default_scheme, "https");
        assert_eq!(args.default_host, None);
        assert_eq!(args.display_size, 16);
    }

    #[test]
    fn from_pairs_ignores_unknown_and_bad_values() {
        let args = RenderArgs::from_pairs([
            ("host", "chii.in"),
            ("textSize", "huge"),
            ("unknown", "x"),
            ("current_scheme", "http"),
        ]);
        assert_eq!(args.default_host.as_deref(), Some("chii.in"));
        assert_eq!(args.display_size, 16);
        assert_eq!(args.default_scheme, "http");

        let args = RenderArgs::from_pairs([("displaySize", " 24 ")]);
        assert_eq!(args.display_size, 24);
    }

    #[test]
    fn deserialize() {
        let args: RenderArgs =
            serde_json::from_str(r#"{"defaultHost": "bgm.tv", "textSize": 20, "extra": true}"#)
                .unwrap();
        assert_eq!(args.default_host.as_deref(), Some("bgm.tv"));
        assert_eq!(args.display_size, 20);
        assert_eq!(args.media_url, "https://lain.bgm.tv");
    }

    #[test]
    fn complete_url() {
        let args = RenderArgs::default();
        assert_eq!(
            args.complete_url("https://chii.in").as_deref(),
            Some("https://chii.in")
        );
        assert_eq!(
            args.complete_url("//chii.in/x").as_deref(),
            Some("https://chii.in/x")
        );
        assert_eq!(args.complete_url("subject/12"), None);
        assert_eq!(args.complete_url("javascript:alert(1)"), None);
        assert_eq!(args.complete_url("javascript://x%0aalert(1)"), None);
        assert_eq!(args.complete_url("data://x/y"), None);
        assert_eq!(
            args.complete_url("HTTP://chii.in").as_deref(),
            Some("HTTP://chii.in")
        );
        assert_eq!(args.complete_url(""), None);

        let args = RenderArgs::from_pairs([("host", "bgm.tv")]);
        assert_eq!(
            args.complete_url("/subject/12").as_deref(),
            Some("https://bgm.tv/subject/12")
        );
    }

    #[test]
    fn colors() {
        for valid in ["red", "RED", "#fff", "abcdef", "#A0B0C0"] {
            assert!(is_valid_color(valid), "{valid}");
        }
        for invalid in ["", "notacolor", "#ffff", "ggg", "#", "red;"] {
            assert!(!is_valid_color(invalid), "{invalid}");
        }
    }

    #[test]
    fn sizes_and_dimensions() {
        assert_eq!(parse_size("14"), Some(14));
        assert_eq!(parse_size(""), None);
        assert_eq!(parse_size("big"), None);

        assert_eq!(image_dimensions("200,100"), Some((200, 100)));
        assert_eq!(image_dimensions("0,100"), None);
        assert_eq!(image_dimensions("5000,100"), None);
        assert_eq!(image_dimensions("cover"), None);
        assert_eq!(image_dimensions("1,2,3"), None);
    }
}
