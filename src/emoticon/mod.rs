//! Emoticons: the `(bgmNN)` short codes and the compact `(bmoC...)` form.
//!
//! Short codes map straight to an image through a band table. Compact emoticons are composed
//! from layered parts listed in an [`EmoticonManifest`], see [`codec`].

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::error::ManifestError;

pub mod codec;

#[cfg(test)]
mod tests;

/// Prefix of a short-code token, `bgm38`.
pub const SHORT_CODE_PREFIX: &str = "bgm";

/// Prefix of a compact emoticon token, `bmoC...`.
pub const COMPACT_PREFIX: &str = "bmoC";

/// Whether a short-code id falls inside an accepted band.
///
/// 24-125 is the first set. The legacy band 1-23 and the extension bands 200-238 and
/// 500-529 are only accepted when `extended` is set.
pub fn is_accepted(id: u32, extended: bool) -> bool {
    match id {
        24..=125 => true,
        1..=23 | 200..=238 | 500..=529 => extended,
        _ => false,
    }
}

/// Parse a `bgm` + digits token into its id, if it names an accepted emoticon.
pub fn parse_short_code(token: &str, extended: bool) -> Option<u32> {
    let digits = token.strip_prefix(SHORT_CODE_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let id = digits.parse().ok()?;
    is_accepted(id, extended).then_some(id)
}

/// Image path of a short code, relative to the smilies directory of the media host.
pub fn short_code_path(id: u32) -> String {
    match id {
        1..=23 => format!("bgm/{id:02}.gif"),
        24..=125 => format!("tv/{:02}.gif", id - 23),
        200..=238 => format!("tv_vs/bgm_{id}.png"),
        500..=529 => format!("tv_500/bgm_{id}.gif"),
        _ => format!("bgm{id}.gif"),
    }
}

/// One drawable part of a compact emoticon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub alias: Option<String>,
    pub src: String,
    /// Stacking order, lowest drawn first.
    pub layer: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// The layout of a manifest file.
#[derive(Deserialize)]
struct ManifestFile {
    face: Category,
    mouth: Category,
    eyes: Category,
    accessories: Category,
    others: Category,
}

/// Ordered categories of emoticon parts.
///
/// The position of an item across all categories, in declaration order, is its compact id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmoticonManifest {
    categories: Vec<Category>,
}

impl EmoticonManifest {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Load a manifest file, an object with `face`, `mouth`, `eyes`, `accessories` and `others`
    /// categories. Compact ids follow that order.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let file: ManifestFile = serde_json::from_str(json)?;
        let manifest = Self::new(vec![
            file.face,
            file.mouth,
            file.eyes,
            file.accessories,
            file.others,
        ]);
        log::debug!(
            target: "bbdom::emoticon",
            "loaded emoticon manifest with {} items",
            manifest.len()
        );
        Ok(manifest)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Total number of items.
    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a compact id to its item and the category holding it.
    pub fn get(&self, compact_id: u32) -> Option<(&Category, &Item)> {
        let index = usize::try_from(compact_id).ok()?;
        self.categories
            .iter()
            .flat_map(|category| category.items.iter().map(move |item| (category, item)))
            .nth(index)
    }
}

/// A manifest slot that is filled at most once, even under concurrent first use.
///
/// Hosts usually keep one in a `static` and hand the loaded manifest to
/// [`RenderArgs::with_manifest`](crate::RenderArgs::with_manifest).
#[derive(Debug, Default)]
pub struct ManifestCell {
    cell: OnceCell<Arc<EmoticonManifest>>,
}

impl ManifestCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// The loaded manifest, running `load` if nothing has been loaded yet. A failed load leaves
    /// the cell empty so a later call can try again.
    pub fn get_or_try_init<F>(&self, load: F) -> Result<Arc<EmoticonManifest>, ManifestError>
    where
        F: FnOnce() -> Result<EmoticonManifest, ManifestError>,
    {
        self.cell
            .get_or_try_init(|| load().map(Arc::new))
            .map(Arc::clone)
    }

    pub fn get(&self) -> Option<Arc<EmoticonManifest>> {
        self.cell.get().cloned()
    }
}
