//! Decoder for compact emoticon tokens.
//!
//! A token is `bmoC` followed by base64url without padding. The bytes are a sequence of entries,
//! each an unsigned varint holding `compact_id << 7 | flags`, followed by one field per set flag
//! in flag order. `tf` is an unsigned varint, `h l s x y` are zigzag varints, and `extra` is a
//! varint length and that many bytes of a UTF-8 JSON object.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{EmoticonManifest, COMPACT_PREFIX};

const TARGET: &str = "bbdom::emoticon";

const FLAG_TF: u32 = 1;
const FLAG_H: u32 = 2;
const FLAG_L: u32 = 4;
const FLAG_S: u32 = 8;
const FLAG_X: u32 = 16;
const FLAG_Y: u32 = 32;
const FLAG_EXTRA: u32 = 64;

/// Longest accepted varint, in bytes.
pub const MAX_VARINT_LEN: usize = 5;

/// Lightness assumed when an entry doesn't set one.
pub const DEFAULT_LIGHTNESS: i32 = 50;
/// Saturation assumed when an entry doesn't set one.
pub const DEFAULT_SATURATION: i32 = 100;

/// Per-entry adjustments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifiers {
    /// Bit 0 flips horizontally, bit 1 vertically, bits 2-3 rotate in quarter turns.
    pub transform: Option<u32>,
    pub hue: Option<i32>,
    pub lightness: Option<i32>,
    pub saturation: Option<i32>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    /// Keys of the extension object that aren't one of the fields above.
    pub extra: Map<String, Value>,
}

impl Modifiers {
    pub fn flip_horizontal(&self) -> bool {
        self.transform.map_or(false, |tf| tf & 1 != 0)
    }

    pub fn flip_vertical(&self) -> bool {
        self.transform.map_or(false, |tf| tf & 2 != 0)
    }

    /// Clockwise rotation in degrees, a multiple of 90.
    pub fn rotation(&self) -> u32 {
        self.transform.map_or(0, |tf| ((tf >> 2) & 3) * 90)
    }

    /// Whether any colour adjustment differs from the defaults.
    pub fn has_colour_adjustment(&self) -> bool {
        self.hue.unwrap_or(0) != 0
            || self.lightness.unwrap_or(DEFAULT_LIGHTNESS) != DEFAULT_LIGHTNESS
            || self.saturation.unwrap_or(DEFAULT_SATURATION) != DEFAULT_SATURATION
    }

    /// CSS brightness in percent. Lightness is clamped to `0..=100`, so the default gives 100%.
    pub fn brightness(&self) -> i32 {
        self.lightness.unwrap_or(DEFAULT_LIGHTNESS).clamp(0, 100) * 2
    }

    fn merge_extra(&mut self, object: Map<String, Value>) {
        for (key, value) in object {
            let int = value.as_i64().and_then(|v| i32::try_from(v).ok());
            match (key.as_str(), int) {
                ("tf", Some(v)) => self.transform = u32::try_from(v).ok().map(|v| v & 63),
                ("h", Some(v)) => self.hue = Some(v),
                ("l", Some(v)) => self.lightness = Some(v),
                ("s", Some(v)) => self.saturation = Some(v),
                ("x", Some(v)) => self.x = Some(v),
                ("y", Some(v)) => self.y = Some(v),
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
    }
}

/// One resolved part of a compact emoticon.
#[derive(Debug, Clone, PartialEq)]
pub struct BmoEntry {
    pub id: String,
    pub src: String,
    pub layer: i32,
    /// Position among the resolved entries.
    pub order: usize,
    /// Id of the manifest category the part came from.
    pub category: String,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BmoDecoded {
    /// The token as written, for fallback display.
    pub raw: String,
    pub entries: Vec<BmoEntry>,
}

impl BmoDecoded {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in drawing order, lowest layer first. Equal layers keep their encoded order.
    pub fn layered(&self) -> Vec<&BmoEntry> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by_key(|entry| entry.layer);
        entries
    }
}

struct VarReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> VarReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn has_more(&self) -> bool {
        self.offset < self.bytes.len()
    }

    fn read_uvarint(&mut self) -> Option<u32> {
        let mut result = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let byte = *self.bytes.get(self.offset)?;
            self.offset += 1;
            result |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return u32::try_from(result).ok();
            }
        }
        None
    }

    fn read_varint(&mut self) -> Option<i32> {
        self.read_uvarint().map(zigzag)
    }

    fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(len)?;
        let bytes = self.bytes.get(self.offset..end)?;
        self.offset = end;
        Some(bytes)
    }
}

fn zigzag(v: u32) -> i32 {
    ((v >> 1) as i32) ^ -((v & 1) as i32)
}

fn decode_payload(payload: &str) -> Option<Vec<u8>> {
    let mut b64: String = payload
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    while b64.len() % 4 != 0 {
        b64.push('=');
    }

    STANDARD.decode(b64).ok()
}

/// Read the fields selected by `flags`. `None` if the stream ends first.
fn read_modifiers(reader: &mut VarReader<'_>, flags: u32) -> Option<Modifiers> {
    let mut modifiers = Modifiers::default();

    if flags & FLAG_TF != 0 {
        modifiers.transform = Some(reader.read_uvarint()? & 63);
    }
    if flags & FLAG_H != 0 {
        modifiers.hue = Some(reader.read_varint()?);
    }
    if flags & FLAG_L != 0 {
        modifiers.lightness = Some(reader.read_varint()?);
    }
    if flags & FLAG_S != 0 {
        modifiers.saturation = Some(reader.read_varint()?);
    }
    if flags & FLAG_X != 0 {
        modifiers.x = Some(reader.read_varint()?);
    }
    if flags & FLAG_Y != 0 {
        modifiers.y = Some(reader.read_varint()?);
    }
    if flags & FLAG_EXTRA != 0 {
        let len = usize::try_from(reader.read_uvarint()?).ok()?;
        let blob = reader.read_bytes(len)?;
        // A malformed extension is ignored; it doesn't desynchronise the stream.
        match std::str::from_utf8(blob)
            .ok()
            .and_then(|s| serde_json::from_str::<Value>(s).ok())
        {
            Some(Value::Object(object)) => modifiers.merge_extra(object),
            _ => log::debug!(target: TARGET, "ignored malformed extension of {len} bytes"),
        }
    }

    Some(modifiers)
}

/// Decode a compact token such as `bmoCAkiCE0CATYIiNA`.
///
/// Never fails. A bad payload gives no entries, a truncated stream keeps the entries completed
/// before the truncation, and ids the manifest doesn't know are skipped. Without a manifest
/// nothing resolves.
pub fn decode(token: &str, manifest: Option<&EmoticonManifest>) -> BmoDecoded {
    let mut decoded = BmoDecoded {
        raw: token.to_owned(),
        entries: Vec::new(),
    };

    let Some(payload) = token.strip_prefix(COMPACT_PREFIX) else {
        return decoded;
    };
    let bytes = match decode_payload(payload) {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => {
            log::debug!(target: TARGET, "{token}: payload is not base64url");
            return decoded;
        }
    };

    let mut reader = VarReader::new(&bytes);
    while reader.has_more() {
        let Some(combined) = reader.read_uvarint() else {
            log::debug!(target: TARGET, "{token}: truncated entry header");
            break;
        };
        let compact_id = combined >> 7;
        let flags = combined & 0x7f;

        let Some(modifiers) = read_modifiers(&mut reader, flags) else {
            log::debug!(target: TARGET, "{token}: truncated fields of id {compact_id}");
            break;
        };

        match manifest.and_then(|m| m.get(compact_id)) {
            Some((category, item)) => decoded.entries.push(BmoEntry {
                id: item.id.clone(),
                src: item.src.clone(),
                layer: item.layer,
                order: decoded.entries.len(),
                category: category.id.clone(),
                modifiers,
            }),
            None => log::debug!(target: TARGET, "{token}: skipped unknown id {compact_id}"),
        }
    }

    decoded
}
