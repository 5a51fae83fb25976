//! Font encodings and glyph widths for PDF text extraction.

use std::collections::BTreeMap;

use encoding_rs::WINDOWS_1251;
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use tracing::{debug, trace};

/// Glyph width in thousandths of text space for fonts without metrics.
pub(super) const DEFAULT_GLYPH_WIDTH: f32 = 500.0;
/// `DW` when a composite font omits it.
const DEFAULT_CID_WIDTH: f32 = 1000.0;
/// Upper bound on one `W` range, guarding against absurd entries.
const MAX_WIDTH_RANGE: i64 = 0xFFFF;

/// One shown glyph, for advance computation.
pub(super) struct Glyph {
    /// Width in thousandths of text space.
    pub width: f32,
    /// Single-byte code 32, which word spacing applies to.
    pub is_space: bool,
}

/// How string operands of a font turn into text.
enum Decoder {
    /// `ToUnicode` CMap parsed by lopdf.
    Cmap(Encoding<'static>),
    /// One character per byte code.
    Table(Vec<Option<char>>),
    /// No usable encoding information.
    Guess,
}

struct Metrics {
    widths: BTreeMap<u32, f32>,
    default: f32,
}

impl Metrics {
    fn width(&self, code: u32) -> f32 {
        self.widths.get(&code).copied().unwrap_or(self.default)
    }
}

/// Text decoding and glyph widths of one page font.
pub(super) struct PdfFont {
    decoder: Decoder,
    metrics: Option<Metrics>,
    composite: bool,
}

impl PdfFont {
    pub(super) fn load(doc: &Document, font: &Dictionary) -> Self {
        let composite = matches!(font.get(b"Subtype").and_then(Object::as_name), Ok(b"Type0"));
        let decoder = to_unicode(doc, font)
            .or_else(|| declared_encoding(doc, font))
            .unwrap_or(Decoder::Guess);
        let metrics = if composite {
            Some(composite_metrics(doc, font))
        } else {
            simple_metrics(doc, font)
        };

        Self {
            decoder,
            metrics,
            composite,
        }
    }

    /// Decode the bytes of a string operand.
    pub(super) fn decode(&self, bytes: &[u8]) -> String {
        match &self.decoder {
            Decoder::Cmap(encoding) => match Document::decode_text(encoding, bytes) {
                Ok(text) => text,
                Err(e) => {
                    trace!("ToUnicode decoding failed ({}); guessing", e);
                    decode_pdf_string(bytes)
                }
            },
            Decoder::Table(table) => bytes.iter().filter_map(|&b| table[usize::from(b)]).collect(),
            Decoder::Guess => decode_pdf_string(bytes),
        }
    }

    /// Glyphs shown by `bytes`, whose decoded form is `text`.
    ///
    /// Without widths every decoded character counts as one default glyph.
    pub(super) fn glyphs(&self, bytes: &[u8], text: &str) -> Vec<Glyph> {
        let Some(metrics) = &self.metrics else {
            return fallback_glyphs(text);
        };

        if self.composite {
            bytes
                .chunks(2)
                .map(|pair| Glyph {
                    width: metrics.width(pair.iter().fold(0, |code, &b| code << 8 | u32::from(b))),
                    is_space: false,
                })
                .collect()
        } else {
            bytes
                .iter()
                .map(|&b| Glyph {
                    width: metrics.width(u32::from(b)),
                    is_space: b == b' ',
                })
                .collect()
        }
    }
}

/// Glyphs for text shown without a known font.
pub(super) fn fallback_glyphs(text: &str) -> Vec<Glyph> {
    text.chars()
        .map(|c| Glyph {
            width: DEFAULT_GLYPH_WIDTH,
            is_space: c == ' ',
        })
        .collect()
}

/// Fonts of a page by resource name.
pub(super) fn page_fonts(doc: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, PdfFont> {
    match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts
            .into_iter()
            .map(|(name, font)| (name, PdfFont::load(doc, font)))
            .collect(),
        Err(e) => {
            debug!("No fonts for page {:?}: {}", page_id, e);
            BTreeMap::new()
        }
    }
}

/// Copy of `font` that lopdf resolves through the given encoding name.
fn encoding_view(font: &Dictionary, name: &[u8]) -> Dictionary {
    let mut view = font.clone();
    view.set("Type", Object::Name(b"Font".to_vec()));
    view.set("Encoding", Object::Name(name.to_vec()));
    view
}

fn to_unicode(doc: &Document, font: &Dictionary) -> Option<Decoder> {
    font.get(b"ToUnicode").ok()?;

    // lopdf consults ToUnicode for the Identity encodings.
    let view = encoding_view(font, b"Identity-H");
    match view.get_font_encoding(doc) {
        Ok(Encoding::UnicodeMapEncoding(cmap)) => Some(Decoder::Cmap(Encoding::UnicodeMapEncoding(cmap))),
        Ok(_) => None,
        Err(e) => {
            debug!("Ignoring unreadable ToUnicode map: {}", e);
            None
        }
    }
}

fn declared_encoding(doc: &Document, font: &Dictionary) -> Option<Decoder> {
    match font.get_deref(b"Encoding", doc).ok()? {
        Object::Name(name) => named_table(doc, font, name).map(Decoder::Table),
        Object::Dictionary(encoding) => Some(Decoder::Table(differences_table(doc, font, encoding))),
        _ => None,
    }
}

/// Byte table of a named single-byte encoding known to lopdf.
fn named_table(doc: &Document, font: &Dictionary, name: &[u8]) -> Option<Vec<Option<char>>> {
    let view = encoding_view(font, name);
    let encoding = view.get_font_encoding(doc).ok()?;
    if !matches!(encoding, Encoding::OneByteEncoding(_)) {
        debug!("Unsupported font encoding {}", String::from_utf8_lossy(name));
        return None;
    }

    Some(
        (0..=255u8)
            .map(|b| encoding.bytes_to_string(&[b]).ok().and_then(|s| s.chars().next()))
            .collect(),
    )
}

/// Byte table of an encoding dictionary: `BaseEncoding` overlaid with `Differences`.
fn differences_table(doc: &Document, font: &Dictionary, encoding: &Dictionary) -> Vec<Option<char>> {
    let mut table = encoding
        .get(b"BaseEncoding")
        .and_then(Object::as_name)
        .ok()
        .and_then(|name| named_table(doc, font, name))
        .unwrap_or_else(guess_table);

    let Ok(differences) = encoding.get_deref(b"Differences", doc).and_then(Object::as_array) else {
        return table;
    };

    let mut code = 0usize;
    for item in differences {
        match item {
            Object::Integer(next) => code = usize::try_from(*next).unwrap_or(usize::MAX),
            Object::Name(glyph) => {
                if let (Some(slot), Some(ch)) = (table.get_mut(code), glyph_char(glyph)) {
                    *slot = Some(ch);
                }
                code = code.saturating_add(1);
            }
            _ => {}
        }
    }
    table
}

fn guess_table() -> Vec<Option<char>> {
    (0..=255u8)
        .map(|b| decode_pdf_string(&[b]).chars().next())
        .collect()
}

const GLYPH_NAMES: &[(&str, char)] = &[
    ("space", ' '),
    ("exclam", '!'),
    ("quotedbl", '"'),
    ("numbersign", '#'),
    ("dollar", '$'),
    ("percent", '%'),
    ("ampersand", '&'),
    ("quotesingle", '\''),
    ("parenleft", '('),
    ("parenright", ')'),
    ("asterisk", '*'),
    ("plus", '+'),
    ("comma", ','),
    ("hyphen", '-'),
    ("period", '.'),
    ("slash", '/'),
    ("zero", '0'),
    ("one", '1'),
    ("two", '2'),
    ("three", '3'),
    ("four", '4'),
    ("five", '5'),
    ("six", '6'),
    ("seven", '7'),
    ("eight", '8'),
    ("nine", '9'),
    ("colon", ':'),
    ("semicolon", ';'),
    ("less", '<'),
    ("equal", '='),
    ("greater", '>'),
    ("question", '?'),
    ("at", '@'),
    ("bracketleft", '['),
    ("backslash", '\\'),
    ("bracketright", ']'),
    ("underscore", '_'),
    ("braceleft", '{'),
    ("bar", '|'),
    ("braceright", '}'),
    ("endash", '\u{2013}'),
    ("emdash", '\u{2014}'),
    ("quotedblleft", '\u{201C}'),
    ("quotedblright", '\u{201D}'),
    ("guillemotleft", '\u{00AB}'),
    ("guillemotright", '\u{00BB}'),
    ("ellipsis", '\u{2026}'),
];

/// Character named by a glyph name from a `Differences` array.
fn glyph_char(name: &[u8]) -> Option<char> {
    let name = std::str::from_utf8(name).ok()?;
    let base = name.split('.').next().unwrap_or(name);

    if let Some(hex) = base.strip_prefix("uni") {
        if hex.len() == 4 {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
        }
    }
    if let Some(hex) = base.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
        }
    }
    if let Some(number) = base.strip_prefix("afii") {
        return number.parse().ok().and_then(afii_char);
    }

    let mut chars = base.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Some(c);
        }
    }

    GLYPH_NAMES
        .iter()
        .find(|(glyph, _)| *glyph == base)
        .map(|(_, c)| *c)
}

/// Cyrillic letters and the numero sign under their Adobe `afii` names.
fn afii_char(number: u32) -> Option<char> {
    let code = match number {
        10017..=10022 => 0x0410 + (number - 10017),
        10023 => 0x0401,
        10024..=10049 => 0x0416 + (number - 10024),
        10065..=10070 => 0x0430 + (number - 10065),
        10071 => 0x0451,
        10072..=10097 => 0x0436 + (number - 10072),
        61352 => 0x2116,
        _ => return None,
    };
    char::from_u32(code)
}

fn simple_metrics(doc: &Document, font: &Dictionary) -> Option<Metrics> {
    let widths = font.get_deref(b"Widths", doc).and_then(Object::as_array).ok()?;
    let first_char = font
        .get(b"FirstChar")
        .and_then(Object::as_i64)
        .ok()
        .and_then(|c| u32::try_from(c).ok())
        .unwrap_or(0);
    let default = font
        .get_deref(b"FontDescriptor", doc)
        .and_then(Object::as_dict)
        .and_then(|d| d.get(b"MissingWidth"))
        .ok()
        .and_then(number)
        .unwrap_or(DEFAULT_GLYPH_WIDTH);

    let widths = widths
        .iter()
        .zip(first_char..)
        .filter_map(|(width, code)| deref_number(doc, width).map(|w| (code, w)))
        .collect();

    Some(Metrics { widths, default })
}

/// `DW` and `W` of the descendant font of a `Type0` font.
fn composite_metrics(doc: &Document, font: &Dictionary) -> Metrics {
    let descendant = font
        .get_deref(b"DescendantFonts", doc)
        .and_then(Object::as_array)
        .ok()
        .and_then(|fonts| fonts.first())
        .and_then(|f| doc.dereference(f).ok())
        .and_then(|(_, f)| f.as_dict().ok());

    let Some(descendant) = descendant else {
        return Metrics {
            widths: BTreeMap::new(),
            default: DEFAULT_CID_WIDTH,
        };
    };

    let default = descendant
        .get(b"DW")
        .ok()
        .and_then(number)
        .unwrap_or(DEFAULT_CID_WIDTH);
    let mut widths = BTreeMap::new();

    if let Ok(entries) = descendant.get_deref(b"W", doc).and_then(Object::as_array) {
        let mut i = 0;
        while let Some(first) = entries.get(i).and_then(|o| o.as_i64().ok()) {
            match (entries.get(i + 1), entries.get(i + 2)) {
                (Some(Object::Array(list)), _) => {
                    for (code, width) in (first..).zip(list) {
                        if let (Ok(code), Some(width)) = (u32::try_from(code), deref_number(doc, width)) {
                            widths.insert(code, width);
                        }
                    }
                    i += 2;
                }
                (Some(last), Some(width)) => {
                    let (Ok(last), Some(width)) = (last.as_i64(), deref_number(doc, width)) else {
                        break;
                    };
                    for code in first..=last.min(first + MAX_WIDTH_RANGE) {
                        if let Ok(code) = u32::try_from(code) {
                            widths.insert(code, width);
                        }
                    }
                    i += 3;
                }
                _ => break,
            }
        }
    }

    Metrics { widths, default }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn deref_number(doc: &Document, object: &Object) -> Option<f32> {
    doc.dereference(object).ok().and_then(|(_, o)| number(o))
}

/// Decode bytes with no font encoding: UTF-16BE with BOM, else UTF-8, else Windows-1251.
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, rest @ ..] = bytes {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => WINDOWS_1251.decode_without_bom_handling(bytes).0.into_owned(),
    }
}
