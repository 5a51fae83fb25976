//! Text spans with approximate geometry from PDF content streams.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::font::{Glyph, PdfFont, decode_pdf_string, fallback_glyphs, page_fonts};
use crate::error::StructureError;
use crate::models::document::{PdfDocument, PdfPage, TextSpan};
use crate::models::field::BoundingBox;

/// US Letter, used when no `MediaBox` is found.
const DEFAULT_PAGE_HEIGHT: f32 = 792.0;
const DEFAULT_FONT_SIZE: f32 = 12.0;
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

/// Reads one text span per show operator, page by page.
///
/// Strings are decoded through the font's `ToUnicode` map or declared
/// encoding, and advance by the font's `Widths` (`W` for composite fonts).
/// Fonts without widths advance every glyph by half the font size.
/// Coordinates are top-down: `y0` is the top edge.
pub struct PdfSpanReader;

impl PdfSpanReader {
    pub fn read_bytes(data: &[u8]) -> Result<PdfDocument, StructureError> {
        let mut doc = Document::load_mem(data).map_err(|e| StructureError::Pdf(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(StructureError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        Self::read_document(&doc)
    }

    /// Read spans from an already loaded document.
    pub fn read_document(doc: &Document) -> Result<PdfDocument, StructureError> {
        let page_ids = doc.get_pages();
        if page_ids.is_empty() {
            return Err(StructureError::NoPages);
        }

        let mut pages = Vec::with_capacity(page_ids.len());
        for (number, page_id) in page_ids {
            let spans = match page_spans(doc, page_id) {
                Ok(spans) => spans,
                Err(e) => {
                    warn!("Skipping content of page {}: {}", number, e);
                    Vec::new()
                }
            };
            debug!("PDF page {}: {} spans", number, spans.len());
            pages.push(PdfPage { spans });
        }

        Ok(PdfDocument { pages })
    }
}

fn page_spans(doc: &Document, page_id: ObjectId) -> Result<Vec<TextSpan>, StructureError> {
    let (bottom, top) = page_vertical_extent(doc, page_id);
    let data = doc
        .get_page_content(page_id)
        .map_err(|e| StructureError::Pdf(e.to_string()))?;
    let content = Content::decode(&data).map_err(|e| StructureError::Pdf(e.to_string()))?;

    let fonts = page_fonts(doc, page_id);
    let mut state = TextState::new(top - bottom, bottom, &fonts);
    let mut spans = Vec::new();
    for op in &content.operations {
        if let Some(span) = state.apply(op) {
            spans.push(span);
        }
    }
    Ok(spans)
}

/// `(lly, ury)` of the page's `MediaBox`, following `Parent` links.
fn page_vertical_extent(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let mut dict = doc.get_dictionary(page_id).ok();
    // Bounded: malformed page trees can contain cycles.
    for _ in 0..32 {
        let Some(d) = dict else { break };
        if let Some(extent) = media_box(doc, d) {
            return extent;
        }
        dict = d
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .ok();
    }
    (0.0, DEFAULT_PAGE_HEIGHT)
}

fn media_box(doc: &Document, dict: &Dictionary) -> Option<(f32, f32)> {
    let object = dict.get(b"MediaBox").ok()?;
    let object = match object {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let values: Vec<f32> = object.as_array().ok()?.iter().filter_map(number).collect();
    match values.as_slice() {
        [_, lly, _, ury] if ury > lly => Some((*lly, *ury)),
        _ => None,
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Text state between `BT` and `ET`.
struct TextState<'f> {
    page_height: f32,
    page_bottom: f32,
    fonts: &'f BTreeMap<Vec<u8>, PdfFont>,
    font: Option<&'f PdfFont>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    leading: f32,
    horizontal_scale: f32,
    matrix: Matrix,
    line_matrix: Matrix,
}

impl<'f> TextState<'f> {
    fn new(page_height: f32, page_bottom: f32, fonts: &'f BTreeMap<Vec<u8>, PdfFont>) -> Self {
        Self {
            page_height,
            page_bottom,
            fonts,
            font: None,
            font_size: DEFAULT_FONT_SIZE,
            char_spacing: 0.0,
            word_spacing: 0.0,
            leading: 0.0,
            horizontal_scale: 1.0,
            matrix: IDENTITY,
            line_matrix: IDENTITY,
        }
    }

    /// Apply one operation, returning a span for show operators.
    fn apply(&mut self, op: &Operation) -> Option<TextSpan> {
        let operand = |i: usize| op.operands.get(i).and_then(number);

        match op.operator.as_str() {
            "BT" => {
                self.matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) {
                    self.font = self.fonts.get(name);
                    if self.font.is_none() {
                        trace!("Unknown font resource {}", String::from_utf8_lossy(name));
                    }
                }
                if let Some(size) = operand(1) {
                    self.font_size = size;
                }
            }
            "Tc" => {
                if let Some(spacing) = operand(0) {
                    self.char_spacing = spacing;
                }
            }
            "Tw" => {
                if let Some(spacing) = operand(0) {
                    self.word_spacing = spacing;
                }
            }
            "TL" => {
                if let Some(leading) = operand(0) {
                    self.leading = leading;
                }
            }
            "Tz" => {
                if let Some(scale) = operand(0) {
                    self.horizontal_scale = scale / 100.0;
                }
            }
            "Tm" => {
                let values: Vec<f32> = op.operands.iter().filter_map(number).collect();
                if let [a, b, c, d, e, f] = values.as_slice() {
                    self.line_matrix = [*a, *b, *c, *d, *e, *f];
                    self.matrix = self.line_matrix;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (operand(0), operand(1)) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (operand(0), operand(1)) {
                    self.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "T*" => self.next_line(),
            "Tj" => return self.show(op.operands.first()),
            "'" => {
                self.next_line();
                return self.show(op.operands.first());
            }
            "\"" => {
                if let (Some(word), Some(character)) = (operand(0), operand(1)) {
                    self.word_spacing = word;
                    self.char_spacing = character;
                }
                self.next_line();
                return self.show(op.operands.get(2));
            }
            "TJ" => {
                let items = op.operands.first().and_then(|o| o.as_array().ok())?;
                return self.show_array(items);
            }
            _ => {}
        }
        None
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line_matrix;
        self.line_matrix = [a, b, c, d, e + tx * a + ty * c, f + tx * b + ty * d];
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, operand: Option<&Object>) -> Option<TextSpan> {
        let Some(Object::String(bytes, _)) = operand else {
            return None;
        };
        let text = self.decode(bytes);
        let advance = self.string_advance(bytes, &text);
        self.span(text, advance)
    }

    fn show_array(&mut self, items: &[Object]) -> Option<TextSpan> {
        let mut text = String::new();
        let mut advance = 0.0;
        for item in items {
            match item {
                Object::String(bytes, _) => {
                    let part = self.decode(bytes);
                    advance += self.string_advance(bytes, &part);
                    text.push_str(&part);
                }
                other => {
                    // Adjustments are in thousandths of text space, subtracted.
                    if let Some(adjust) = number(other) {
                        advance -= adjust / 1000.0 * self.font_size * self.horizontal_scale;
                    }
                }
            }
        }
        self.span(text, advance)
    }

    fn decode(&self, bytes: &[u8]) -> String {
        match self.font {
            Some(font) => font.decode(bytes),
            None => decode_pdf_string(bytes),
        }
    }

    /// Horizontal displacement of a shown string, in unscaled text space.
    fn string_advance(&self, bytes: &[u8], text: &str) -> f32 {
        let glyphs = match self.font {
            Some(font) => font.glyphs(bytes, text),
            None => fallback_glyphs(text),
        };
        glyphs.iter().map(|glyph| self.glyph_advance(glyph)).sum()
    }

    fn glyph_advance(&self, glyph: &Glyph) -> f32 {
        let mut advance = glyph.width / 1000.0 * self.font_size + self.char_spacing;
        if glyph.is_space {
            advance += self.word_spacing;
        }
        advance * self.horizontal_scale
    }

    /// Build the span at the current position and advance past it.
    fn span(&mut self, text: String, advance: f32) -> Option<TextSpan> {
        let [a, b, c, d, e, f] = self.matrix;
        let x_scale = (a * a + b * b).sqrt();
        let y_scale = (c * c + d * d).sqrt();
        self.matrix[4] = e + advance * a;
        self.matrix[5] = f + advance * b;

        if text.is_empty() {
            trace!("Skipping empty show operator");
            return None;
        }

        // Negative sizes and advances flip the box; corners are reordered.
        let size = self.font_size * y_scale;
        let baseline = f - self.page_bottom;
        let bbox = BoundingBox::from_corners(
            e,
            self.page_height - (baseline + ASCENT * size),
            e + advance * x_scale,
            self.page_height - (baseline - DESCENT * size),
        );
        Some(TextSpan::new(text, bbox))
    }
}
