//! Detected field and mapping result models.

use serde::{Deserialize, Serialize};

use super::value::DataValue;

/// Axis-aligned box in page coordinates, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Box spanning two opposite corners given in any order.
    pub fn from_corners(ax: f32, ay: f32, bx: f32, by: f32) -> Self {
        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// All four coordinates are finite and the box is not inverted.
    pub fn is_well_formed(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
            && self.x0 <= self.x1
            && self.y0 <= self.y1
    }

    /// Horizontal slice of this box between two relative positions (0.0 - 1.0).
    ///
    /// The vertical extent is kept as is.
    pub fn horizontal_slice(&self, rel_start: f32, rel_end: f32) -> Self {
        let width = self.width();
        Self {
            x0: self.x0 + rel_start * width,
            y0: self.y0,
            x1: self.x0 + rel_end * width,
            y1: self.y1,
        }
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

/// Where a field was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldLocation {
    /// A free-standing text string.
    Text,
    /// A top-level paragraph of a word-processor document.
    Paragraph { index: usize },
    /// A table cell of a word-processor document.
    TableCell { table: usize, row: usize, cell: usize },
    /// A text span on a PDF page, with the field's approximate box.
    PdfSpan {
        page: usize,
        span: usize,
        bbox: BoundingBox,
    },
}

impl FieldLocation {
    /// Identifies the structural unit, ignoring anything field-specific.
    pub fn unit(&self) -> UnitKey {
        match *self {
            Self::Text => UnitKey::Text,
            Self::Paragraph { index } => UnitKey::Paragraph(index),
            Self::TableCell { table, row, cell } => UnitKey::TableCell(table, row, cell),
            Self::PdfSpan { page, span, .. } => UnitKey::PdfSpan(page, span),
        }
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        match self {
            Self::PdfSpan { bbox, .. } => Some(*bbox),
            _ => None,
        }
    }
}

/// Key of a structural unit (paragraph, cell, span).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitKey {
    Text,
    Paragraph(usize),
    TableCell(usize, usize, usize),
    PdfSpan(usize, usize),
}

/// Trimmed text surrounding a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldContext {
    pub before: String,
    pub after: String,
}

/// A located, typed slot expected to receive a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedField {
    /// Name of the pattern that matched.
    #[serde(rename = "type")]
    pub field_type: String,

    /// Structural coordinates.
    pub location: FieldLocation,

    /// Character offset of the match start within its unit.
    pub start: usize,

    /// Character offset one past the match end within its unit.
    pub end: usize,

    /// Matched text.
    pub text: String,

    /// Captured group, for patterns that have one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Inferred semantic name; never an empty string.
    pub field_name: Option<String>,

    pub context: FieldContext,
}

impl DetectedField {
    pub fn has_name(&self) -> bool {
        self.field_name.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }
}

/// Which mapping tier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStrategy {
    /// Mapping table supplied by the semantic collaborator.
    Semantic,
    /// Exact and substring key matching.
    RuleBased,
}

/// One field with its resolved value, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field: DetectedField,
    pub value: Option<DataValue>,
}

impl FieldMapping {
    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }
}

/// Result of resolving a list of detected fields against a data set.
///
/// Entries follow the detection order, one per detected field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    pub strategy: MappingStrategy,
    pub entries: Vec<FieldMapping>,
}

impl MappingResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldMapping> {
        self.entries.iter()
    }

    pub fn resolved_count(&self) -> usize {
        self.entries.iter().filter(|m| m.is_resolved()).count()
    }

    /// Resolved entries of one unit, last offset first.
    ///
    /// Writers replacing text inside a unit must apply replacements in this
    /// order so earlier offsets stay valid.
    pub fn replacements_for(&self, unit: UnitKey) -> Vec<&FieldMapping> {
        let mut entries: Vec<&FieldMapping> = self
            .entries
            .iter()
            .filter(|m| m.is_resolved() && m.field.location.unit() == unit)
            .collect();
        entries.sort_by(|a, b| b.field.start.cmp(&a.field.start));
        entries
    }
}

impl IntoIterator for MappingResult {
    type Item = FieldMapping;
    type IntoIter = std::vec::IntoIter<FieldMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
