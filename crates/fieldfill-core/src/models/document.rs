//! Parsed document structures consumed by the detector.

use serde::{Deserialize, Serialize};

use super::field::BoundingBox;

/// A parsed document, one variant per structural family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentSource {
    /// Paragraphs and tables of a word-processor file.
    WordProcessor(WordDocument),
    /// Pages of positioned text spans.
    Pdf(PdfDocument),
}

impl DocumentSource {
    /// Number of structural units (paragraphs plus cells, or spans).
    pub fn unit_count(&self) -> usize {
        match self {
            Self::WordProcessor(doc) => {
                doc.paragraphs.len()
                    + doc
                        .tables
                        .iter()
                        .flat_map(|t| t.rows.iter())
                        .map(|r| r.cells.len())
                        .sum::<usize>()
            }
            Self::Pdf(doc) => doc.pages.iter().map(|p| p.spans.len()).sum(),
        }
    }
}

impl From<WordDocument> for DocumentSource {
    fn from(doc: WordDocument) -> Self {
        Self::WordProcessor(doc)
    }
}

impl From<PdfDocument> for DocumentSource {
    fn from(doc: PdfDocument) -> Self {
        Self::Pdf(doc)
    }
}

/// Word-processor document: top-level paragraphs and tables in body order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordDocument {
    pub paragraphs: Vec<String>,
    pub tables: Vec<Table>,
}

impl WordDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paragraph(mut self, text: impl Into<String>) -> Self {
        self.paragraphs.push(text.into());
        self
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Build a table from rows of cell texts.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|cells| TableRow {
                    cells: cells.into_iter().map(Into::into).collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Cell texts, left to right.
    pub cells: Vec<String>,
}

/// PDF document as pages of text spans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfDocument {
    pub pages: Vec<PdfPage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfPage {
    /// Spans in rendering order.
    pub spans: Vec<TextSpan>,
}

/// A run of text drawn at one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub bbox: BoundingBox,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}
