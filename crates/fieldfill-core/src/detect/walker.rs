//! Structural walkers: one per document family.

use tracing::debug;

use super::infer::FieldNameInferencer;
use super::patterns::PatternCatalog;
use super::scanner::{context_around, scan};
use crate::models::document::{PdfDocument, WordDocument};
use crate::models::field::{DetectedField, FieldLocation};

/// Scanner and inferencer shared by every walker.
pub struct UnitAnalyzer<'a> {
    pub catalog: &'a PatternCatalog,
    pub inferencer: &'a FieldNameInferencer,
    pub context_length: usize,
}

impl UnitAnalyzer<'_> {
    /// Detect fields in one unit of text.
    ///
    /// `locate` receives the match's character range and the unit's
    /// character length and returns the field's location.
    pub fn analyze<F>(&self, text: &str, locate: F) -> Vec<DetectedField>
    where
        F: Fn(usize, usize, usize) -> FieldLocation,
    {
        let unit_len = text.chars().count();

        scan(self.catalog, text)
            .into_iter()
            .map(|m| {
                let field_name = self.inferencer.infer(m.pattern, &m.text, text, m.start);
                DetectedField {
                    field_type: m.pattern.name().to_string(),
                    location: locate(m.start, m.end, unit_len),
                    start: m.start,
                    end: m.end,
                    context: context_around(text, m.start, m.end, self.context_length),
                    text: m.text,
                    value: m.captured,
                    field_name,
                }
            })
            .collect()
    }
}

/// Trait for document walkers.
pub trait StructureWalker {
    /// The document family this walker understands.
    type Document;

    /// Detect fields unit by unit, in document order.
    fn walk(&self, analyzer: &UnitAnalyzer<'_>, document: &Self::Document) -> Vec<DetectedField>;
}

/// Walks paragraphs, then tables row by row and cell by cell.
pub struct WordWalker;

impl StructureWalker for WordWalker {
    type Document = WordDocument;

    fn walk(&self, analyzer: &UnitAnalyzer<'_>, document: &WordDocument) -> Vec<DetectedField> {
        let mut fields = Vec::new();

        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            fields.extend(analyzer.analyze(paragraph, |_, _, _| FieldLocation::Paragraph { index }));
        }
        let paragraph_fields = fields.len();

        for (table, t) in document.tables.iter().enumerate() {
            for (row, r) in t.rows.iter().enumerate() {
                for (cell, text) in r.cells.iter().enumerate() {
                    fields.extend(analyzer.analyze(text, |_, _, _| FieldLocation::TableCell {
                        table,
                        row,
                        cell,
                    }));
                }
            }
        }

        debug!(
            "Word document: {} paragraph fields, {} table fields",
            paragraph_fields,
            fields.len() - paragraph_fields
        );

        fields
    }
}

/// Walks PDF pages and their spans in rendering order.
pub struct PdfWalker;

impl StructureWalker for PdfWalker {
    type Document = PdfDocument;

    fn walk(&self, analyzer: &UnitAnalyzer<'_>, document: &PdfDocument) -> Vec<DetectedField> {
        let mut fields = Vec::new();

        for (page, p) in document.pages.iter().enumerate() {
            let before = fields.len();

            for (span, s) in p.spans.iter().enumerate() {
                let span_bbox = s.bbox;
                fields.extend(analyzer.analyze(&s.text, |start, end, len| {
                    // Proportional to character position; not glyph-accurate.
                    let (rel_start, rel_end) = if len > 0 {
                        (start as f32 / len as f32, end as f32 / len as f32)
                    } else {
                        (0.0, 0.0)
                    };
                    FieldLocation::PdfSpan {
                        page,
                        span,
                        bbox: span_bbox.horizontal_slice(rel_start, rel_end),
                    }
                }));
            }

            debug!("PDF page {}: {} fields", page, fields.len() - before);
        }

        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{PdfPage, Table, TextSpan};
    use crate::models::field::BoundingBox;

    fn analyzer<'a>(
        catalog: &'a PatternCatalog,
        inferencer: &'a FieldNameInferencer,
    ) -> UnitAnalyzer<'a> {
        UnitAnalyzer {
            catalog,
            inferencer,
            context_length: 30,
        }
    }

    #[test]
    fn test_word_order_paragraphs_then_tables() {
        let catalog = PatternCatalog::builtin();
        let inferencer = FieldNameInferencer::new();
        let doc = WordDocument::new()
            .with_paragraph("Договор {{number}}")
            .with_table(Table::from_rows([["ИНН", "{inn}"], ["КПП", "{kpp}"]]))
            .with_paragraph("<city>");

        let fields = WordWalker.walk(&analyzer(&catalog, &inferencer), &doc);
        let locations: Vec<&FieldLocation> = fields.iter().map(|f| &f.location).collect();

        assert_eq!(
            locations,
            vec![
                &FieldLocation::Paragraph { index: 0 },
                &FieldLocation::Paragraph { index: 0 },
                &FieldLocation::Paragraph { index: 1 },
                &FieldLocation::TableCell { table: 0, row: 0, cell: 1 },
                &FieldLocation::TableCell { table: 0, row: 1, cell: 1 },
            ]
        );
        assert_eq!(fields[4].field_name.as_deref(), Some("kpp"));
    }

    #[test]
    fn test_cell_offsets_are_local() {
        let catalog = PatternCatalog::builtin();
        let inferencer = FieldNameInferencer::new();
        let doc = WordDocument::new()
            .with_paragraph("a long paragraph before the table")
            .with_table(Table::from_rows([["Сумма: ____"]]));

        let fields = WordWalker.walk(&analyzer(&catalog, &inferencer), &doc);
        let medium = fields.iter().find(|f| f.field_type == "medium_underscore").unwrap();

        assert_eq!((medium.start, medium.end), (7, 11));
        assert_eq!(medium.field_name.as_deref(), Some("amount"));
        assert_eq!(medium.context.before, "Сумма:");
    }

    #[test]
    fn test_pdf_bbox_interpolation() {
        let catalog = PatternCatalog::builtin();
        let inferencer = FieldNameInferencer::new();
        let doc = PdfDocument {
            pages: vec![
                PdfPage { spans: vec![] },
                PdfPage {
                    spans: vec![
                        TextSpan::new("no fields here", BoundingBox::new(0.0, 0.0, 50.0, 10.0)),
                        // 10 characters over 100 points
                        TextSpan::new("ИНН ______", BoundingBox::new(100.0, 700.0, 200.0, 712.0)),
                    ],
                },
            ],
        };

        let fields = PdfWalker.walk(&analyzer(&catalog, &inferencer), &doc);
        let long = fields.iter().find(|f| f.field_type == "long_underscore").unwrap();

        assert_eq!(
            long.location,
            FieldLocation::PdfSpan {
                page: 1,
                span: 1,
                bbox: BoundingBox::new(140.0, 700.0, 200.0, 712.0),
            }
        );
        assert_eq!(long.field_name.as_deref(), Some("inn"));
    }
}
