//! Word-processor structure from `.docx` packages.

use std::io::{Cursor, Read, Seek};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;
use zip::ZipArchive;

use crate::error::StructureError;
use crate::models::document::{Table, TableRow, WordDocument};

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads body paragraphs and top-level tables from a `.docx` package.
pub struct DocxReader;

impl DocxReader {
    /// Read a package held in memory.
    pub fn read_bytes(data: &[u8]) -> Result<WordDocument, StructureError> {
        Self::read(Cursor::new(data))
    }

    /// Read a package from any seekable source.
    pub fn read<R: Read + Seek>(source: R) -> Result<WordDocument, StructureError> {
        let mut archive =
            ZipArchive::new(source).map_err(|e| StructureError::Docx(format!("not a zip package: {}", e)))?;

        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| StructureError::Docx(format!("missing {}: {}", DOCUMENT_PART, e)))?
            .read_to_string(&mut xml)
            .map_err(|e| StructureError::Docx(format!("failed to read {}: {}", DOCUMENT_PART, e)))?;

        Self::parse_document_xml(&xml)
    }

    /// Parse the main document part.
    pub fn parse_document_xml(xml: &str) -> Result<WordDocument, StructureError> {
        let mut reader = Reader::from_str(xml);
        let mut builder = BodyBuilder::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => builder.start(&e),
                Ok(Event::Empty(e)) => builder.empty(&e),
                Ok(Event::End(e)) => builder.end(e.name().as_ref()),
                Ok(Event::Text(e)) => {
                    if builder.in_text {
                        let text = e
                            .unescape()
                            .map_err(|e| StructureError::Docx(format!("bad text run: {}", e)))?;
                        builder.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(StructureError::Docx(format!(
                        "XML error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
            buf.clear();
        }

        let document = builder.document;
        debug!(
            "DOCX: {} paragraphs, {} tables",
            document.paragraphs.len(),
            document.tables.len()
        );
        Ok(document)
    }
}

/// Event-driven assembly of the body.
///
/// Only depth-one tables are kept; text of nested tables is dropped so it
/// never leaks into the enclosing cell. Rows are laid out by grid column: a
/// cell spanning columns repeats once per column, and a vertically merged
/// continuation repeats the text of the cell above.
#[derive(Default)]
struct BodyBuilder {
    document: WordDocument,
    table_depth: usize,
    paragraph_depth: usize,
    in_paragraph_props: bool,
    in_text: bool,
    paragraph: String,
    table: Table,
    row: TableRow,
    cell: Vec<String>,
    cell_span: usize,
    cell_continues_merge: bool,
}

impl BodyBuilder {
    fn start(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"w:tbl" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.table = Table::default();
                }
            }
            b"w:tr" if self.table_depth == 1 => self.row = TableRow::default(),
            b"w:tc" if self.table_depth == 1 => {
                self.cell.clear();
                self.cell_span = 1;
                self.cell_continues_merge = false;
            }
            b"w:p" => {
                if self.paragraph_depth == 0 {
                    self.paragraph.clear();
                }
                self.paragraph_depth += 1;
            }
            b"w:pPr" => self.in_paragraph_props = true,
            b"w:t" => self.in_text = true,
            _ => {}
        }
    }

    fn empty(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"w:p" if self.paragraph_depth == 0 => {
                self.paragraph.clear();
                self.finish_paragraph();
            }
            // Tab stops inside paragraph properties are not content.
            b"w:tab" if !self.in_paragraph_props => self.push_str("\t"),
            b"w:br" | b"w:cr" => self.push_str("\n"),
            b"w:gridSpan" if self.table_depth == 1 => {
                if let Some(span) = attribute(e, b"w:val").and_then(|v| v.parse::<usize>().ok()) {
                    self.cell_span = span.max(1);
                }
            }
            // A bare `w:vMerge` continues the merge begun above.
            b"w:vMerge" if self.table_depth == 1 => {
                self.cell_continues_merge = attribute(e, b"w:val").is_none_or(|v| v == "continue");
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"w:tbl" => {
                if self.table_depth == 1 {
                    let table = std::mem::take(&mut self.table);
                    self.document.tables.push(table);
                }
                self.table_depth = self.table_depth.saturating_sub(1);
            }
            b"w:tr" if self.table_depth == 1 => {
                let row = std::mem::take(&mut self.row);
                self.table.rows.push(row);
            }
            b"w:tc" if self.table_depth == 1 => {
                let own = self.cell.join("\n");
                self.cell.clear();
                for _ in 0..self.cell_span.max(1) {
                    let text = if self.cell_continues_merge {
                        self.cell_above().unwrap_or_default()
                    } else {
                        own.clone()
                    };
                    self.row.cells.push(text);
                }
            }
            b"w:p" => {
                self.paragraph_depth = self.paragraph_depth.saturating_sub(1);
                if self.paragraph_depth == 0 {
                    self.finish_paragraph();
                }
            }
            b"w:pPr" => self.in_paragraph_props = false,
            b"w:t" => self.in_text = false,
            _ => {}
        }
    }

    /// Text at the next grid column of the previous row.
    fn cell_above(&self) -> Option<String> {
        self.table.rows.last()?.cells.get(self.row.cells.len()).cloned()
    }

    fn push_str(&mut self, text: &str) {
        if self.paragraph_depth > 0 && self.table_depth <= 1 {
            self.paragraph.push_str(text);
        }
    }

    fn finish_paragraph(&mut self) {
        let text = std::mem::take(&mut self.paragraph);
        match self.table_depth {
            0 => self.document.paragraphs.push(text),
            1 => self.cell.push(text),
            _ => {}
        }
    }
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    let attr = e.try_get_attribute(name).ok().flatten()?;
    attr.unescape_value().ok().map(|v| v.into_owned())
}
