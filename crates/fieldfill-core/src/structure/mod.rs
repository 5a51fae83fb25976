//! Read-only structure providers.
//!
//! Turn files on disk into the parsed structures the detector walks.

#[cfg(feature = "native")]
mod docx;
#[cfg(feature = "native")]
mod font;
#[cfg(feature = "native")]
mod pdf;

#[cfg(feature = "native")]
pub use docx::DocxReader;
#[cfg(feature = "native")]
pub use pdf::PdfSpanReader;

use std::path::Path;

use tracing::debug;

use crate::error::{FillError, StructureError};
use crate::models::document::DocumentSource;

/// Input family, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `.docx` package.
    WordProcessor,
    /// `.pdf` file.
    Pdf,
    /// `.json` dump of a parsed structure.
    Structure,
    /// `.txt` file, scanned as one unit.
    PlainText,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Result<Self, StructureError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "docx" => Ok(Self::WordProcessor),
            "pdf" => Ok(Self::Pdf),
            "json" => Ok(Self::Structure),
            "txt" => Ok(Self::PlainText),
            _ => Err(StructureError::UnsupportedFormat(ext)),
        }
    }
}

/// A document ready for detection.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedDocument {
    Structured(DocumentSource),
    Text(String),
}

/// Load and parse a document according to its extension.
pub fn load_document(path: &Path) -> Result<LoadedDocument, FillError> {
    let kind = DocumentKind::from_path(path)?;
    debug!("Loading {} as {:?}", path.display(), kind);

    match kind {
        DocumentKind::PlainText => Ok(LoadedDocument::Text(std::fs::read_to_string(path)?)),
        DocumentKind::Structure => {
            let json = std::fs::read_to_string(path)?;
            Ok(LoadedDocument::Structured(parse_structure(&json)?))
        }
        DocumentKind::WordProcessor | DocumentKind::Pdf => {
            let data = std::fs::read(path)?;
            Ok(LoadedDocument::Structured(read_binary(kind, &data)?))
        }
    }
}

/// Parse a serialized structure dump.
pub fn parse_structure(json: &str) -> Result<DocumentSource, StructureError> {
    let document: DocumentSource =
        serde_json::from_str(json).map_err(|e| StructureError::MalformedStructure(e.to_string()))?;
    validate_structure(&document)?;
    Ok(document)
}

/// Reject PDF spans whose boxes are not finite with `x0 <= x1` and `y0 <= y1`.
pub fn validate_structure(document: &DocumentSource) -> Result<(), StructureError> {
    let DocumentSource::Pdf(pdf) = document else {
        return Ok(());
    };

    for (page_index, page) in pdf.pages.iter().enumerate() {
        for (span_index, span) in page.spans.iter().enumerate() {
            let b = span.bbox;
            if !b.is_well_formed() {
                return Err(StructureError::MalformedStructure(format!(
                    "page {} span {}: bounding box [{}, {}, {}, {}] is not well-formed",
                    page_index, span_index, b.x0, b.y0, b.x1, b.y1
                )));
            }
        }
    }
    Ok(())
}

#[cfg(feature = "native")]
fn read_binary(kind: DocumentKind, data: &[u8]) -> Result<DocumentSource, StructureError> {
    match kind {
        DocumentKind::Pdf => Ok(PdfSpanReader::read_bytes(data)?.into()),
        _ => Ok(DocxReader::read_bytes(data)?.into()),
    }
}

#[cfg(not(feature = "native"))]
fn read_binary(kind: DocumentKind, _data: &[u8]) -> Result<DocumentSource, StructureError> {
    Err(StructureError::UnsupportedFormat(format!(
        "{:?} (built without document readers)",
        kind
    )))
}
