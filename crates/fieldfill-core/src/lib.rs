//! Core library for fillable-field detection and data mapping.
//!
//! This crate provides:
//! - A catalog of placeholder patterns (underscores, braces, brackets, label markers)
//! - Field name inference from captures and surrounding keywords
//! - Walkers over word-processor and PDF structures
//! - Two-tier mapping of detected fields onto a data dictionary
//! - Read-only structure providers for `.docx`, `.pdf`, JSON dumps and plain text

pub mod collaborator;
pub mod detect;
pub mod error;
pub mod mapping;
pub mod models;
pub mod structure;

pub use collaborator::{FieldNamer, MappingTable, NamingRequest, SemanticMapper};
pub use detect::{FieldDetector, FieldNameInferencer, FieldPattern, PatternCatalog, PatternKind};
pub use error::{CollaboratorError, FillError, Result, StructureError};
pub use mapping::{MappingResolver, rule_based_mapping};
pub use models::config::FieldFillConfig;
pub use models::document::{DocumentSource, PdfDocument, PdfPage, Table, TableRow, TextSpan, WordDocument};
pub use models::field::{
    BoundingBox, DetectedField, FieldContext, FieldLocation, FieldMapping, MappingResult,
    MappingStrategy, UnitKey,
};
pub use models::value::{DataRecord, DataValue, parse_data_record};
pub use structure::{DocumentKind, LoadedDocument, load_document, validate_structure};

#[cfg(feature = "native")]
pub use structure::{DocxReader, PdfSpanReader};
