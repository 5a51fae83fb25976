//! Error types for the fieldfill-core library.

use thiserror::Error;

/// Main error type for the fieldfill library.
#[derive(Error, Debug)]
pub enum FillError {
    /// Document structure could not be obtained.
    #[error("structure error: {0}")]
    Structure(#[from] StructureError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while reading a document's structure.
#[derive(Error, Debug)]
pub enum StructureError {
    /// The document type is not recognized.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Failed to read a word-processor document.
    #[error("failed to read DOCX: {0}")]
    Docx(String),

    /// Failed to read a PDF document.
    #[error("failed to read PDF: {0}")]
    Pdf(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// A serialized structure dump is not well-formed.
    #[error("malformed document structure: {0}")]
    MalformedStructure(String),
}

/// Failures of an external semantic collaborator.
///
/// These never escape a detection or mapping pass; the engine logs them and
/// falls back to its local rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// No collaborator is reachable.
    #[error("collaborator unavailable")]
    Unavailable,

    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The response could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// A positional response did not line up with the request.
    #[error("expected {expected} entries, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Result type for the fieldfill library.
pub type Result<T> = std::result::Result<T, FillError>;
