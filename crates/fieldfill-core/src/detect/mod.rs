//! Field detection: pattern scanning, name inference and structure walking.

mod detector;
pub mod infer;
pub mod patterns;
pub mod scanner;
pub mod walker;

pub use detector::FieldDetector;
pub use infer::FieldNameInferencer;
pub use patterns::{FieldPattern, PatternCatalog, PatternKind};
pub use scanner::{RawMatch, scan};
pub use walker::{PdfWalker, StructureWalker, UnitAnalyzer, WordWalker};
