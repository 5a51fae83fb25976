//! Field detection engine.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::infer::FieldNameInferencer;
use super::patterns::PatternCatalog;
use super::walker::{PdfWalker, StructureWalker, UnitAnalyzer, WordWalker};
use crate::collaborator::{FieldNamer, NamingRequest};
use crate::error::{CollaboratorError, FillError};
use crate::models::config::DetectionConfig;
use crate::models::document::{DocumentSource, PdfDocument, WordDocument};
use crate::models::field::{DetectedField, FieldLocation};
use crate::structure::LoadedDocument;

/// Detects fillable fields in text and document structures.
///
/// Holds no per-document state; one detector can serve any number of
/// documents, from any number of threads.
pub struct FieldDetector {
    catalog: PatternCatalog,
    inferencer: FieldNameInferencer,
    context_length: usize,
    namer: Option<Box<dyn FieldNamer>>,
}

impl FieldDetector {
    /// Create a detector with the built-in catalog and default settings.
    pub fn new() -> Self {
        Self {
            catalog: PatternCatalog::builtin(),
            inferencer: FieldNameInferencer::new(),
            context_length: 30,
            namer: None,
        }
    }

    /// Create a detector from configuration.
    ///
    /// Extra patterns are appended after the built-in ones.
    pub fn from_config(config: &DetectionConfig) -> Result<Self, FillError> {
        let catalog = PatternCatalog::builtin().with_specs(&config.extra_patterns)?;
        Ok(Self::new()
            .with_catalog(catalog)
            .with_inference_window(config.inference_window)
            .with_context_length(config.context_length))
    }

    /// Replace the pattern catalog.
    pub fn with_catalog(mut self, catalog: PatternCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set the keyword window used for contextual naming.
    pub fn with_inference_window(mut self, window: usize) -> Self {
        self.inferencer = self.inferencer.with_window(window);
        self
    }

    /// Set how many characters of context are kept around each match.
    pub fn with_context_length(mut self, length: usize) -> Self {
        self.context_length = length;
        self
    }

    /// Attach a collaborator that names fields the local rules cannot.
    pub fn with_namer(mut self, namer: Box<dyn FieldNamer>) -> Self {
        self.namer = Some(namer);
        self
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Detect fields in a single string, sorted by start offset.
    pub fn detect_in_text(&self, text: &str) -> Vec<DetectedField> {
        let mut fields = self.analyzer().analyze(text, |_, _, _| FieldLocation::Text);
        fields.sort_by_key(|f| f.start);
        self.enhance_names(&mut fields);
        info!("Detected {} fields in {} characters of text", fields.len(), text.len());
        fields
    }

    /// Detect fields in a parsed document, in document order.
    pub fn detect(&self, document: &DocumentSource) -> Vec<DetectedField> {
        debug!("Scanning {} structural units", document.unit_count());
        match document {
            DocumentSource::WordProcessor(doc) => self.detect_in_word(doc),
            DocumentSource::Pdf(doc) => self.detect_in_pdf(doc),
        }
    }

    /// Detect fields in whatever a structure provider loaded.
    pub fn detect_loaded(&self, document: &LoadedDocument) -> Vec<DetectedField> {
        match document {
            LoadedDocument::Structured(doc) => self.detect(doc),
            LoadedDocument::Text(text) => self.detect_in_text(text),
        }
    }

    /// Detect fields in paragraphs, then tables.
    pub fn detect_in_word(&self, document: &WordDocument) -> Vec<DetectedField> {
        self.run(&WordWalker, document)
    }

    /// Detect fields in PDF spans, page by page.
    pub fn detect_in_pdf(&self, document: &PdfDocument) -> Vec<DetectedField> {
        self.run(&PdfWalker, document)
    }

    fn run<W: StructureWalker>(&self, walker: &W, document: &W::Document) -> Vec<DetectedField> {
        let start = Instant::now();
        let mut fields = walker.walk(&self.analyzer(), document);
        self.enhance_names(&mut fields);

        info!(
            "Detected {} fields ({} named) in {}ms",
            fields.len(),
            fields.iter().filter(|f| f.has_name()).count(),
            start.elapsed().as_millis()
        );
        fields
    }

    fn analyzer(&self) -> UnitAnalyzer<'_> {
        UnitAnalyzer {
            catalog: &self.catalog,
            inferencer: &self.inferencer,
            context_length: self.context_length,
        }
    }

    /// Fill in names for unresolved fields from the naming collaborator.
    ///
    /// On any collaborator failure every unresolved field stays unresolved.
    fn enhance_names(&self, fields: &mut [DetectedField]) {
        let Some(namer) = self.namer.as_deref() else {
            return;
        };

        let unnamed: Vec<usize> = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.has_name())
            .map(|(i, _)| i)
            .collect();

        if unnamed.is_empty() {
            return;
        }

        let requests: Vec<NamingRequest> = unnamed
            .iter()
            .map(|&i| {
                let f = &fields[i];
                NamingRequest {
                    field_type: f.field_type.clone(),
                    text: f.text.clone(),
                    context_before: f.context.before.clone(),
                    context_after: f.context.after.clone(),
                }
            })
            .collect();

        let names = match request_names(namer, &requests) {
            Ok(names) => names,
            Err(e) => {
                warn!("Field naming failed: {}. Leaving {} fields unnamed", e, unnamed.len());
                return;
            }
        };

        let mut named = 0;
        for (&i, name) in unnamed.iter().zip(names) {
            if let Some(name) = name {
                fields[i].field_name = Some(name);
                named += 1;
            }
        }

        debug!("Naming collaborator named {} of {} fields", named, unnamed.len());
    }
}

impl Default for FieldDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Call the namer and normalize its answer.
///
/// A response of the wrong length is rejected as a whole; blank names
/// become `None`.
fn request_names(
    namer: &dyn FieldNamer,
    requests: &[NamingRequest],
) -> Result<Vec<Option<String>>, CollaboratorError> {
    let names = namer.infer_field_names(requests)?;

    if names.len() != requests.len() {
        return Err(CollaboratorError::LengthMismatch {
            expected: requests.len(),
            actual: names.len(),
        });
    }

    Ok(names
        .into_iter()
        .map(|n| {
            n.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::patterns::{FieldPattern, PatternKind};
    use crate::models::config::{PatternKindSpec, PatternSpec};
    use pretty_assertions::assert_eq;
    use regex::Regex;

    struct FixedNamer(Result<Vec<Option<String>>, CollaboratorError>);

    impl FieldNamer for FixedNamer {
        fn infer_field_names(
            &self,
            _requests: &[NamingRequest],
        ) -> Result<Vec<Option<String>>, CollaboratorError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_plain_text_sorted_by_start() {
        let fields = FieldDetector::new().detect_in_text("Дата: ____ Подпись: ____");
        let starts: Vec<usize> = fields.iter().map(|f| f.start).collect();
        let mut sorted = starts.clone();
        sorted.sort();

        assert_eq!(starts, sorted);
        assert_eq!(fields[0].field_type, "date_marker");
        assert!(fields.iter().all(|f| f.location == FieldLocation::Text));
    }

    #[test]
    fn test_equal_starts_keep_catalog_order() {
        let fields = FieldDetector::new().detect_in_text("______");
        let leading: Vec<&str> = fields.iter().take(3).map(|f| f.field_type.as_str()).collect();
        assert_eq!(leading, vec!["long_underscore", "medium_underscore", "short_underscore"]);
    }

    #[test]
    fn test_invariants_hold() {
        let text = "ФИО: ____ [ ] {x} <> ... --- Примечание: ____ {{Номер}}";
        for field in FieldDetector::new().detect_in_text(text) {
            assert!(field.start < field.end);
            assert_ne!(field.field_name.as_deref(), Some(""));
        }
    }

    #[test]
    fn test_detection_is_deterministic() {
        let doc = DocumentSource::WordProcessor(
            WordDocument::new()
                .with_paragraph("ФИО: ___________")
                .with_paragraph("Адрес: ........"),
        );
        let detector = FieldDetector::new();
        assert_eq!(detector.detect(&doc), detector.detect(&doc));
    }

    #[test]
    fn test_namer_fills_unresolved_only() {
        let detector = FieldDetector::new()
            .with_namer(Box::new(FixedNamer(Ok(vec![Some("  notes ".to_string())]))));

        let fields = detector.detect_in_text("{{date}} Примечание: ....");
        let dots = fields.iter().find(|f| f.field_type == "dots").unwrap();
        assert_eq!(dots.field_name.as_deref(), Some("notes"));

        let braces = fields.iter().find(|f| f.field_type == "double_braces").unwrap();
        assert_eq!(braces.field_name.as_deref(), Some("date"));
    }

    #[test]
    fn test_namer_failure_leaves_fields_unnamed() {
        let failing = FieldDetector::new()
            .with_namer(Box::new(FixedNamer(Err(CollaboratorError::Timeout))));
        let fields = failing.detect_in_text("Примечание: ....");
        assert!(fields.iter().all(|f| f.field_name.is_none()));

        let short = FieldDetector::new().with_namer(Box::new(FixedNamer(Ok(vec![]))));
        let fields = short.detect_in_text("Примечание: .... ---");
        assert!(fields.iter().all(|f| f.field_name.is_none()));
    }

    struct TypeNamer;

    impl FieldNamer for TypeNamer {
        fn infer_field_names(
            &self,
            requests: &[NamingRequest],
        ) -> Result<Vec<Option<String>>, CollaboratorError> {
            Ok(requests.iter().map(|r| Some(format!("{}_guess", r.field_type))).collect())
        }
    }

    #[test]
    fn test_blank_brackets_go_to_namer() {
        let plain = FieldDetector::new().detect_in_text("Телефон: [   ]");
        let brackets = plain.iter().find(|f| f.field_type == "square_brackets").unwrap();
        assert_eq!(brackets.field_name, None);

        let named = FieldDetector::new()
            .with_namer(Box::new(TypeNamer))
            .detect_in_text("Телефон: [   ]");
        let brackets = named.iter().find(|f| f.field_type == "square_brackets").unwrap();
        assert_eq!(brackets.field_name.as_deref(), Some("square_brackets_guess"));
    }

    #[test]
    fn test_blank_candidate_stays_unresolved() {
        let detector = FieldDetector::new()
            .with_namer(Box::new(FixedNamer(Ok(vec![Some("   ".to_string()), None]))));
        let fields = detector.detect_in_text("Примечание: .... ---");
        assert!(fields.iter().all(|f| f.field_name.is_none()));
    }

    #[test]
    fn test_custom_catalog() {
        let catalog = PatternCatalog::empty()
            .with_pattern(FieldPattern::new(
                "percent",
                Regex::new(r"%(\w+)%").unwrap(),
                PatternKind::Syntactic,
            ))
            .unwrap();

        let fields = FieldDetector::new()
            .with_catalog(catalog)
            .detect_in_text("Hello %Client%, ____");

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_name.as_deref(), Some("client"));
    }

    #[test]
    fn test_from_config_appends_patterns() {
        let config = DetectionConfig {
            extra_patterns: vec![PatternSpec {
                name: "inn_marker".to_string(),
                regex: "ИНН".to_string(),
                kind: PatternKindSpec::Marker,
                field_name: Some("inn".to_string()),
            }],
            ..DetectionConfig::default()
        };

        let detector = FieldDetector::from_config(&config).unwrap();
        assert_eq!(detector.catalog().names().last(), Some(&"inn_marker"));

        let fields = detector.detect_in_text("ИНН");
        assert_eq!(fields[0].field_name.as_deref(), Some("inn"));
    }
}
