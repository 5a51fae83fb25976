//! LLM-backed semantic collaborators for fieldfill.
//!
//! This crate provides:
//! - A `ChatBackend` abstraction over chat completion services
//! - An OpenAI-compatible HTTP backend (feature `http`)
//! - `LlmCollaborator`, implementing the core's field naming and
//!   data-key mapping contracts on top of any backend

mod backend;
mod error;
pub mod prompt;

pub use backend::ChatBackend;
pub use error::SemanticError;

#[cfg(feature = "http")]
pub use backend::openai::OpenAiBackend;

use fieldfill_core::{CollaboratorError, FieldNamer, MappingTable, NamingRequest, SemanticMapper};
use tracing::debug;

/// Result type for semantic operations.
pub type Result<T> = std::result::Result<T, SemanticError>;

/// Field naming and mapping through a chat backend.
pub struct LlmCollaborator<B> {
    backend: B,
}

impl<B: ChatBackend> LlmCollaborator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn map_names(&self, field_names: &[String], data_keys: &[String]) -> Result<MappingTable> {
        let reply = self
            .backend
            .complete(&prompt::mapping_prompt(field_names, data_keys))?;
        let table = prompt::parse_mapping_reply(&reply)?;
        debug!(
            "{} mapped {} of {} field names",
            self.backend.model(),
            table.values().filter(|v| v.is_some()).count(),
            field_names.len()
        );
        Ok(table)
    }

    fn name_fields(&self, requests: &[NamingRequest]) -> Result<Vec<Option<String>>> {
        let reply = self.backend.complete(&prompt::naming_prompt(requests))?;
        prompt::parse_naming_reply(&reply, requests.len())
    }
}

impl<B: ChatBackend> SemanticMapper for LlmCollaborator<B> {
    fn map_field_names(
        &self,
        field_names: &[String],
        data_keys: &[String],
    ) -> std::result::Result<MappingTable, CollaboratorError> {
        self.map_names(field_names, data_keys).map_err(CollaboratorError::from)
    }
}

impl<B: ChatBackend> FieldNamer for LlmCollaborator<B> {
    fn infer_field_names(
        &self,
        requests: &[NamingRequest],
    ) -> std::result::Result<Vec<Option<String>>, CollaboratorError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        self.name_fields(requests).map_err(CollaboratorError::from)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use fieldfill_core::{
        DataValue, FieldDetector, MappingResolver, MappingStrategy, parse_data_record,
        rule_based_mapping,
    };
    use pretty_assertions::assert_eq;

    /// Replays canned completions and records prompts.
    struct ScriptedBackend {
        replies: Mutex<Vec<Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChatBackend for ScriptedBackend {
        fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(SemanticError::EmptyCompletion))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn test_mapping_through_resolver() {
        let backend = ScriptedBackend::new(vec![Ok(r#"{"full_name": "client"}"#.to_string())]);
        let resolver = MappingResolver::new().with_mapper(Box::new(LlmCollaborator::new(backend)));

        let fields = FieldDetector::new().detect_in_text("ФИО: ______");
        let data = parse_data_record(r#"{"client": "Иванов И.И."}"#).unwrap();
        let result = resolver.resolve(&fields, &data);

        assert_eq!(result.strategy, MappingStrategy::Semantic);
        assert!(result.iter().all(|m| m.value == Some(DataValue::from("Иванов И.И."))));
    }

    #[test]
    fn test_malformed_mapping_falls_back() {
        let backend = ScriptedBackend::new(vec![Ok("I think full_name is client".to_string())]);
        let resolver = MappingResolver::new().with_mapper(Box::new(LlmCollaborator::new(backend)));

        let fields = FieldDetector::new().detect_in_text("ФИО: ______");
        let data = parse_data_record(r#"{"full_name": "Петров П.П."}"#).unwrap();
        let result = resolver.resolve(&fields, &data);

        assert_eq!(result.strategy, MappingStrategy::RuleBased);
        assert_eq!(result.resolved_count(), result.len());
        assert_eq!(result, rule_based_mapping(&fields, &data));
    }

    #[test]
    fn test_naming_through_detector() {
        let backend = ScriptedBackend::new(vec![Ok(r#"["notes"]"#.to_string())]);
        let detector = FieldDetector::new().with_namer(Box::new(LlmCollaborator::new(backend)));

        let fields = detector.detect_in_text("Примечание: ....");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_name.as_deref(), Some("notes"));
    }

    #[test]
    fn test_naming_errors_map_to_collaborator_errors() {
        let collaborator = LlmCollaborator::new(ScriptedBackend::new(vec![
            Ok(r#"["a", "b"]"#.to_string()),
            Err(SemanticError::Timeout),
        ]));
        let request = NamingRequest {
            field_type: "dots".to_string(),
            text: "...".to_string(),
            context_before: String::new(),
            context_after: String::new(),
        };

        assert_eq!(
            collaborator.infer_field_names(std::slice::from_ref(&request)),
            Err(CollaboratorError::LengthMismatch { expected: 1, actual: 2 })
        );
        assert_eq!(
            collaborator.infer_field_names(&[request]),
            Err(CollaboratorError::Timeout)
        );
    }

    #[test]
    fn test_empty_naming_batch_skips_backend() {
        let collaborator = LlmCollaborator::new(ScriptedBackend::new(vec![]));
        assert_eq!(collaborator.infer_field_names(&[]), Ok(vec![]));
        assert!(collaborator.backend().prompts.lock().unwrap().is_empty());
    }
}
