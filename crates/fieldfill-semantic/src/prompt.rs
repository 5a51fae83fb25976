//! Prompt construction and reply parsing.

use fieldfill_core::{MappingTable, NamingRequest};
use serde_json::Value;

use crate::Result;
use crate::error::SemanticError;

/// Prompt asking for a field-name to data-key table.
pub fn mapping_prompt(field_names: &[String], data_keys: &[String]) -> String {
    format!(
        "You are an expert in field mapping for documents.\n\
         Detected fields: {}\n\
         Available data keys: {}\n\n\
         Map each detected field to the best matching data key, or null if no good match.\n\
         Output as JSON object where keys are field names and values are data keys or null.",
        field_names.join(", "),
        data_keys.join(", ")
    )
}

/// Prompt asking for one name per unresolved field.
pub fn naming_prompt(requests: &[NamingRequest]) -> String {
    let fields: Vec<String> = requests
        .iter()
        .map(|r| {
            format!(
                "{}: {} (context before: {}, after: {})",
                r.field_type, r.text, r.context_before, r.context_after
            )
        })
        .collect();

    format!(
        "Infer field names for these unnamed fields in a document:\n{}\n\n\
         Output a JSON list with exactly {} entries, one snake_case field name or null per field, in order.",
        fields.join("; "),
        requests.len()
    )
}

/// Parse a mapping reply: an object of string or null values.
pub fn parse_mapping_reply(reply: &str) -> Result<MappingTable> {
    let Value::Object(object) = serde_json::from_str::<Value>(strip_code_fence(reply))? else {
        return Err(SemanticError::InvalidReply("expected a JSON object".to_string()));
    };

    object
        .into_iter()
        .map(|(field, key)| match key {
            Value::String(key) => Ok((field, Some(key))),
            Value::Null => Ok((field, None)),
            other => Err(SemanticError::InvalidReply(format!(
                "value for '{}' is not a string or null: {}",
                field, other
            ))),
        })
        .collect()
}

/// Parse a naming reply: an array of exactly `expected` strings or nulls.
pub fn parse_naming_reply(reply: &str, expected: usize) -> Result<Vec<Option<String>>> {
    let Value::Array(items) = serde_json::from_str::<Value>(strip_code_fence(reply))? else {
        return Err(SemanticError::InvalidReply("expected a JSON array".to_string()));
    };

    if items.len() != expected {
        return Err(SemanticError::LengthMismatch {
            expected,
            actual: items.len(),
        });
    }

    items
        .into_iter()
        .map(|item| match item {
            Value::String(name) => Ok(Some(name)),
            Value::Null => Ok(None),
            other => Err(SemanticError::InvalidReply(format!(
                "name is not a string or null: {}",
                other
            ))),
        })
        .collect()
}

/// Strip a Markdown code fence around a reply, if there is one.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) up to the first newline.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mapping_prompt_lists_names_and_keys() {
        let prompt = mapping_prompt(
            &["full_name".to_string(), "date".to_string()],
            &["client".to_string(), "signed_on".to_string()],
        );
        assert!(prompt.contains("Detected fields: full_name, date"));
        assert!(prompt.contains("Available data keys: client, signed_on"));
    }

    #[test]
    fn test_naming_prompt_includes_context() {
        let prompt = naming_prompt(&[NamingRequest {
            field_type: "dots".to_string(),
            text: "....".to_string(),
            context_before: "Примечание:".to_string(),
            context_after: String::new(),
        }]);
        assert!(prompt.contains("dots: .... (context before: Примечание:, after: )"));
        assert!(prompt.contains("exactly 1 entries"));
    }

    #[test]
    fn test_parse_mapping_reply() {
        let table = parse_mapping_reply(r#"{"full_name": "client", "date": null}"#).unwrap();
        assert_eq!(table.get("full_name"), Some(&Some("client".to_string())));
        assert_eq!(table.get("date"), Some(&None));
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "```json\n{\"inn\": \"tax_id\"}\n```";
        let table = parse_mapping_reply(reply).unwrap();
        assert_eq!(table.get("inn"), Some(&Some("tax_id".to_string())));

        let names = parse_naming_reply("```\n[\"notes\", null]\n```", 2).unwrap();
        assert_eq!(names, vec![Some("notes".to_string()), None]);
    }

    #[test]
    fn test_rejects_wrong_shapes() {
        assert!(matches!(
            parse_mapping_reply("[\"a\"]"),
            Err(SemanticError::InvalidReply(_))
        ));
        assert!(matches!(
            parse_mapping_reply(r#"{"a": 1}"#),
            Err(SemanticError::InvalidReply(_))
        ));
        assert!(matches!(
            parse_mapping_reply("Sure! Here is the mapping"),
            Err(SemanticError::Json(_))
        ));
        assert!(matches!(
            parse_naming_reply(r#"[["nested"]]"#, 1),
            Err(SemanticError::InvalidReply(_))
        ));
    }

    #[test]
    fn test_naming_length_must_match() {
        let err = parse_naming_reply(r#"["a"]"#, 2).unwrap_err();
        assert!(matches!(
            err,
            SemanticError::LengthMismatch { expected: 2, actual: 1 }
        ));
    }
}
