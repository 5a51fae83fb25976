//! Configuration structures for the detection and mapping pipeline.

use serde::{Deserialize, Serialize};

/// Main configuration for fieldfill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldFillConfig {
    /// Field detection configuration.
    pub detection: DetectionConfig,

    /// Semantic collaborator configuration.
    pub semantic: SemanticConfig,
}

/// Field detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Characters before a match inspected for keyword-based naming.
    pub inference_window: usize,

    /// Characters kept on each side of a match as its context.
    pub context_length: usize,

    /// Ask the semantic collaborator to name fields left unresolved.
    pub enhance_names: bool,

    /// Patterns appended after the built-in catalog.
    pub extra_patterns: Vec<PatternSpec>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            inference_window: 50,
            context_length: 30,
            enhance_names: true,
            extra_patterns: Vec::new(),
        }
    }
}

/// Declarative form of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Unique pattern name, reported as the field type.
    pub name: String,

    /// Regular expression.
    pub regex: String,

    /// How the field name is derived from a match.
    pub kind: PatternKindSpec,

    /// Fixed field name, required for marker patterns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKindSpec {
    Positional,
    Syntactic,
    Marker,
}

/// Semantic collaborator (LLM service) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// Use the semantic collaborator at all.
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,

    /// Model identifier.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Completion token limit.
    pub max_tokens: u32,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
            max_tokens: 512,
        }
    }
}

impl FieldFillConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: FieldFillConfig =
            serde_json::from_str(r#"{"semantic": {"enabled": true, "timeout_secs": 5}}"#).unwrap();

        assert!(config.semantic.enabled);
        assert_eq!(config.semantic.timeout_secs, 5);
        assert_eq!(config.semantic.model, "gpt-3.5-turbo");
        assert_eq!(config.detection.inference_window, 50);
        assert_eq!(config.detection.context_length, 30);
    }

    #[test]
    fn test_extra_pattern_spec() {
        let config: FieldFillConfig = serde_json::from_str(
            r#"{"detection": {"extra_patterns": [
                {"name": "inn_marker", "regex": "ИНН", "kind": "marker", "field_name": "inn"}
            ]}}"#,
        )
        .unwrap();

        let spec = &config.detection.extra_patterns[0];
        assert_eq!(spec.kind, PatternKindSpec::Marker);
        assert_eq!(spec.field_name.as_deref(), Some("inn"));
    }
}
