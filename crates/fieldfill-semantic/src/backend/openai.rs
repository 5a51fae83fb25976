//! OpenAI-compatible chat completions over blocking HTTP.

use std::time::Duration;

use fieldfill_core::models::config::SemanticConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::ChatBackend;
use crate::Result;
use crate::error::SemanticError;

/// Backend for any service exposing `POST {base_url}/chat/completions`.
pub struct OpenAiBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiBackend {
    /// Create a backend from explicit settings.
    pub fn new(config: &SemanticConfig, api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SemanticError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Create a backend reading the API key from the configured variable.
    pub fn from_config(config: &SemanticConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| SemanticError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(config, api_key)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl ChatBackend for OpenAiBackend {
    fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: 0.0,
        };

        debug!("Requesting completion from {} ({})", self.endpoint, self.model);

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .map_err(transport_error)?;

        let status = resp.status();
        let body = resp.text().map_err(transport_error)?;
        trace!("Completion response body: {}", body);

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(SemanticError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let response: ChatResponse = serde_json::from_str(&body)?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(SemanticError::EmptyCompletion)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn transport_error(err: reqwest::Error) -> SemanticError {
    if err.is_timeout() {
        SemanticError::Timeout
    } else {
        SemanticError::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_base_url() {
        let config = SemanticConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..SemanticConfig::default()
        };
        let backend = OpenAiBackend::new(&config, "key".to_string()).unwrap();
        assert_eq!(backend.endpoint, "http://localhost:8080/v1/chat/completions");
        assert_eq!(backend.model(), "gpt-3.5-turbo");
    }

    #[test]
    fn test_missing_api_key() {
        let config = SemanticConfig {
            api_key_env: "FIELDFILL_TEST_UNSET_KEY_VARIABLE".to_string(),
            ..SemanticConfig::default()
        };
        let err = OpenAiBackend::from_config(&config).err().unwrap();
        assert!(matches!(err, SemanticError::MissingApiKey(ref var) if var == "FIELDFILL_TEST_UNSET_KEY_VARIABLE"));
    }

    #[test]
    fn test_unreachable_service() {
        let config = SemanticConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..SemanticConfig::default()
        };
        let backend = OpenAiBackend::new(&config, "key".to_string()).unwrap();
        let err = backend.complete("ping").unwrap_err();
        assert!(matches!(err, SemanticError::Http(_) | SemanticError::Timeout));
    }
}
