//! Error types for the semantic layer.

use fieldfill_core::CollaboratorError;
use thiserror::Error;

/// Errors that can occur while talking to a language model.
#[derive(Error, Debug)]
pub enum SemanticError {
    /// The API key environment variable is not set.
    #[error("API key not found in ${0}")]
    MissingApiKey(String),

    /// Request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The completion had no text.
    #[error("empty completion")]
    EmptyCompletion,

    /// The completion was not the JSON shape asked for.
    #[error("invalid reply: {0}")]
    InvalidReply(String),

    /// A positional reply did not line up with the request.
    #[error("expected {expected} names, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SemanticError> for CollaboratorError {
    fn from(err: SemanticError) -> Self {
        match err {
            SemanticError::MissingApiKey(_) => CollaboratorError::Unavailable,
            SemanticError::Http(msg) => CollaboratorError::Transport(msg),
            SemanticError::Status { status, message } => {
                CollaboratorError::Transport(format!("{}: {}", status, message))
            }
            SemanticError::Timeout => CollaboratorError::Timeout,
            SemanticError::LengthMismatch { expected, actual } => {
                CollaboratorError::LengthMismatch { expected, actual }
            }
            other @ (SemanticError::EmptyCompletion
            | SemanticError::InvalidReply(_)
            | SemanticError::Json(_)) => CollaboratorError::Malformed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_collaborator_error() {
        assert_eq!(
            CollaboratorError::from(SemanticError::Timeout),
            CollaboratorError::Timeout
        );
        assert_eq!(
            CollaboratorError::from(SemanticError::MissingApiKey("OPENAI_API_KEY".to_string())),
            CollaboratorError::Unavailable
        );
        assert_eq!(
            CollaboratorError::from(SemanticError::LengthMismatch { expected: 2, actual: 1 }),
            CollaboratorError::LengthMismatch { expected: 2, actual: 1 }
        );
        assert!(matches!(
            CollaboratorError::from(SemanticError::EmptyCompletion),
            CollaboratorError::Malformed(_)
        ));
    }
}
