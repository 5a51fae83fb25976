//! Chat completion backends.

#[cfg(feature = "http")]
pub mod openai;

use crate::Result;

/// Trait for chat completion backends.
///
/// One prompt in, the completion text out. Implementations block until the
/// completion is available or the request fails.
pub trait ChatBackend: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}
