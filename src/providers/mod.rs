/*!
 * Translation backend implementations.
 *
 * This module contains client implementations for text-generation backends:
 * - OpenAI: OpenAI-compatible chat-completions APIs
 * - Mock: deterministic in-process backend for tests and dry runs
 */

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::errors::ProviderError;

/// One translated batch, keyed positionally.
///
/// Keys are the 0-based positions of the sentences within the submitted
/// batch, as strings. The pipeline validates that the key set matches the
/// batch it sent.
#[derive(Debug, Clone, Default)]
pub struct BatchTranslation {
    /// Positional key -> translated text
    pub output: HashMap<String, String>,
}

/// Common trait for all translation backends
///
/// This trait defines the interface that all backend implementations must
/// follow, allowing them to be used interchangeably by the pipeline.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Translate one batch framed as a system prompt plus a positional
    /// JSON user prompt
    ///
    /// # Arguments
    /// * `system_prompt` - Instructions rendered for the language pair
    /// * `user_prompt` - Positional JSON map of the batch
    ///
    /// # Returns
    /// * `Result<BatchTranslation, ProviderError>` - The positional output
    ///   map or an error
    async fn translate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<BatchTranslation, ProviderError>;

    /// Test the connection to the backend
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

pub mod mock;
pub mod openai;
