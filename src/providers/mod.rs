//! Completion provider abstraction
//!
//! The relay talks to a hosted language model through [`CompletionProvider`].
//! [`OpenAiProvider`] is the production backend; tests substitute stubs.

mod openai;

use async_trait::async_trait;
use serde::Serialize;

pub use openai::{DEFAULT_BASE_URL, OpenAiProvider};

use crate::Result;

/// A single chat completion call
///
/// Serializes directly to the `OpenAI` chat completions body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    /// Messages exactly as the caller supplied them
    pub messages: Vec<serde_json::Value>,
    /// Caller's temperature, unvalidated
    pub temperature: serde_json::Value,
    pub max_tokens: u32,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
}

/// Backend that turns a message list into a completion
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Run a single completion attempt
    ///
    /// Returns the first choice's text, or `None` when the provider produced
    /// no content.
    ///
    /// # Errors
    ///
    /// Returns error if the provider rejects the request or is unreachable
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>>;
}
