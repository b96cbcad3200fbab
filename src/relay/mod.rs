//! Chat relay: validates conversation payloads and forwards them to a
//! completion provider
//!
//! The relay is stateless. Each call carries the caller's messages and
//! temperature; generation limits are fixed by the relay.

mod client;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use client::{HttpRelayClient, RELAY_FAILURE, RelayClient};

use crate::Result;
use crate::conversation::Message;
use crate::providers::{CompletionProvider, CompletionRequest};

/// Temperature used when the caller omits one
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Model used when no override is configured
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Ceiling on generated tokens per reply
pub const MAX_TOKENS: u32 = 500;

/// Presence penalty applied to every call
pub const PRESENCE_PENALTY: f64 = 0.6;

/// Frequency penalty applied to every call
pub const FREQUENCY_PENALTY: f64 = 0.3;

/// Reply text when the provider returns no content
pub const NO_RESPONSE: &str = "No response generated";

/// Rejection text for payloads without a `messages` array
pub const MESSAGES_REQUIRED: &str = "Messages array is required";

/// Error text when a failure carries no message of its own
pub const GENERIC_FAILURE: &str = "Internal server error";

/// Generation limits layered over each request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: MAX_TOKENS,
            presence_penalty: PRESENCE_PENALTY,
            frequency_penalty: FREQUENCY_PENALTY,
        }
    }
}

/// A validated relay payload
///
/// Messages are kept as raw JSON: the relay does not check individual
/// message shape, the provider does.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelayRequest {
    pub messages: Vec<serde_json::Value>,
    pub temperature: serde_json::Value,
}

impl RelayRequest {
    /// Build a request from typed messages
    ///
    /// # Errors
    ///
    /// Returns error if a message cannot be serialized
    pub fn from_messages(messages: &[Message], temperature: f64) -> Result<Self> {
        let messages = messages
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            messages,
            temperature: temperature.into(),
        })
    }

    /// Validate an incoming JSON payload
    ///
    /// `messages` must be present and an array. `temperature` falls back to
    /// [`DEFAULT_TEMPERATURE`] only when the key is absent; any other value,
    /// `null` included, is passed on for the provider to judge.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidInput`] when `messages` is missing or not an array
    pub fn parse(payload: &serde_json::Value) -> std::result::Result<Self, RelayError> {
        let Some(messages) = payload.get("messages").and_then(serde_json::Value::as_array)
        else {
            return Err(RelayError::InvalidInput(MESSAGES_REQUIRED));
        };

        let temperature = payload
            .get("temperature")
            .cloned()
            .unwrap_or_else(|| DEFAULT_TEMPERATURE.into());

        Ok(Self {
            messages: messages.clone(),
            temperature,
        })
    }
}

/// Relay reply body
///
/// Serializes to `{ "message": .. }` or `{ "error": .. }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelayResponse {
    Reply { message: String },
    Failure { error: String },
}

/// Why a relay call was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Malformed payload; the caller must fix it
    #[error("{0}")]
    InvalidInput(&'static str),

    /// The provider failed or is not configured
    #[error("{0}")]
    ProviderFailure(String),
}

/// Forwards validated requests to a completion provider
pub struct RelayService {
    provider: Option<Arc<dyn CompletionProvider>>,
    model: String,
    params: GenerationParams,
}

impl RelayService {
    /// Create a relay with default generation limits
    #[must_use]
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            params: GenerationParams::default(),
        }
    }

    /// Override generation limits
    #[must_use]
    pub const fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Whether a provider is available to serve calls
    #[must_use]
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub const fn params(&self) -> GenerationParams {
        self.params
    }

    /// Forward a request and return the reply text
    ///
    /// One attempt, no retry.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ProviderFailure`] if the provider is missing or fails
    pub async fn forward(&self, request: RelayRequest) -> std::result::Result<String, RelayError> {
        let Some(provider) = &self.provider else {
            tracing::error!("relay called without a configured completion provider");
            return Err(RelayError::ProviderFailure(
                "completion provider is not configured (set OPENAI_API_KEY)".to_string(),
            ));
        };

        let completion = CompletionRequest {
            model: self.model.clone(),
            messages: request.messages,
            temperature: request.temperature,
            max_tokens: self.params.max_tokens,
            presence_penalty: self.params.presence_penalty,
            frequency_penalty: self.params.frequency_penalty,
        };

        match provider.complete(&completion).await {
            Ok(content) => {
                let message = content.unwrap_or_else(|| NO_RESPONSE.to_string());
                tracing::debug!(
                    provider = provider.name(),
                    reply_len = message.len(),
                    "completion succeeded"
                );
                Ok(message)
            }
            Err(e) => {
                tracing::error!(
                    provider = provider.name(),
                    error = %e,
                    "completion provider error"
                );
                let message = e.to_string();
                Err(RelayError::ProviderFailure(if message.is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    message
                }))
            }
        }
    }
}
