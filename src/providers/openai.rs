//! `OpenAI` chat completions backend

use async_trait::async_trait;
use serde::Deserialize;

use super::{CompletionProvider, CompletionRequest};
use crate::{Error, Result};

/// Default API root for `OpenAI`
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat completion response (only the fields the relay reads)
#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Error envelope returned on non-2xx responses
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Completion provider backed by the `OpenAI` chat completions API
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a provider against the public `OpenAI` API
    ///
    /// # Errors
    ///
    /// Returns error if API key is empty
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a provider against a compatible API root
    ///
    /// # Errors
    ///
    /// Returns error if API key is empty
    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for chat completions".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .filter(|m| !m.is_empty());

            // Mirror the SDK's "<status> <message>" shape
            let message = detail.map_or_else(
                || format!("{} status code (no body)", status.as_u16()),
                |m| format!("{} {m}", status.as_u16()),
            );
            return Err(Error::Provider(message));
        }

        let completion: ChatCompletion = response.json().await?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty()))
    }
}
