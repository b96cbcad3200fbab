//! Controller-side access to the relay

use async_trait::async_trait;

use super::{RelayRequest, RelayResponse, RelayService};
use crate::{Error, Result};

/// Error text for any non-success relay status
pub const RELAY_FAILURE: &str = "Failed to get response from AI";

/// How the conversation controller reaches the relay
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Send one request and return the reply text
    ///
    /// # Errors
    ///
    /// Returns error if the relay rejects the request or cannot be reached
    async fn chat(&self, request: RelayRequest) -> Result<String>;
}

/// Calls a relay over HTTP (`POST <base>/api/chat`)
#[derive(Debug, Clone)]
pub struct HttpRelayClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRelayClient {
    /// Create a client for the relay at `base_url`
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn chat(&self, request: RelayRequest) -> Result<String> {
        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "relay returned failure status");
            return Err(Error::Relay(RELAY_FAILURE.to_string()));
        }

        match response.json::<RelayResponse>().await? {
            RelayResponse::Reply { message } => Ok(message),
            RelayResponse::Failure { error } => Err(Error::Relay(error)),
        }
    }
}

/// In-process relay, skipping HTTP
#[async_trait]
impl RelayClient for RelayService {
    async fn chat(&self, request: RelayRequest) -> Result<String> {
        self.forward(request)
            .await
            .map_err(|e| Error::Relay(e.to_string()))
    }
}
