//! Chat relay endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use super::ApiState;
use crate::relay::{GENERIC_FAILURE, RelayError, RelayRequest, RelayResponse};

/// Build chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .with_state(state)
}

/// Relay one conversation turn to the completion provider
///
/// The body is parsed by hand so malformed JSON is answered with the relay's
/// own `{ "error": .. }` shape instead of axum's rejection text.
async fn chat(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<RelayResponse>, ChatError> {
    let payload: serde_json::Value =
        serde_json::from_slice(&body).map_err(|e| ChatError::Malformed(e.to_string()))?;

    let request = RelayRequest::parse(&payload)?;
    tracing::debug!(
        messages = request.messages.len(),
        temperature = %request.temperature,
        "chat request"
    );

    let message = state.relay.forward(request).await?;

    Ok(Json(RelayResponse::Reply { message }))
}

/// Chat API errors
#[derive(Debug)]
pub enum ChatError {
    /// Body was not JSON
    Malformed(String),
    Relay(RelayError),
}

impl From<RelayError> for ChatError {
    fn from(e: RelayError) -> Self {
        Self::Relay(e)
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::Relay(RelayError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg.to_string())
            }
            Self::Relay(RelayError::ProviderFailure(msg)) | Self::Malformed(msg) => {
                tracing::error!(error = %msg, "chat API error");
                let msg = if msg.is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    msg
                };
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(RelayResponse::Failure { error })).into_response()
    }
}
