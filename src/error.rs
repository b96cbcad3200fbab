//! Error types for Uni-GPT

use thiserror::Error;

/// Result type alias for Uni-GPT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the relay or the conversation controller
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Completion provider rejected the request or was unreachable
    #[error("{0}")]
    Provider(String),

    /// Relay call failed (as seen by the controller)
    #[error("{0}")]
    Relay(String),

    /// Speech recognition error
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Speech synthesis error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
