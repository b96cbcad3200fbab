//! Configuration management for Uni-GPT
//!
//! Values resolve as env > `config.toml` > default.

pub mod file;

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::Result;
use crate::conversation::ControllerConfig;
use crate::providers::{CompletionProvider, DEFAULT_BASE_URL, OpenAiProvider};
use crate::relay::{DEFAULT_MODEL, RelayService};
use crate::voice::DEFAULT_LOCALE;

pub use file::{UniGptConfigFile, load_config_file};

/// Default port for the relay HTTP server
pub const DEFAULT_PORT: u16 = 3000;

/// Uni-GPT configuration
#[derive(Debug)]
pub struct Config {
    /// Completion provider settings (relay side)
    pub provider: ProviderConfig,

    /// HTTP server settings (relay side)
    pub server: ServerConfig,

    /// Conversation settings (controller side)
    pub conversation: ConversationConfig,
}

/// Completion provider settings
#[derive(Debug)]
pub struct ProviderConfig {
    /// `OpenAI` API key (from `OPENAI_API_KEY`)
    pub api_key: Option<SecretString>,

    /// Model identifier (from `OPENAI_MODEL`)
    pub model: String,

    /// API root (from `OPENAI_BASE_URL`)
    pub base_url: String,
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Directory with the browser front-end, served at `/`
    pub static_dir: Option<PathBuf>,
}

/// Conversation controller settings
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Relay base URL the controller talks to
    pub relay_url: String,

    /// Re-listen automatically after each reply
    pub continuous: bool,

    /// Recognition locale (e.g. "en-US")
    pub locale: String,

    /// Speech rate multiplier
    pub speech_rate: f32,
}

impl ConversationConfig {
    /// Controller policy built from these settings
    #[must_use]
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            continuous: self.continuous,
            locale: self.locale.clone(),
            speech_rate: self.speech_rate,
            ..ControllerConfig::default()
        }
    }
}

impl Config {
    /// Load configuration from the process environment and config file
    #[must_use]
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), load_config_file())
    }

    /// Resolve configuration from an env lookup and a parsed config file
    #[must_use]
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>, fc: UniGptConfigFile) -> Self {
        let provider = ProviderConfig {
            api_key: env("OPENAI_API_KEY")
                .or(fc.provider.api_key)
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            model: env("OPENAI_MODEL")
                .filter(|m| !m.is_empty())
                .or(fc.provider.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: env("OPENAI_BASE_URL")
                .or(fc.provider.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };

        let server = ServerConfig {
            port: env("UNIGPT_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            static_dir: env("UNIGPT_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
        };

        let conversation = ConversationConfig {
            relay_url: env("UNIGPT_RELAY_URL")
                .or(fc.conversation.relay_url)
                .unwrap_or_else(|| format!("http://localhost:{}", server.port)),
            continuous: env("UNIGPT_CONTINUOUS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .or(fc.conversation.continuous)
                .unwrap_or(false),
            locale: env("UNIGPT_LOCALE")
                .or(fc.conversation.locale)
                .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            speech_rate: env("UNIGPT_SPEECH_RATE")
                .and_then(|s| s.parse().ok())
                .or(fc.conversation.speech_rate)
                .unwrap_or(1.0),
        };

        Self {
            provider,
            server,
            conversation,
        }
    }

    /// Build the relay, with a provider when an API key is configured
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot be constructed
    pub fn build_relay(&self) -> Result<RelayService> {
        let provider: Option<Arc<dyn CompletionProvider>> = match &self.provider.api_key {
            Some(key) => Some(Arc::new(OpenAiProvider::with_base_url(
                key.expose_secret().to_string(),
                &self.provider.base_url,
            )?)),
            None => {
                tracing::warn!("OPENAI_API_KEY not set - chat requests will fail");
                None
            }
        };

        Ok(RelayService::new(provider, self.provider.model.clone()))
    }
}
