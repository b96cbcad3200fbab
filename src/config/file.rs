//! TOML configuration file loading
//!
//! Supports `~/.config/unigpt/config.toml` as a persistent config source.
//! Every field is optional and the file only overlays the defaults.

use std::path::PathBuf;

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct UniGptConfigFile {
    /// Completion provider configuration
    #[serde(default)]
    pub provider: ProviderFileConfig,

    /// Relay server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Conversation controller configuration
    #[serde(default)]
    pub conversation: ConversationFileConfig,
}

/// Completion provider configuration
#[derive(Debug, Default, Deserialize)]
pub struct ProviderFileConfig {
    pub api_key: Option<String>,

    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,

    /// API root for `OpenAI`-compatible endpoints
    pub base_url: Option<String>,
}

/// Relay server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    pub port: Option<u16>,

    /// Browser front-end directory
    pub static_dir: Option<String>,
}

/// Conversation controller configuration
#[derive(Debug, Default, Deserialize)]
pub struct ConversationFileConfig {
    pub relay_url: Option<String>,
    pub continuous: Option<bool>,
    pub locale: Option<String>,
    pub speech_rate: Option<f32>,
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the contents are not valid TOML for this schema
pub fn parse_config_file(content: &str) -> Result<UniGptConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file from the standard path
///
/// Returns `UniGptConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> UniGptConfigFile {
    let Some(path) = config_file_path() else {
        return UniGptConfigFile::default();
    };

    if !path.exists() {
        return UniGptConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                UniGptConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            UniGptConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/unigpt/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("unigpt").join("config.toml"))
}
