//! Uni-GPT - voice assistant for UniQube pods
//!
//! Two halves:
//! - A stateless chat relay that validates conversation payloads and forwards
//!   them to an `OpenAI`-compatible completion provider
//! - A conversation controller that turns speech into relay calls and speaks
//!   the replies, one turn at a time
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            Conversation controller            │
//! │  Recognizer  │  History  │  Synthesizer       │
//! └──────────────────────┬───────────────────────┘
//!                        │ POST /api/chat
//! ┌──────────────────────▼───────────────────────┐
//! │                  Chat relay                   │
//! │  Validation  │  Fixed generation params       │
//! └──────────────────────┬───────────────────────┘
//!                        │
//! ┌──────────────────────▼───────────────────────┐
//! │          Completion provider (OpenAI)         │
//! └──────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod prompt;
pub mod providers;
pub mod relay;
pub mod voice;

pub use config::Config;
pub use conversation::{
    ConversationHistory, Controller, ControllerConfig, Input, Message, Role, StatusUpdate,
    TurnState,
};
pub use error::{Error, Result};
pub use relay::{RelayClient, RelayRequest, RelayResponse, RelayService};
