//! Speech capabilities used by the conversation controller
//!
//! Recognition and synthesis are platform services. The controller only sees
//! these traits; events flow back to it as [`RecognitionEvent`] and
//! [`SynthesisEvent`] values on its input channel.

mod console;

pub use console::{ConsoleRecognizer, ConsoleSynthesizer};

use crate::Result;

/// Default recognition locale
pub const DEFAULT_LOCALE: &str = "en-US";

/// Voices whose name contains this are preferred
const PREFERRED_VOICE_VENDOR: &str = "Google";

/// A synthesis voice offered by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

impl Voice {
    #[must_use]
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// One piece of text to speak
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// `None` lets the platform pick
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Events raised by a recognition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Started,
    /// Final transcript for the session
    Result(String),
    Error(String),
    Ended,
}

/// Events raised while speaking an utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisEvent {
    Started,
    Ended,
    Error(String),
}

/// Single-shot speech recognizer
///
/// Each `start` produces at most one transcript. Starting again supersedes
/// any session still running.
pub trait SpeechRecognizer: Send {
    /// Begin a recognition session
    ///
    /// # Errors
    ///
    /// Returns error if the platform refuses to start listening
    fn start(&mut self, locale: &str) -> Result<()>;

    /// Stop listening and deliver whatever was heard
    fn stop(&mut self);

    /// Stop listening and discard the session
    fn abort(&mut self);
}

/// Text-to-speech output
pub trait SpeechSynthesizer: Send {
    /// Voices currently available
    fn voices(&self) -> Vec<Voice>;

    /// Queue an utterance for playback
    ///
    /// # Errors
    ///
    /// Returns error if the utterance cannot be played
    fn speak(&mut self, utterance: Utterance) -> Result<()>;

    /// Stop playback immediately
    fn cancel(&mut self);
}

/// Pick the voice to speak with
///
/// Prefers a Google voice for `locale`, then falls back to the first voice.
#[must_use]
pub fn select_voice(voices: &[Voice], locale: &str) -> Option<Voice> {
    voices
        .iter()
        .find(|v| v.name.contains(PREFERRED_VOICE_VENDOR) && v.lang == locale)
        .or_else(|| voices.first())
        .cloned()
}
