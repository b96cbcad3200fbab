//! Terminal stand-ins for speech capabilities
//!
//! Typed lines play the role of recognized utterances and replies are printed
//! instead of spoken. Used by `uni-gpt chat`.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use super::{
    RecognitionEvent, SpeechRecognizer, SpeechSynthesizer, SynthesisEvent, Utterance, Voice,
};
use crate::conversation::Input;
use crate::{Error, Result};

/// Recognizer that takes the next typed line as the transcript
pub struct ConsoleRecognizer {
    lines: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    events: mpsc::UnboundedSender<Input>,
    session: Option<JoinHandle<()>>,
}

impl ConsoleRecognizer {
    /// Create a recognizer reading from `lines` and reporting to `events`
    #[must_use]
    pub fn new(
        lines: mpsc::UnboundedReceiver<String>,
        events: mpsc::UnboundedSender<Input>,
    ) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
            events,
            session: None,
        }
    }

    fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.abort();
        }
    }
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn start(&mut self, locale: &str) -> Result<()> {
        if self.events.is_closed() {
            return Err(Error::Recognition("controller input closed".to_string()));
        }

        // A new session supersedes the old one
        self.end_session();

        let lines = Arc::clone(&self.lines);
        let events = self.events.clone();
        tracing::debug!(locale, "console recognition started");

        self.session = Some(tokio::spawn(async move {
            let _ = events.send(Input::Recognition(RecognitionEvent::Started));

            let next = lines.lock().await.recv().await;
            let event = next.map_or_else(
                || RecognitionEvent::Error("input closed".to_string()),
                RecognitionEvent::Result,
            );
            let _ = events.send(Input::Recognition(event));
            let _ = events.send(Input::Recognition(RecognitionEvent::Ended));
        }));

        Ok(())
    }

    fn stop(&mut self) {
        self.end_session();
        let _ = self.events.send(Input::Recognition(RecognitionEvent::Ended));
    }

    fn abort(&mut self) {
        self.end_session();
    }
}

impl Drop for ConsoleRecognizer {
    fn drop(&mut self) {
        self.end_session();
    }
}

/// Synthesizer that prints replies to stdout
pub struct ConsoleSynthesizer {
    events: mpsc::UnboundedSender<Input>,
    voices: Vec<Voice>,
}

impl ConsoleSynthesizer {
    #[must_use]
    pub fn new(events: mpsc::UnboundedSender<Input>) -> Self {
        Self {
            events,
            voices: vec![Voice::new("Uni-GPT", super::DEFAULT_LOCALE)],
        }
    }
}

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&mut self, utterance: Utterance) -> Result<()> {
        let speaker = utterance
            .voice
            .as_ref()
            .map_or("assistant", |v| v.name.as_str());

        let _ = self.events.send(Input::Synthesis(SynthesisEvent::Started));
        println!("{speaker}> {}", utterance.text);
        let _ = self.events.send(Input::Synthesis(SynthesisEvent::Ended));

        Ok(())
    }

    fn cancel(&mut self) {
        // Printing is synchronous, nothing is ever in flight
    }
}
