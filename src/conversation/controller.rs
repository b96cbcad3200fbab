//! Turn-taking state machine
//!
//! ```text
//!   Idle ──activate──▶ Listening ──transcript──▶ Thinking ──reply──▶ Speaking
//!    ▲                   │  end / error / stop                          │
//!    └───────────────────┴──────────────── speech ended ◀───────────────┘
//!                                   (continuous: re-listen after a delay)
//! ```
//!
//! All input arrives through [`Controller::handle`], one event at a time. The
//! relay call is the only await inside a transition, so history and state
//! are never touched concurrently.

use std::time::Duration;

use tokio::sync::mpsc;

use super::{ConversationHistory, Message};
use crate::Result;
use crate::prompt::{self, DEFAULT_HISTORY_WINDOW, SYSTEM_PROMPT};
use crate::relay::{DEFAULT_TEMPERATURE, RelayClient, RelayRequest};
use crate::voice::{
    self, DEFAULT_LOCALE, RecognitionEvent, SpeechRecognizer, SpeechSynthesizer, SynthesisEvent,
    Utterance, Voice,
};

pub const STATUS_IDLE: &str = "Click to start";
pub const STATUS_LISTENING: &str = "Listening...";
pub const STATUS_THINKING: &str = "Thinking...";
pub const STATUS_SPEAKING: &str = "Speaking...";

/// Prefix of the spoken reply when the relay call fails
const ERROR_REPLY_PREFIX: &str = "Sorry, I encountered an error: ";

/// Pause between the end of a reply and automatic re-listening
pub const DEFAULT_RELISTEN_DELAY: Duration = Duration::from_millis(500);

/// Where the controller is in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Listening,
    Thinking,
    Speaking,
    /// Passed through while a recognition or synthesis failure is reported
    Error,
}

/// Everything the controller reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Mic button: stop if listening, otherwise start
    Toggle,
    Activate,
    Deactivate,
    Recognition(RecognitionEvent),
    Synthesis(SynthesisEvent),
    /// Automatic re-listen timer fired; carries the arming generation
    RelistenDue(u64),
    /// The platform's voice list changed
    VoicesChanged,
    SetContinuous(bool),
    /// Clear the conversation and go idle
    Reset,
}

/// Delivers an input back to the controller after a delay
pub trait Scheduler: Send {
    fn schedule(&self, delay: Duration, input: Input);
}

/// State change notification for a front-end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub state: TurnState,
    pub status: String,
}

/// Conversation policy
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub system_prompt: String,
    /// Prior history entries sent with each request
    pub history_window: usize,
    pub temperature: f64,
    /// Re-listen automatically after each reply
    pub continuous: bool,
    pub relisten_delay: Duration,
    pub locale: String,
    pub speech_rate: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
            temperature: DEFAULT_TEMPERATURE,
            continuous: false,
            relisten_delay: DEFAULT_RELISTEN_DELAY,
            locale: DEFAULT_LOCALE.to_string(),
            speech_rate: 1.0,
        }
    }
}

/// Owns the conversation and drives speech capabilities
pub struct Controller {
    recognizer: Box<dyn SpeechRecognizer>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    relay: Box<dyn RelayClient>,
    scheduler: Box<dyn Scheduler>,
    config: ControllerConfig,
    state: TurnState,
    status: String,
    history: ConversationHistory,
    voice: Option<Voice>,
    /// Bumped whenever a pending re-listen should no longer fire
    relisten_generation: u64,
    status_tx: Option<mpsc::UnboundedSender<StatusUpdate>>,
}

impl Controller {
    /// Create an idle controller with injected capabilities
    #[must_use]
    pub fn new(
        recognizer: impl SpeechRecognizer + 'static,
        synthesizer: impl SpeechSynthesizer + 'static,
        relay: impl RelayClient + 'static,
        scheduler: impl Scheduler + 'static,
        config: ControllerConfig,
    ) -> Self {
        let voice = voice::select_voice(&synthesizer.voices(), &config.locale);

        Self {
            recognizer: Box::new(recognizer),
            synthesizer: Box::new(synthesizer),
            relay: Box::new(relay),
            scheduler: Box::new(scheduler),
            config,
            state: TurnState::Idle,
            status: STATUS_IDLE.to_string(),
            history: ConversationHistory::new(),
            voice,
            relisten_generation: 0,
            status_tx: None,
        }
    }

    /// Report every state change on `tx`
    #[must_use]
    pub fn with_status_sink(mut self, tx: mpsc::UnboundedSender<StatusUpdate>) -> Self {
        self.status_tx = Some(tx);
        self
    }

    #[must_use]
    pub const fn state(&self) -> TurnState {
        self.state
    }

    /// Human-readable status line
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Full transcript, including turns outside the prompt window
    #[must_use]
    pub const fn history(&self) -> &ConversationHistory {
        &self.history
    }

    #[must_use]
    pub const fn is_continuous(&self) -> bool {
        self.config.continuous
    }

    #[must_use]
    pub const fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    /// Apply one input
    pub async fn handle(&mut self, input: Input) {
        match input {
            Input::Toggle => {
                if self.state == TurnState::Listening {
                    self.stop_listening();
                } else {
                    self.start_listening();
                }
            }
            Input::Activate => self.start_listening(),
            Input::Deactivate => self.stop_listening(),
            Input::Recognition(event) => self.on_recognition(event).await,
            Input::Synthesis(event) => self.on_synthesis(event),
            Input::RelistenDue(generation) => self.on_relisten_due(generation),
            Input::VoicesChanged => self.reload_voice(),
            Input::SetContinuous(enabled) => self.set_continuous(enabled),
            Input::Reset => self.reset(),
        }
    }

    fn start_listening(&mut self) {
        match self.state {
            TurnState::Listening => {
                tracing::debug!("already listening");
                return;
            }
            TurnState::Thinking => {
                tracing::debug!("ignoring activation while waiting for a reply");
                return;
            }
            TurnState::Speaking => {
                // Barge-in: listening always preempts speech
                self.synthesizer.cancel();
                tracing::debug!("cancelled speech to start listening");
            }
            TurnState::Idle | TurnState::Error => {}
        }

        self.relisten_generation += 1;

        match self.recognizer.start(&self.config.locale) {
            Ok(()) => self.set_state(TurnState::Listening, STATUS_LISTENING),
            Err(e) => {
                tracing::warn!(error = %e, "failed to start recognition");
                self.set_state(TurnState::Idle, STATUS_IDLE);
            }
        }
    }

    fn stop_listening(&mut self) {
        if self.state != TurnState::Listening {
            return;
        }

        self.recognizer.stop();
        self.set_state(TurnState::Idle, STATUS_IDLE);
    }

    async fn on_recognition(&mut self, event: RecognitionEvent) {
        if self.state != TurnState::Listening {
            tracing::debug!(?event, state = ?self.state, "ignoring recognition event");
            return;
        }

        match event {
            RecognitionEvent::Started => tracing::debug!("recognition started"),
            RecognitionEvent::Result(transcript) => {
                let transcript = transcript.trim();
                if transcript.is_empty() {
                    tracing::debug!("empty transcript");
                    return;
                }
                self.handle_utterance(transcript.to_string()).await;
            }
            RecognitionEvent::Error(reason) => {
                tracing::warn!(error = %reason, "speech recognition error");
                self.fail(format!("Error: {reason}"));
            }
            RecognitionEvent::Ended => self.set_state(TurnState::Idle, STATUS_IDLE),
        }
    }

    async fn handle_utterance(&mut self, transcript: String) {
        tracing::info!(transcript = %transcript, "user utterance");

        let user = Message::user(&transcript);
        let messages = prompt::build_relay_messages(
            &self.config.system_prompt,
            &self.history,
            self.config.history_window,
            &user,
        );
        self.history.push_user(transcript);
        self.set_state(TurnState::Thinking, STATUS_THINKING);

        // A failed call still becomes an assistant turn so it shows in the transcript
        let reply = match request_reply(self.relay.as_ref(), &messages, self.config.temperature)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "error getting AI response");
                format!("{ERROR_REPLY_PREFIX}{e}")
            }
        };

        self.history.push_assistant(reply.clone());
        self.speak(reply);
    }

    fn speak(&mut self, text: String) {
        self.synthesizer.cancel();

        let utterance = Utterance {
            text,
            voice: self.voice.clone(),
            rate: self.config.speech_rate,
            pitch: 1.0,
            volume: 1.0,
        };

        match self.synthesizer.speak(utterance) {
            Ok(()) => self.set_state(TurnState::Speaking, STATUS_SPEAKING),
            Err(e) => {
                tracing::warn!(error = %e, "speech synthesis error");
                self.fail(STATUS_IDLE.to_string());
            }
        }
    }

    fn on_synthesis(&mut self, event: SynthesisEvent) {
        if self.state != TurnState::Speaking {
            tracing::debug!(?event, state = ?self.state, "ignoring synthesis event");
            return;
        }

        match event {
            SynthesisEvent::Started => tracing::debug!("speech started"),
            SynthesisEvent::Ended => {
                if self.config.continuous {
                    self.relisten_generation += 1;
                    self.scheduler.schedule(
                        self.config.relisten_delay,
                        Input::RelistenDue(self.relisten_generation),
                    );
                    let status = self.status.clone();
                    self.set_state(TurnState::Idle, status);
                } else {
                    self.set_state(TurnState::Idle, STATUS_IDLE);
                }
            }
            SynthesisEvent::Error(reason) => {
                tracing::warn!(error = %reason, "speech synthesis error");
                self.fail(STATUS_IDLE.to_string());
            }
        }
    }

    fn on_relisten_due(&mut self, generation: u64) {
        if generation != self.relisten_generation {
            tracing::debug!(generation, "stale re-listen timer");
            return;
        }
        if !self.config.continuous || self.state != TurnState::Idle {
            return;
        }

        self.start_listening();
    }

    fn reload_voice(&mut self) {
        self.voice = voice::select_voice(&self.synthesizer.voices(), &self.config.locale);
        tracing::debug!(voice = ?self.voice.as_ref().map(|v| &v.name), "voice selected");
    }

    fn set_continuous(&mut self, enabled: bool) {
        self.config.continuous = enabled;
        if !enabled {
            self.relisten_generation += 1;
        }
        tracing::info!(enabled, "continuous mode");
    }

    fn reset(&mut self) {
        self.synthesizer.cancel();
        if self.state == TurnState::Listening {
            self.recognizer.abort();
        }

        self.relisten_generation += 1;
        self.history.clear();
        self.set_state(TurnState::Idle, STATUS_IDLE);
        tracing::info!("conversation reset");
    }

    /// Report a failure, then settle back to idle
    fn fail(&mut self, status: String) {
        self.set_state(TurnState::Error, status.clone());
        self.set_state(TurnState::Idle, status);
    }

    fn set_state(&mut self, state: TurnState, status: impl Into<String>) {
        if state != self.state {
            tracing::debug!(from = ?self.state, to = ?state, "turn state changed");
        }

        self.state = state;
        self.status = status.into();

        if let Some(tx) = &self.status_tx {
            let _ = tx.send(StatusUpdate {
                state,
                status: self.status.clone(),
            });
        }
    }
}

async fn request_reply(
    relay: &dyn RelayClient,
    messages: &[Message],
    temperature: f64,
) -> Result<String> {
    let request = RelayRequest::from_messages(messages, temperature)?;
    relay.chat(request).await
}
