//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uni_gpt::api::ApiServerBuilder;
use uni_gpt::conversation::{Input, Scheduler, StatusUpdate};
use uni_gpt::providers::{CompletionProvider, CompletionRequest};
use uni_gpt::voice::{SpeechRecognizer, SpeechSynthesizer, Utterance, Voice};
use uni_gpt::{Controller, ControllerConfig, Error, RelayClient, RelayRequest, RelayService, Result};

/// What a [`StubProvider`] answers with
#[derive(Debug, Clone)]
pub enum StubReply {
    Text(String),
    Empty,
    Fail(String),
}

/// Completion provider that records requests and returns a canned reply
#[derive(Clone)]
pub struct StubProvider {
    reply: StubReply,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl StubProvider {
    pub fn new(reply: StubReply) -> Self {
        Self {
            reply,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn text(reply: &str) -> Self {
        Self::new(StubReply::Text(reply.to_string()))
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            StubReply::Text(text) => Ok(Some(text.clone())),
            StubReply::Empty => Ok(None),
            StubReply::Fail(message) => Err(Error::Provider(message.clone())),
        }
    }
}

/// Relay backed by `provider`, or with no provider at all
pub fn test_relay(provider: Option<&StubProvider>) -> RelayService {
    let provider = provider.map(|p| Arc::new(p.clone()) as Arc<dyn CompletionProvider>);
    RelayService::new(provider, "gpt-4o-mini")
}

/// Build a test API router
pub fn build_test_router(provider: Option<&StubProvider>) -> axum::Router {
    ApiServerBuilder::new(test_relay(provider), 0).build().router()
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("no local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server failed");
    });
    format!("http://{addr}")
}

/// Recognizer that only records the calls made on it
pub struct MockRecognizer {
    calls: Arc<Mutex<Vec<&'static str>>>,
    fail_start: bool,
}

impl SpeechRecognizer for MockRecognizer {
    fn start(&mut self, _locale: &str) -> Result<()> {
        self.calls.lock().unwrap().push("start");
        if self.fail_start {
            return Err(Error::Recognition("microphone unavailable".to_string()));
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.calls.lock().unwrap().push("stop");
    }

    fn abort(&mut self) {
        self.calls.lock().unwrap().push("abort");
    }
}

/// Synthesizer that records utterances and cancellations
pub struct MockSynthesizer {
    voices: Arc<Mutex<Vec<Voice>>>,
    spoken: Arc<Mutex<Vec<Utterance>>>,
    cancels: Arc<Mutex<usize>>,
}

impl SpeechSynthesizer for MockSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.lock().unwrap().clone()
    }

    fn speak(&mut self, utterance: Utterance) -> Result<()> {
        self.spoken.lock().unwrap().push(utterance);
        Ok(())
    }

    fn cancel(&mut self) {
        *self.cancels.lock().unwrap() += 1;
    }
}

/// Relay client returning queued replies (`"ok"` once the queue is empty)
pub struct MockRelay {
    requests: Arc<Mutex<Vec<RelayRequest>>>,
    replies: Arc<Mutex<VecDeque<std::result::Result<String, String>>>>,
}

#[async_trait]
impl RelayClient for MockRelay {
    async fn chat(&self, request: RelayRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(Error::Relay(message)),
            None => Ok("ok".to_string()),
        }
    }
}

/// Scheduler that records timers instead of running them
pub struct ManualScheduler {
    scheduled: Arc<Mutex<Vec<(Duration, Input)>>>,
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, input: Input) {
        self.scheduled.lock().unwrap().push((delay, input));
    }
}

/// Handles onto everything a test controller touches
#[derive(Clone, Default)]
pub struct Rig {
    pub recognizer_calls: Arc<Mutex<Vec<&'static str>>>,
    pub voices: Arc<Mutex<Vec<Voice>>>,
    pub spoken: Arc<Mutex<Vec<Utterance>>>,
    pub cancels: Arc<Mutex<usize>>,
    pub relay_requests: Arc<Mutex<Vec<RelayRequest>>>,
    pub relay_replies: Arc<Mutex<VecDeque<std::result::Result<String, String>>>>,
    pub scheduled: Arc<Mutex<Vec<(Duration, Input)>>>,
}

impl Rig {
    /// Build a controller wired to this rig's mocks
    pub fn controller(&self, config: ControllerConfig) -> Controller {
        self.build(config, false)
    }

    /// Build a controller whose recognizer refuses to start
    pub fn controller_with_broken_mic(&self, config: ControllerConfig) -> Controller {
        self.build(config, true)
    }

    fn build(&self, config: ControllerConfig, fail_start: bool) -> Controller {
        Controller::new(
            MockRecognizer {
                calls: Arc::clone(&self.recognizer_calls),
                fail_start,
            },
            MockSynthesizer {
                voices: Arc::clone(&self.voices),
                spoken: Arc::clone(&self.spoken),
                cancels: Arc::clone(&self.cancels),
            },
            MockRelay {
                requests: Arc::clone(&self.relay_requests),
                replies: Arc::clone(&self.relay_replies),
            },
            ManualScheduler {
                scheduled: Arc::clone(&self.scheduled),
            },
            config,
        )
    }

    pub fn queue_reply(&self, reply: &str) {
        self.relay_replies
            .lock()
            .unwrap()
            .push_back(Ok(reply.to_string()));
    }

    pub fn queue_failure(&self, message: &str) {
        self.relay_replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn recognizer_calls(&self) -> Vec<&'static str> {
        self.recognizer_calls.lock().unwrap().clone()
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.text.clone())
            .collect()
    }

    pub fn cancel_count(&self) -> usize {
        *self.cancels.lock().unwrap()
    }

    pub fn relay_requests(&self) -> Vec<RelayRequest> {
        self.relay_requests.lock().unwrap().clone()
    }

    pub fn scheduled(&self) -> Vec<(Duration, Input)> {
        self.scheduled.lock().unwrap().clone()
    }
}

/// Drain every status update sent so far
pub fn drain_statuses(rx: &mut mpsc::UnboundedReceiver<StatusUpdate>) -> Vec<StatusUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}
