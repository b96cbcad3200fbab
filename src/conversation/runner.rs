//! Tokio event loop for the controller

use std::time::Duration;

use tokio::sync::mpsc;

use super::controller::{Controller, Input, Scheduler};

/// Scheduler that posts delayed inputs back onto the controller's channel
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    inputs: mpsc::UnboundedSender<Input>,
}

impl TokioScheduler {
    #[must_use]
    pub const fn new(inputs: mpsc::UnboundedSender<Input>) -> Self {
        Self { inputs }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, input: Input) {
        let inputs = self.inputs.clone();
        drop(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = inputs.send(input);
        }));
    }
}

impl Controller {
    /// Process inputs until the channel closes
    pub async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<Input>) {
        while let Some(input) = inputs.recv().await {
            self.handle(input).await;
        }

        tracing::debug!("controller input closed");
    }
}
