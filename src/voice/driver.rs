//! Async driver for the command recognizer
//!
//! Feeds fragments from a channel into a [`CommandRecognizer`] and turns its
//! command-window deadline into a real timer with `tokio::select!`.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::recognizer::{
    CommandRecognizer, FragmentOutcome, MatchedCommand, RecognitionError, TranscriptFragment,
};

/// Input to the driver
#[derive(Debug, Clone)]
pub enum RecognizerInput {
    Fragment(TranscriptFragment),
    /// Transcription failure from the speech-to-text service
    Error(RecognitionError),
    /// Start or resume listening
    Enable,
    /// Stop listening and discard any open command window
    Disable,
}

/// Notable recognizer output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecognizerEvent {
    WakeWordDetected { confidence: f32, transcript: String },
    Command(MatchedCommand),
    CommandTimedOut,
    Error(RecognitionError),
}

/// Runs a recognizer against a live clock
pub struct RecognizerDriver {
    recognizer: CommandRecognizer,
    started: Instant,
}

impl RecognizerDriver {
    /// Wrap a recognizer; it is enabled when [`run`](Self::run) starts
    #[must_use]
    pub fn new(recognizer: CommandRecognizer) -> Self {
        Self {
            recognizer,
            started: Instant::now(),
        }
    }

    /// Process input until the input channel closes or the event receiver is dropped
    ///
    /// Returns the recognizer so its final state can be inspected.
    pub async fn run(
        mut self,
        mut input: mpsc::Receiver<RecognizerInput>,
        events: mpsc::Sender<RecognizerEvent>,
    ) -> CommandRecognizer {
        self.recognizer.enable();
        tracing::debug!("recognizer driver started");

        loop {
            let deadline = self
                .recognizer
                .deadline()
                .map(|ms| self.started + Duration::from_millis(ms));

            let event = tokio::select! {
                msg = input.recv() => {
                    let Some(msg) = msg else {
                        break;
                    };
                    self.dispatch(msg)
                }
                () = wait_until(deadline) => {
                    let now = self.now_ms();
                    self.recognizer
                        .poll(now)
                        .then_some(RecognizerEvent::CommandTimedOut)
                }
            };

            if let Some(event) = event {
                if events.send(event).await.is_err() {
                    tracing::debug!("event receiver dropped");
                    break;
                }
            }
        }

        self.recognizer.disable();
        tracing::debug!("recognizer driver stopped");
        self.recognizer
    }

    fn dispatch(&mut self, input: RecognizerInput) -> Option<RecognizerEvent> {
        let now = self.now_ms();
        match input {
            RecognizerInput::Fragment(fragment) => {
                match self.recognizer.handle_fragment(&fragment, now) {
                    FragmentOutcome::WakeWordDetected { confidence } => {
                        Some(RecognizerEvent::WakeWordDetected {
                            confidence,
                            transcript: fragment.transcript,
                        })
                    }
                    FragmentOutcome::Command(matched) => Some(RecognizerEvent::Command(matched)),
                    FragmentOutcome::NoMatch | FragmentOutcome::Ignored => None,
                }
            }
            RecognizerInput::Error(error) => {
                self.recognizer.fail(error.clone());
                Some(RecognizerEvent::Error(error))
            }
            RecognizerInput::Enable => {
                self.recognizer.enable();
                None
            }
            RecognizerInput::Disable => {
                self.recognizer.disable();
                None
            }
        }
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Sleep until the deadline, or forever when there is none
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
