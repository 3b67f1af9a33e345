//! One interactive session: expression pipeline plus command recognizer
//!
//! Consumes timestamped events (from a recorded log or a live source) and
//! produces the outputs the host acts on. Time comes only from the events,
//! so replaying the same log always yields the same outputs.

use serde::{Deserialize, Serialize};

use crate::face::{ActionUnitFrame, FaceObservation};
use crate::pipeline::{ExpressionChange, ExpressionPipeline};
use crate::vocal::{EmotionFrame, VocalObservation, VoiceActivity};
use crate::voice::{
    CommandRecognizer, FragmentOutcome, MatchedCommand, NavigationPolicy, RecognitionError,
    RecognitionErrorKind, TranscriptFragment,
};
use crate::Config;

/// Timestamped session input
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SessionEvent {
    /// Face landmarker result for one video frame
    Face {
        #[serde(default = "default_true")]
        detected: bool,
        #[serde(default)]
        frame: ActionUnitFrame,
        timestamp_ms: u64,
    },
    /// Prosody result for one audio chunk
    Voice {
        #[serde(default)]
        emotions: EmotionFrame,
        /// Explicit activity flag; wins over `samples`
        #[serde(default)]
        is_speaking: Option<bool>,
        /// Raw PCM for loudness-based activity
        #[serde(default)]
        samples: Option<Vec<f32>>,
        timestamp_ms: u64,
    },
    /// Speech-to-text fragment
    Transcript {
        transcript: String,
        #[serde(default = "default_true")]
        is_final: bool,
        #[serde(default = "default_confidence")]
        confidence: f32,
        timestamp_ms: u64,
    },
    /// Speech-to-text failure
    Error {
        kind: RecognitionErrorKind,
        #[serde(default)]
        message: String,
        timestamp_ms: u64,
    },
}

const fn default_true() -> bool {
    true
}

const fn default_confidence() -> f32 {
    1.0
}

impl SessionEvent {
    #[must_use]
    pub const fn timestamp_ms(&self) -> u64 {
        match self {
            Self::Face { timestamp_ms, .. }
            | Self::Voice { timestamp_ms, .. }
            | Self::Transcript { timestamp_ms, .. }
            | Self::Error { timestamp_ms, .. } => *timestamp_ms,
        }
    }
}

/// Something the host should act on
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionOutput {
    Expression(ExpressionChange),
    WakeWordDetected {
        confidence: f32,
        transcript: String,
        timestamp_ms: u64,
    },
    Command {
        #[serde(flatten)]
        command: MatchedCommand,
        timestamp_ms: u64,
    },
    CommandTimedOut {
        timestamp_ms: u64,
    },
    Error {
        #[serde(flatten)]
        error: RecognitionError,
        timestamp_ms: u64,
    },
}

/// Session state for one user
#[derive(Debug)]
pub struct Session {
    pipeline: ExpressionPipeline,
    recognizer: CommandRecognizer,
    navigation: NavigationPolicy,
    activity: VoiceActivity,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Session {
    /// Start a session; the recognizer begins listening immediately
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let mut recognizer = CommandRecognizer::new(
            config.commands.table.clone(),
            config.wake_word.clone(),
            config.commands.min_confidence,
        );
        recognizer.enable();

        Self {
            pipeline: ExpressionPipeline::from_config(config),
            recognizer,
            navigation: config.navigation.clone(),
            activity: VoiceActivity::default(),
        }
    }

    #[must_use]
    pub const fn pipeline(&self) -> &ExpressionPipeline {
        &self.pipeline
    }

    #[must_use]
    pub const fn recognizer(&self) -> &CommandRecognizer {
        &self.recognizer
    }

    /// Apply one event
    ///
    /// A command window whose deadline passed before the event is closed
    /// first and reported at its deadline.
    pub fn process(&mut self, event: SessionEvent) -> Vec<SessionOutput> {
        let now = event.timestamp_ms();
        let mut outputs = Vec::new();

        if let Some(deadline) = self.recognizer.deadline() {
            if self.recognizer.poll(now) {
                outputs.push(SessionOutput::CommandTimedOut {
                    timestamp_ms: deadline,
                });
            }
        }

        match event {
            SessionEvent::Face {
                detected,
                frame,
                timestamp_ms,
            } => {
                let observation = FaceObservation {
                    detected,
                    frame,
                    timestamp_ms,
                };
                outputs.extend(
                    self.pipeline
                        .observe_face(&observation)
                        .map(SessionOutput::Expression),
                );
            }
            SessionEvent::Voice {
                emotions,
                is_speaking,
                samples,
                timestamp_ms,
            } => {
                if let Some(samples) = samples {
                    self.activity.process(&samples);
                }
                let observation = VocalObservation {
                    emotions,
                    timestamp_ms,
                    is_speaking: is_speaking.unwrap_or_else(|| self.activity.is_speaking()),
                };
                outputs.extend(
                    self.pipeline
                        .observe_voice(&observation)
                        .map(SessionOutput::Expression),
                );
            }
            SessionEvent::Transcript {
                transcript,
                is_final,
                confidence,
                timestamp_ms,
            } => {
                let fragment = TranscriptFragment {
                    transcript,
                    confidence,
                    is_final,
                };
                outputs.extend(self.recognize(fragment, timestamp_ms));
            }
            SessionEvent::Error {
                kind,
                message,
                timestamp_ms,
            } => {
                let error = RecognitionError { kind, message };
                self.recognizer.fail(error.clone());
                // The transcriber restarts after reporting; resume listening
                self.recognizer.enable();
                outputs.push(SessionOutput::Error {
                    error,
                    timestamp_ms,
                });
            }
        }

        outputs
    }

    /// End of input: report a still-open command window at its deadline
    ///
    /// Event time stops at the last event, so without this a trailing wake
    /// word would never be shown to time out.
    pub fn finish(&mut self) -> Option<SessionOutput> {
        let deadline = self.recognizer.deadline()?;
        self.recognizer
            .poll(deadline)
            .then_some(SessionOutput::CommandTimedOut {
                timestamp_ms: deadline,
            })
    }

    fn recognize(
        &mut self,
        fragment: TranscriptFragment,
        timestamp_ms: u64,
    ) -> Option<SessionOutput> {
        match self.recognizer.handle_fragment(&fragment, timestamp_ms) {
            FragmentOutcome::WakeWordDetected { confidence } => {
                Some(SessionOutput::WakeWordDetected {
                    confidence,
                    transcript: fragment.transcript,
                    timestamp_ms,
                })
            }
            FragmentOutcome::Command(command) => {
                self.navigation.filter(&command.action)?;
                Some(SessionOutput::Command {
                    command,
                    timestamp_ms,
                })
            }
            FragmentOutcome::NoMatch | FragmentOutcome::Ignored => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Expression;
    use crate::voice::RecognizerState;

    fn transcript(text: &str, timestamp_ms: u64) -> SessionEvent {
        SessionEvent::Transcript {
            transcript: text.to_string(),
            is_final: true,
            confidence: 1.0,
            timestamp_ms,
        }
    }

    #[test]
    fn test_parse_events() {
        let event: SessionEvent = serde_json::from_str(
            r#"{"type":"face","frame":{"mouthSmileLeft":0.9},"timestamp_ms":10}"#,
        )
        .unwrap();
        assert!(matches!(event, SessionEvent::Face { detected: true, .. }));

        let event: SessionEvent =
            serde_json::from_str(r#"{"type":"transcript","transcript":"りな","timestamp_ms":5}"#)
                .unwrap();
        assert_eq!(event, transcript("りな", 5));

        let event: SessionEvent = serde_json::from_str(
            r#"{"type":"error","kind":"no-speech","timestamp_ms":7}"#,
        )
        .unwrap();
        assert_eq!(event.timestamp_ms(), 7);
    }

    #[test]
    fn test_wake_then_command() {
        let mut session = Session::default();
        let out = session.process(transcript("りなちゃん", 1000));
        assert!(matches!(out[..], [SessionOutput::WakeWordDetected { .. }]));

        let out = session.process(transcript("ホームに戻って", 2000));
        let [SessionOutput::Command { command, timestamp_ms }] = &out[..] else {
            panic!("expected a command, got {out:?}");
        };
        assert_eq!(command.id, "go-home");
        assert_eq!(*timestamp_ms, 2000);
    }

    #[test]
    fn test_timeout_reported_at_deadline() {
        let mut session = Session::default();
        session.process(transcript("りな", 1000));

        let out = session.process(transcript("ギャラリー", 7000));
        assert_eq!(out, vec![SessionOutput::CommandTimedOut { timestamp_ms: 6000 }]);
        assert_eq!(session.recognizer().state(), RecognizerState::Listening);
    }

    #[test]
    fn test_finish_flushes_open_window() {
        let mut session = Session::default();
        session.process(transcript("りな", 1000));
        assert!(session.recognizer().is_awaiting_command());

        assert_eq!(
            session.finish(),
            Some(SessionOutput::CommandTimedOut { timestamp_ms: 6000 })
        );
        assert!(!session.recognizer().is_awaiting_command());
        assert_eq!(session.finish(), None);
    }

    #[test]
    fn test_finish_without_window_is_quiet() {
        let mut session = Session::default();
        session.process(transcript("りな", 1000));
        session.process(transcript("ギャラリー", 1500));
        assert_eq!(session.finish(), None);
    }

    #[test]
    fn test_disallowed_navigation_is_dropped() {
        let mut config = Config::default();
        config.navigation.allowed_paths = vec!["/".to_string()];
        let mut session = Session::new(&config);

        session.process(transcript("りな", 0));
        assert!(session.process(transcript("ギャラリー", 500)).is_empty());
    }

    #[test]
    fn test_error_resumes_listening() {
        let mut session = Session::default();
        session.process(transcript("りな", 0));

        let out = session.process(SessionEvent::Error {
            kind: RecognitionErrorKind::Network,
            message: String::new(),
            timestamp_ms: 100,
        });
        assert!(matches!(out[..], [SessionOutput::Error { .. }]));
        assert_eq!(session.recognizer().state(), RecognizerState::Listening);
        assert!(!session.recognizer().is_awaiting_command());
    }

    #[test]
    fn test_loud_samples_mark_speaking() {
        let mut session = Session::default();
        let joyful = EmotionFrame::new().with("Joy", 0.9);

        let out = session.process(SessionEvent::Voice {
            emotions: joyful.clone(),
            is_speaking: None,
            samples: Some(vec![0.5; 64]),
            timestamp_ms: 1000,
        });
        assert!(matches!(
            out[..],
            [SessionOutput::Expression(ExpressionChange {
                expression: Expression::Smile,
                ..
            })]
        ));

        // Still loud well past the decay timeout: no decay
        let out = session.process(SessionEvent::Voice {
            emotions: joyful,
            is_speaking: None,
            samples: Some(vec![0.5; 64]),
            timestamp_ms: 5000,
        });
        assert!(out.is_empty());
        assert_eq!(session.pipeline().current(), Expression::Smile);
    }
}
