//! Wake word → command recognizer state machine
//!
//! Time is passed in explicitly as milliseconds so the machine can be driven
//! by a live clock (see [`RecognizerDriver`](super::RecognizerDriver)) or by
//! recorded timestamps.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::commands::{CommandAction, CommandTable, DEFAULT_COMMAND_MIN_CONFIDENCE, WakeWordConfig};
use super::matcher::detect_wake_word;

/// Recognizer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecognizerState {
    /// Not enabled
    #[default]
    Idle,
    /// Waiting for the wake word
    Listening,
    /// Wake word heard, command window open
    WakeWordDetected,
    /// Evaluating a fragment
    Processing,
    /// Transcription failed; re-enable to resume
    Error,
}

impl fmt::Display for RecognizerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::WakeWordDetected => "wake-word-detected",
            Self::Processing => "processing",
            Self::Error => "error",
        })
    }
}

/// One result from the speech-to-text service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub transcript: String,

    /// Transcriber confidence, informational only
    #[serde(default)]
    pub confidence: f32,

    /// Interim fragments may still change; commands only fire on final ones
    #[serde(default)]
    pub is_final: bool,
}

impl TranscriptFragment {
    #[must_use]
    pub fn new(transcript: impl Into<String>, is_final: bool) -> Self {
        Self {
            transcript: transcript.into(),
            confidence: 1.0,
            is_final,
        }
    }
}

/// Kind of transcription failure reported by the speech-to-text service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecognitionErrorKind {
    NotSupported,
    PermissionDenied,
    NoSpeech,
    Network,
    AudioCapture,
    Aborted,
    Unknown,
}

/// Transcription failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionError {
    pub kind: RecognitionErrorKind,
    #[serde(default)]
    pub message: String,
}

/// Handle for a scheduled deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// Single-slot cancellable deadline
///
/// Scheduling replaces any pending deadline. Tokens from replaced schedules
/// no longer cancel anything.
#[derive(Debug, Default)]
pub struct DeadlineTimer {
    next_token: u64,
    pending: Option<(TimerToken, u64)>,
}

impl DeadlineTimer {
    /// Schedule a deadline `after_ms` from `now_ms`
    pub fn schedule(&mut self, now_ms: u64, after_ms: u64) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.pending = Some((token, now_ms.saturating_add(after_ms)));
        token
    }

    /// Cancel a pending deadline; returns false if the token is stale
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        if self.pending.is_some_and(|(pending, _)| pending == token) {
            self.pending = None;
            return true;
        }
        false
    }

    /// Drop whatever is pending
    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Pending deadline in milliseconds
    #[must_use]
    pub fn deadline(&self) -> Option<u64> {
        self.pending.map(|(_, at)| at)
    }

    /// Time left before the pending deadline
    #[must_use]
    pub fn remaining(&self, now_ms: u64) -> Option<u64> {
        self.deadline().map(|at| at.saturating_sub(now_ms))
    }

    /// Fire the pending deadline if it has been reached
    pub fn expired(&mut self, now_ms: u64) -> Option<TimerToken> {
        match self.pending {
            Some((token, at)) if now_ms >= at => {
                self.pending = None;
                Some(token)
            }
            _ => None,
        }
    }
}

/// A command recognized in a final fragment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedCommand {
    pub id: String,
    pub action: CommandAction,
    /// Pattern match score
    pub confidence: f32,
    pub transcript: String,
}

/// What a fragment did to the recognizer
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentOutcome {
    /// Recognizer is idle or in error
    Ignored,
    /// Evaluated, nothing recognized
    NoMatch,
    /// Command window opened
    WakeWordDetected { confidence: f32 },
    Command(MatchedCommand),
}

/// Stateful wake word and command recognizer
///
/// One instance per session; callers serialize access.
#[derive(Debug)]
pub struct CommandRecognizer {
    commands: CommandTable,
    wake: WakeWordConfig,
    min_command_confidence: f32,
    state: RecognizerState,
    awaiting_command: bool,
    timer: DeadlineTimer,
    command_window: Option<TimerToken>,
    last_error: Option<RecognitionError>,
}

impl Default for CommandRecognizer {
    fn default() -> Self {
        Self::new(
            CommandTable::default(),
            WakeWordConfig::default(),
            DEFAULT_COMMAND_MIN_CONFIDENCE,
        )
    }
}

impl CommandRecognizer {
    #[must_use]
    pub fn new(commands: CommandTable, wake: WakeWordConfig, min_command_confidence: f32) -> Self {
        Self {
            commands,
            wake,
            min_command_confidence,
            state: RecognizerState::Idle,
            awaiting_command: false,
            timer: DeadlineTimer::default(),
            command_window: None,
            last_error: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> RecognizerState {
        self.state
    }

    #[must_use]
    pub const fn is_awaiting_command(&self) -> bool {
        self.awaiting_command
    }

    #[must_use]
    pub const fn last_error(&self) -> Option<&RecognitionError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub const fn commands(&self) -> &CommandTable {
        &self.commands
    }

    /// Deadline of the open command window, if any
    #[must_use]
    pub fn deadline(&self) -> Option<u64> {
        self.timer.deadline()
    }

    /// Time left in the open command window
    #[must_use]
    pub fn time_remaining(&self, now_ms: u64) -> Option<u64> {
        self.timer.remaining(now_ms)
    }

    /// Start (or resume after an error) listening
    pub fn enable(&mut self) {
        if matches!(self.state, RecognizerState::Idle | RecognizerState::Error) {
            self.last_error = None;
            self.set_state(RecognizerState::Listening);
        }
    }

    /// Stop listening; an open command window is discarded
    pub fn disable(&mut self) {
        self.close_command_window();
        self.set_state(RecognizerState::Idle);
    }

    /// Record a transcription failure
    pub fn fail(&mut self, error: RecognitionError) {
        tracing::warn!(kind = ?error.kind, message = %error.message, "transcription error");
        self.close_command_window();
        self.last_error = Some(error);
        self.set_state(RecognizerState::Error);
    }

    /// Clear all session state and return to idle
    pub fn reset(&mut self) {
        self.disable();
        self.last_error = None;
    }

    /// Expire the command window if its deadline has passed
    ///
    /// Returns true when a timeout happened.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let Some(token) = self.timer.expired(now_ms) else {
            return false;
        };
        if self.command_window != Some(token) {
            return false;
        }

        tracing::info!("command window timed out");
        self.command_window = None;
        self.awaiting_command = false;
        self.set_state(RecognizerState::Listening);
        true
    }

    /// Evaluate one transcript fragment
    pub fn handle_fragment(
        &mut self,
        fragment: &TranscriptFragment,
        now_ms: u64,
    ) -> FragmentOutcome {
        self.poll(now_ms);

        if matches!(self.state, RecognizerState::Idle | RecognizerState::Error) {
            return FragmentOutcome::Ignored;
        }

        tracing::debug!(
            transcript = %fragment.transcript,
            confidence = fragment.confidence,
            is_final = fragment.is_final,
            "transcript fragment"
        );

        self.set_state(RecognizerState::Processing);
        let outcome = if !self.wake.enabled || self.awaiting_command {
            self.match_command(fragment)
        } else {
            self.match_wake_word(fragment, now_ms)
        };

        self.set_state(if self.awaiting_command {
            RecognizerState::WakeWordDetected
        } else {
            RecognizerState::Listening
        });
        outcome
    }

    fn match_wake_word(&mut self, fragment: &TranscriptFragment, now_ms: u64) -> FragmentOutcome {
        let result = detect_wake_word(&fragment.transcript, &self.wake);
        if !result.detected {
            return FragmentOutcome::NoMatch;
        }

        tracing::info!(
            transcript = %fragment.transcript,
            confidence = result.confidence,
            timeout_ms = self.wake.command_timeout_ms,
            "wake word detected"
        );
        self.awaiting_command = true;
        self.command_window = Some(self.timer.schedule(now_ms, self.wake.command_timeout_ms));
        FragmentOutcome::WakeWordDetected {
            confidence: result.confidence,
        }
    }

    fn match_command(&mut self, fragment: &TranscriptFragment) -> FragmentOutcome {
        let Some(found) = self
            .commands
            .match_command(&fragment.transcript, self.min_command_confidence)
        else {
            return FragmentOutcome::NoMatch;
        };

        if !fragment.is_final {
            tracing::trace!(command = %found.command.id, "command match on interim fragment");
            return FragmentOutcome::NoMatch;
        }

        let matched = MatchedCommand {
            id: found.command.id.clone(),
            action: found.command.action.clone(),
            confidence: found.confidence,
            transcript: fragment.transcript.clone(),
        };
        tracing::info!(command = %matched.id, confidence = matched.confidence, "command matched");

        self.close_command_window();
        FragmentOutcome::Command(matched)
    }

    fn close_command_window(&mut self) {
        if let Some(token) = self.command_window.take() {
            self.timer.cancel(token);
        }
        self.awaiting_command = false;
    }

    fn set_state(&mut self, state: RecognizerState) {
        if self.state != state {
            tracing::trace!(from = %self.state, to = %state, "recognizer state");
            self.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listening() -> CommandRecognizer {
        let mut recognizer = CommandRecognizer::default();
        recognizer.enable();
        recognizer
    }

    fn final_fragment(text: &str) -> TranscriptFragment {
        TranscriptFragment::new(text, true)
    }

    #[test]
    fn test_timer_schedule_and_cancel() {
        let mut timer = DeadlineTimer::default();
        let first = timer.schedule(100, 50);
        assert_eq!(timer.deadline(), Some(150));
        assert_eq!(timer.remaining(120), Some(30));

        let second = timer.schedule(200, 50);
        assert!(!timer.cancel(first));
        assert_eq!(timer.expired(249), None);
        assert_eq!(timer.expired(250), Some(second));
        assert_eq!(timer.deadline(), None);
        assert!(!timer.cancel(second));
    }

    #[test]
    fn test_idle_ignores_fragments() {
        let mut recognizer = CommandRecognizer::default();
        assert_eq!(
            recognizer.handle_fragment(&final_fragment("りなちゃん"), 0),
            FragmentOutcome::Ignored
        );
        assert_eq!(recognizer.state(), RecognizerState::Idle);
    }

    #[test]
    fn test_wake_word_opens_window() {
        let mut recognizer = listening();
        let outcome = recognizer.handle_fragment(&final_fragment("りなちゃん"), 1000);
        assert!(matches!(outcome, FragmentOutcome::WakeWordDetected { .. }));
        assert_eq!(recognizer.state(), RecognizerState::WakeWordDetected);
        assert!(recognizer.is_awaiting_command());
        assert_eq!(recognizer.deadline(), Some(6000));
        assert_eq!(recognizer.time_remaining(2000), Some(4000));
    }

    #[test]
    fn test_interim_wake_word_counts() {
        let mut recognizer = listening();
        let outcome = recognizer.handle_fragment(&TranscriptFragment::new("りな", false), 0);
        assert!(matches!(outcome, FragmentOutcome::WakeWordDetected { .. }));
    }

    #[test]
    fn test_command_needs_wake_word_first() {
        let mut recognizer = listening();
        let outcome = recognizer.handle_fragment(&final_fragment("エディター起動"), 0);
        assert_eq!(outcome, FragmentOutcome::NoMatch);
        assert_eq!(recognizer.state(), RecognizerState::Listening);
    }

    #[test]
    fn test_final_command_emits_and_closes_window() {
        let mut recognizer = listening();
        recognizer.handle_fragment(&final_fragment("りなちゃん"), 0);

        let interim =
            recognizer.handle_fragment(&TranscriptFragment::new("エディター起動", false), 500);
        assert_eq!(interim, FragmentOutcome::NoMatch);
        assert!(recognizer.is_awaiting_command());

        let FragmentOutcome::Command(matched) =
            recognizer.handle_fragment(&final_fragment("エディター起動"), 800)
        else {
            panic!("expected a command");
        };
        assert_eq!(matched.id, "open-editor");
        assert_eq!(
            matched.action,
            CommandAction::Navigate {
                path: "/editor".to_string()
            }
        );
        assert_eq!(recognizer.state(), RecognizerState::Listening);
        assert!(!recognizer.is_awaiting_command());
        assert_eq!(recognizer.deadline(), None);
    }

    #[test]
    fn test_window_times_out() {
        let mut recognizer = listening();
        recognizer.handle_fragment(&final_fragment("りなちゃん"), 0);

        assert!(!recognizer.poll(4999));
        assert_eq!(recognizer.state(), RecognizerState::WakeWordDetected);
        assert!(recognizer.poll(5000));
        assert_eq!(recognizer.state(), RecognizerState::Listening);
        assert!(!recognizer.is_awaiting_command());
        assert!(!recognizer.poll(9000));
    }

    #[test]
    fn test_late_command_after_timeout_is_not_emitted() {
        let mut recognizer = listening();
        recognizer.handle_fragment(&final_fragment("りなちゃん"), 0);
        let outcome = recognizer.handle_fragment(&final_fragment("エディター起動"), 5001);
        assert_eq!(outcome, FragmentOutcome::NoMatch);
        assert_eq!(recognizer.state(), RecognizerState::Listening);
    }

    #[test]
    fn test_error_and_reenable() {
        let mut recognizer = listening();
        recognizer.handle_fragment(&final_fragment("りなちゃん"), 0);
        recognizer.fail(RecognitionError {
            kind: RecognitionErrorKind::Network,
            message: "connection lost".to_string(),
        });
        assert_eq!(recognizer.state(), RecognizerState::Error);
        assert_eq!(recognizer.deadline(), None);
        assert_eq!(
            recognizer.handle_fragment(&final_fragment("りなちゃん"), 100),
            FragmentOutcome::Ignored
        );
        assert!(!recognizer.poll(10_000));

        recognizer.enable();
        assert_eq!(recognizer.state(), RecognizerState::Listening);
        assert!(recognizer.last_error().is_none());
    }

    #[test]
    fn test_disable_cancels_window() {
        let mut recognizer = listening();
        recognizer.handle_fragment(&final_fragment("りなちゃん"), 0);
        recognizer.disable();
        assert_eq!(recognizer.state(), RecognizerState::Idle);
        assert!(!recognizer.poll(6000));

        recognizer.enable();
        recognizer.reset();
        assert_eq!(recognizer.state(), RecognizerState::Idle);
    }

    #[test]
    fn test_wake_word_disabled_matches_directly() {
        let wake = WakeWordConfig {
            enabled: false,
            ..WakeWordConfig::default()
        };
        let mut recognizer = CommandRecognizer::new(CommandTable::default(), wake, 0.7);
        recognizer.enable();

        let outcome = recognizer.handle_fragment(&final_fragment("ギャラリー"), 0);
        assert!(matches!(outcome, FragmentOutcome::Command(ref m) if m.id == "open-gallery"));
        assert_eq!(recognizer.state(), RecognizerState::Listening);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(RecognizerState::WakeWordDetected.to_string(), "wake-word-detected");
        let json = serde_json::to_string(&RecognizerState::WakeWordDetected).unwrap();
        assert_eq!(json, "\"wake-word-detected\"");
    }
}
