//! Spoken command recognition
//!
//! Transcript fragments are normalized and matched against a wake phrase;
//! once it is heard a timed window accepts one command from the table.

mod commands;
mod driver;
mod matcher;
mod normalize;
mod recognizer;
mod similarity;

pub use commands::{
    CommandAction, CommandTable, DEFAULT_COMMAND_MIN_CONFIDENCE, DEFAULT_COMMAND_TIMEOUT_MS,
    DEFAULT_WAKE_MIN_CONFIDENCE, MatchType, NavigationPolicy, VoiceCommand, WakeWordConfig,
    default_commands,
};
pub use driver::{RecognizerDriver, RecognizerEvent, RecognizerInput};
pub use matcher::{
    CommandMatch, MIN_COMMAND_CHARS, MIN_FUZZY_CHARS, WakeWordMatch, detect_wake_word,
    match_command,
};
pub use normalize::normalize;
pub use recognizer::{
    CommandRecognizer, DeadlineTimer, FragmentOutcome, MatchedCommand, RecognitionError,
    RecognitionErrorKind, RecognizerState, TimerToken, TranscriptFragment,
};
pub use similarity::{levenshtein, similarity};
