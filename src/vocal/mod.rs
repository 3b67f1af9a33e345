//! Vocal emotion input
//!
//! Maps prosody emotion scores onto the shared expression vocabulary and
//! derives the speaking flag from raw audio loudness.

mod activity;
mod mapper;

pub use activity::{DEFAULT_SILENCE_THRESHOLD, VoiceActivity, calculate_rms};
pub use mapper::{
    EmotionFrame, EmotionScore, ExpressionGroup, VocalMapper, VocalObservation, classify_vocal,
    default_groups,
};
