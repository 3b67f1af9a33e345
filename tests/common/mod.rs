//! Shared test utilities

#![allow(dead_code)]

use rina_core::face::{ActionUnit, ActionUnitFrame};
use rina_core::vocal::EmotionFrame;
use rina_core::voice::TranscriptFragment;
use rina_core::{Expression, ExpressionCandidate, SmootherSample};

/// Build an action-unit frame from (unit, score) pairs
pub fn face(units: &[(ActionUnit, f32)]) -> ActionUnitFrame {
    units
        .iter()
        .fold(ActionUnitFrame::new(), |frame, &(unit, score)| frame.with(unit, score))
}

/// Build an emotion frame from (name, score) pairs
pub fn emotions(scores: &[(&str, f32)]) -> EmotionFrame {
    scores.iter().map(|&(name, score)| (name, score)).collect()
}

/// A smoother sample taken while the user is speaking
pub fn speaking(expression: Expression, confidence: f32, timestamp_ms: u64) -> SmootherSample {
    SmootherSample::new(ExpressionCandidate::new(expression, confidence), true, timestamp_ms)
}

/// A smoother sample taken during silence
pub fn silent(expression: Expression, confidence: f32, timestamp_ms: u64) -> SmootherSample {
    SmootherSample::new(ExpressionCandidate::new(expression, confidence), false, timestamp_ms)
}

pub fn final_fragment(text: &str) -> TranscriptFragment {
    TranscriptFragment::new(text, true)
}

pub fn interim_fragment(text: &str) -> TranscriptFragment {
    TranscriptFragment::new(text, false)
}
