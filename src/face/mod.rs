//! Facial expression input
//!
//! Converts per-frame action-unit scores from a landmark detector into an
//! [`ExpressionCandidate`](crate::ExpressionCandidate).

mod action_units;
mod classifier;

pub use action_units::{ActionUnit, ActionUnitFrame, BlendshapeCategory, FaceObservation};
pub use classifier::{DEFAULT_MIN_CONFIDENCE, FacialClassifier, classify_facial};
