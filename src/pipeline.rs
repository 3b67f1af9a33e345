//! Classifier → smoother pipeline feeding the renderer

use serde::Serialize;

use crate::face::{FaceObservation, FacialClassifier};
use crate::smoother::{ExpressionSmoother, SmootherConfig, SmootherSample};
use crate::vocal::{VocalMapper, VocalObservation};
use crate::{Config, Expression, ExpressionCandidate};

/// Emitted whenever the displayed expression changes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpressionChange {
    pub expression: Expression,
    /// Confidence of the classifier result that caused the change
    pub confidence: f32,
    pub timestamp_ms: u64,
}

/// Per-session expression pipeline
///
/// Both modalities feed the same smoother, so a session normally uses one.
#[derive(Debug, Clone)]
pub struct ExpressionPipeline {
    facial: FacialClassifier,
    vocal: VocalMapper,
    smoother: ExpressionSmoother,
    displayed: Expression,
}

impl Default for ExpressionPipeline {
    fn default() -> Self {
        Self::new(
            FacialClassifier::default(),
            VocalMapper::default(),
            SmootherConfig::default(),
        )
    }
}

impl ExpressionPipeline {
    #[must_use]
    pub fn new(facial: FacialClassifier, vocal: VocalMapper, smoother: SmootherConfig) -> Self {
        Self {
            facial,
            vocal,
            smoother: ExpressionSmoother::new(smoother),
            displayed: Expression::Neutral,
        }
    }

    /// Build from resolved configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            FacialClassifier::new(config.face.min_confidence),
            config.vocal.clone(),
            config.smoother,
        )
    }

    /// Expression currently on display
    #[must_use]
    pub const fn current(&self) -> Expression {
        self.displayed
    }

    /// Feed one video frame
    ///
    /// Frames without a detected face are dropped. A visible face counts as
    /// activity, so decay only follows vocal silence.
    pub fn observe_face(&mut self, observation: &FaceObservation) -> Option<ExpressionChange> {
        if !observation.detected {
            tracing::trace!(
                timestamp_ms = observation.timestamp_ms,
                "no face detected, frame dropped"
            );
            return None;
        }

        let candidate = self.facial.classify(&observation.frame);
        self.apply(candidate, true, observation.timestamp_ms)
    }

    /// Feed one analyzed audio chunk
    pub fn observe_voice(&mut self, observation: &VocalObservation) -> Option<ExpressionChange> {
        let candidate = self.vocal.classify(&observation.emotions);
        self.apply(candidate, observation.is_speaking, observation.timestamp_ms)
    }

    /// End of session: forget history and show neutral again
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.displayed = Expression::Neutral;
    }

    fn apply(
        &mut self,
        candidate: ExpressionCandidate,
        is_speaking: bool,
        timestamp_ms: u64,
    ) -> Option<ExpressionChange> {
        let expression = self
            .smoother
            .update(SmootherSample::new(candidate, is_speaking, timestamp_ms));

        if expression == self.displayed {
            return None;
        }

        self.displayed = expression;
        tracing::info!(
            %expression,
            confidence = candidate.confidence,
            timestamp_ms,
            "expression changed"
        );
        Some(ExpressionChange {
            expression,
            confidence: candidate.confidence,
            timestamp_ms,
        })
    }
}
