//! Rule-based facial expression classifier
//!
//! One confidence rule per expression, evaluated in a fixed priority order.
//! The first rule reaching the minimum confidence wins.

use super::{ActionUnit, ActionUnitFrame};
use crate::{Expression, ExpressionCandidate};

/// Default minimum confidence for a rule to win
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.3;

const BLINK_CLOSED: f32 = 0.7;
const SMILE_RAISED: f32 = 0.5;
const SURPRISE_JAW_OPEN: f32 = 0.6;
const SURPRISE_BROW_UP: f32 = 0.5;
const FROWN_LOWERED: f32 = 0.5;
const BROW_LOWERED: f32 = 0.5;
const CONFUSED_BROW_UP: f32 = 0.4;
const CONFUSED_MAX_FROWN: f32 = 0.3;
const WINK_CLOSED: f32 = 0.6;
const WINK_OPEN: f32 = 0.3;
const WIDE_EYE_DIFF: f32 = 0.4;
const OUTER_BROW_RAISED: f32 = 0.5;
const EMBARRASSED_SMILE: (f32, f32) = (0.3, 0.6);
const EMBARRASSED_BROW: (f32, f32) = (0.2, 0.5);

/// Stateless facial classifier with a configurable threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacialClassifier {
    min_confidence: f32,
}

impl Default for FacialClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}

impl FacialClassifier {
    #[must_use]
    pub const fn new(min_confidence: f32) -> Self {
        Self { min_confidence }
    }

    #[must_use]
    pub const fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    #[must_use]
    pub fn classify(&self, frame: &ActionUnitFrame) -> ExpressionCandidate {
        classify_facial(frame, self.min_confidence)
    }
}

/// Classify one action-unit frame
///
/// Returns `{neutral, 1.0}` when no rule reaches `min_confidence`.
#[must_use]
pub fn classify_facial(frame: &ActionUnitFrame, min_confidence: f32) -> ExpressionCandidate {
    for expression in Expression::FACIAL_PRIORITY {
        let confidence = rule_confidence(expression, frame);
        if confidence >= min_confidence {
            tracing::trace!(%expression, confidence, "facial rule matched");
            return ExpressionCandidate::new(expression, confidence);
        }
    }

    ExpressionCandidate::neutral()
}

/// Confidence produced by a single expression's rule, 0 when unmet
fn rule_confidence(expression: Expression, frame: &ActionUnitFrame) -> f32 {
    let au = |unit| frame.score(unit);

    match expression {
        Expression::Blink => {
            let (left, right) = (au(ActionUnit::EyeBlinkLeft), au(ActionUnit::EyeBlinkRight));
            if left > BLINK_CLOSED && right > BLINK_CLOSED {
                left.min(right)
            } else {
                0.0
            }
        }
        Expression::Smile => either_side(
            au(ActionUnit::MouthSmileLeft),
            au(ActionUnit::MouthSmileRight),
            SMILE_RAISED,
        ),
        Expression::Surprised => {
            let jaw = au(ActionUnit::JawOpen);
            let brow = au(ActionUnit::BrowInnerUp);
            if jaw > SURPRISE_JAW_OPEN && brow > SURPRISE_BROW_UP {
                mean(jaw, brow)
            } else {
                0.0
            }
        }
        Expression::Sad => either_side(
            au(ActionUnit::MouthFrownLeft),
            au(ActionUnit::MouthFrownRight),
            FROWN_LOWERED,
        ),
        Expression::Angry => either_side(
            au(ActionUnit::BrowDownLeft),
            au(ActionUnit::BrowDownRight),
            BROW_LOWERED,
        ),
        Expression::Confused => {
            let brow = au(ActionUnit::BrowInnerUp);
            let frown = mean(au(ActionUnit::MouthFrownLeft), au(ActionUnit::MouthFrownRight));
            if brow > CONFUSED_BROW_UP && frown < CONFUSED_MAX_FROWN {
                brow
            } else {
                0.0
            }
        }
        Expression::Smug => smug_confidence(frame),
        Expression::Questioning => either_side(
            au(ActionUnit::BrowOuterUpLeft),
            au(ActionUnit::BrowOuterUpRight),
            OUTER_BROW_RAISED,
        ),
        Expression::Embarrassed => {
            let smile = mean(au(ActionUnit::MouthSmileLeft), au(ActionUnit::MouthSmileRight));
            let brow = au(ActionUnit::BrowInnerUp);
            if within(smile, EMBARRASSED_SMILE) && within(brow, EMBARRASSED_BROW) {
                mean(smile, brow)
            } else {
                0.0
            }
        }
        Expression::Neutral => 1.0,
    }
}

/// One eye closed while the other stays open, or clearly asymmetric eye widening
fn smug_confidence(frame: &ActionUnitFrame) -> f32 {
    let left_blink = frame.score(ActionUnit::EyeBlinkLeft);
    let right_blink = frame.score(ActionUnit::EyeBlinkRight);

    let left_wink = left_blink > WINK_CLOSED && right_blink < WINK_OPEN;
    let right_wink = right_blink > WINK_CLOSED && left_blink < WINK_OPEN;
    if left_wink || right_wink {
        return left_blink.max(right_blink);
    }

    let wide_diff =
        (frame.score(ActionUnit::EyeWideLeft) - frame.score(ActionUnit::EyeWideRight)).abs();
    if wide_diff > WIDE_EYE_DIFF {
        return wide_diff;
    }

    0.0
}

/// Mean of a left/right pair when either side passes the threshold
fn either_side(left: f32, right: f32, threshold: f32) -> f32 {
    if left > threshold || right > threshold {
        mean(left, right)
    } else {
        0.0
    }
}

fn mean(a: f32, b: f32) -> f32 {
    (a + b) / 2.0
}

/// Open interval check
fn within(value: f32, (low, high): (f32, f32)) -> bool {
    value > low && value < high
}
