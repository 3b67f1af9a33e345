//! Group-threshold mapping from prosody emotions to expressions
//!
//! Prosody scores sit in a low range (roughly 0.01 to 0.3), so related
//! emotions are summed per group. Every group whose sum reaches its
//! threshold is a candidate and the largest sum wins; table order only
//! matters for exact ties.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::{Error, Expression, ExpressionCandidate, Result};

/// A single named emotion score from the prosody service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub name: String,
    pub score: f32,
}

/// Emotion name to score mapping for one utterance chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionFrame {
    scores: HashMap<String, f32>,
}

impl EmotionFrame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the service's list form; a repeated name keeps its last score
    #[must_use]
    pub fn from_scores(scores: &[EmotionScore]) -> Self {
        scores
            .iter()
            .map(|e| (e.name.clone(), e.score))
            .collect()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, score: f32) -> Self {
        self.scores.insert(name.into(), score);
        self
    }

    /// Score for an emotion, 0 if absent
    #[must_use]
    pub fn score(&self, name: &str) -> f32 {
        self.scores.get(name).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f32)> for EmotionFrame {
    fn from_iter<I: IntoIterator<Item = (K, f32)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// One analyzed audio chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocalObservation {
    #[serde(default)]
    pub emotions: EmotionFrame,

    /// Chunk time in milliseconds
    pub timestamp_ms: u64,

    /// Voice activity at the time of the chunk
    #[serde(default)]
    pub is_speaking: bool,
}

/// Emotions that together signal one expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionGroup {
    pub expression: Expression,
    pub emotions: Vec<String>,
    /// Minimum summed score for the group to qualify
    pub threshold: f32,
}

impl ExpressionGroup {
    #[must_use]
    pub fn new(expression: Expression, emotions: &[&str], threshold: f32) -> Self {
        Self {
            expression,
            emotions: emotions.iter().map(ToString::to_string).collect(),
            threshold,
        }
    }

    /// Summed score of the group's member emotions
    #[must_use]
    pub fn score(&self, frame: &EmotionFrame) -> f32 {
        self.emotions.iter().map(|name| frame.score(name)).sum()
    }

    /// Reject groups that cannot be expressed vocally or can never fire sensibly
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for `neutral`/`blink` groups, empty member
    /// lists, and negative or non-finite thresholds.
    pub fn validate(&self) -> Result<()> {
        if matches!(self.expression, Expression::Neutral | Expression::Blink) {
            return Err(Error::Config(format!(
                "expression group cannot target {}",
                self.expression
            )));
        }
        if self.emotions.is_empty() {
            return Err(Error::Config(format!(
                "expression group {} has no emotions",
                self.expression
            )));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(Error::Config(format!(
                "expression group {} has invalid threshold {}",
                self.expression, self.threshold
            )));
        }
        Ok(())
    }
}

/// Built-in group table tuned for the prosody model's score range
#[must_use]
pub fn default_groups() -> Vec<ExpressionGroup> {
    vec![
        ExpressionGroup::new(Expression::Smug, &["Triumph", "Pride", "Satisfaction"], 0.08),
        ExpressionGroup::new(Expression::Embarrassed, &["Embarrassment", "Shame"], 0.08),
        ExpressionGroup::new(
            Expression::Surprised,
            &["Surprise (positive)", "Surprise (negative)", "Awe", "Realization"],
            0.1,
        ),
        ExpressionGroup::new(
            Expression::Angry,
            &["Anger", "Contempt", "Annoyance", "Disgust"],
            0.1,
        ),
        ExpressionGroup::new(
            Expression::Sad,
            &["Sadness", "Disappointment", "Distress", "Grief", "Pain"],
            0.1,
        ),
        ExpressionGroup::new(
            Expression::Smile,
            &["Joy", "Amusement", "Excitement", "Contentment", "Love"],
            0.1,
        ),
        ExpressionGroup::new(Expression::Confused, &["Confusion", "Awkwardness"], 0.12),
        // Four members summed, hence the higher bar
        ExpressionGroup::new(
            Expression::Questioning,
            &["Interest", "Doubt", "Contemplation", "Concentration"],
            0.15,
        ),
    ]
}

/// Vocal mapper over a configured group table
#[derive(Debug, Clone, Serialize)]
pub struct VocalMapper {
    groups: Vec<ExpressionGroup>,
}

impl Default for VocalMapper {
    fn default() -> Self {
        Self {
            groups: default_groups(),
        }
    }
}

impl VocalMapper {
    /// Create a mapper over a custom table
    ///
    /// # Errors
    ///
    /// Returns error if any group fails [`ExpressionGroup::validate`]
    pub fn new(groups: Vec<ExpressionGroup>) -> Result<Self> {
        for group in &groups {
            group.validate()?;
        }
        Ok(Self { groups })
    }

    #[must_use]
    pub fn groups(&self) -> &[ExpressionGroup] {
        &self.groups
    }

    /// Pick the qualifying group with the highest summed score
    ///
    /// Confidence is the winning sum capped at 1.0.
    #[must_use]
    pub fn classify(&self, frame: &EmotionFrame) -> ExpressionCandidate {
        let mut best: Option<(Expression, f32)> = None;

        for group in &self.groups {
            let score = group.score(frame);
            if score < group.threshold {
                continue;
            }
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((group.expression, score));
            }
        }

        match best {
            Some((expression, score)) => {
                tracing::trace!(%expression, score, "vocal group matched");
                ExpressionCandidate::new(expression, score.min(1.0))
            }
            None => ExpressionCandidate::neutral(),
        }
    }
}

static DEFAULT_MAPPER: LazyLock<VocalMapper> = LazyLock::new(VocalMapper::default);

/// Classify one emotion frame against the built-in table
#[must_use]
pub fn classify_vocal(frame: &EmotionFrame) -> ExpressionCandidate {
    DEFAULT_MAPPER.classify(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_every_threshold_is_neutral() {
        let frame = EmotionFrame::new()
            .with("Joy", 0.05)
            .with("Anger", 0.02)
            .with("Interest", 0.1);
        assert_eq!(classify_vocal(&frame), ExpressionCandidate::neutral());
        assert_eq!(classify_vocal(&EmotionFrame::new()), ExpressionCandidate::neutral());
    }

    #[test]
    fn test_highest_sum_wins_over_table_order() {
        let frame = EmotionFrame::new()
            .with("Confusion", 0.15)
            .with("Interest", 0.25)
            .with("Doubt", 0.1)
            .with("Contemplation", 0.05);
        let result = classify_vocal(&frame);
        assert_eq!(result.expression, Expression::Questioning);
        assert!((result.confidence - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_members_are_summed() {
        // Neither score alone clears 0.1, together they do
        let frame = EmotionFrame::new().with("Joy", 0.06).with("Amusement", 0.06);
        let result = classify_vocal(&frame);
        assert_eq!(result.expression, Expression::Smile);
        assert!((result.confidence - 0.12).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_is_capped() {
        let frame = EmotionFrame::new()
            .with("Sadness", 0.5)
            .with("Grief", 0.4)
            .with("Pain", 0.3);
        let result = classify_vocal(&frame);
        assert_eq!(result.expression, Expression::Sad);
        assert!((result.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_equal_sums_keep_table_order() {
        let frame = EmotionFrame::new().with("Pride", 0.2).with("Shame", 0.2);
        assert_eq!(classify_vocal(&frame).expression, Expression::Smug);
    }

    #[test]
    fn test_unknown_emotions_are_ignored() {
        let frame = EmotionFrame::new().with("Nostalgia", 0.9);
        assert_eq!(classify_vocal(&frame), ExpressionCandidate::neutral());
    }

    #[test]
    fn test_from_scores_keeps_last_duplicate() {
        let frame = EmotionFrame::from_scores(&[
            EmotionScore {
                name: "Joy".to_string(),
                score: 0.3,
            },
            EmotionScore {
                name: "Joy".to_string(),
                score: 0.01,
            },
        ]);
        assert!((frame.score("Joy") - 0.01).abs() < f32::EPSILON);
    }

    #[test]
    fn test_custom_table_validation() {
        let blink = ExpressionGroup::new(Expression::Blink, &["Tiredness"], 0.1);
        assert!(VocalMapper::new(vec![blink]).is_err());

        let empty = ExpressionGroup::new(Expression::Smile, &[], 0.1);
        assert!(VocalMapper::new(vec![empty]).is_err());

        let negative = ExpressionGroup::new(Expression::Smile, &["Joy"], -0.1);
        assert!(VocalMapper::new(vec![negative]).is_err());

        let tired = ExpressionGroup::new(Expression::Sad, &["Tiredness"], 0.2);
        let mapper = VocalMapper::new(vec![tired]).unwrap();
        let result = mapper.classify(&EmotionFrame::new().with("Tiredness", 0.25));
        assert_eq!(result.expression, Expression::Sad);
    }

    #[test]
    fn test_built_in_mapper_matches_default_table() {
        assert_eq!(DEFAULT_MAPPER.groups(), default_groups().as_slice());
        let frame = EmotionFrame::new().with("Anger", 0.2);
        assert_eq!(classify_vocal(&frame), VocalMapper::default().classify(&frame));
    }

    #[test]
    fn test_default_table_excludes_neutral_and_blink() {
        for group in default_groups() {
            assert!(group.validate().is_ok());
        }
    }
}
