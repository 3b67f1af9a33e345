//! Expression vocabulary shared by both classifiers and the smoother

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Displayable facial expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    /// Resting face, also the fallback for every classifier
    #[default]
    Neutral,
    Smile,
    Sad,
    Angry,
    Surprised,
    Blink,
    Confused,
    Smug,
    Questioning,
    Embarrassed,
}

impl Expression {
    /// Every expression in display order
    pub const ALL: [Self; 10] = [
        Self::Neutral,
        Self::Smile,
        Self::Surprised,
        Self::Blink,
        Self::Sad,
        Self::Angry,
        Self::Confused,
        Self::Smug,
        Self::Questioning,
        Self::Embarrassed,
    ];

    /// Order in which facial rules are evaluated (highest priority first)
    pub const FACIAL_PRIORITY: [Self; 10] = [
        Self::Blink,
        Self::Surprised,
        Self::Angry,
        Self::Smug,
        Self::Smile,
        Self::Sad,
        Self::Questioning,
        Self::Confused,
        Self::Embarrassed,
        Self::Neutral,
    ];

    /// Stable lowercase identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Smile => "smile",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Surprised => "surprised",
            Self::Blink => "blink",
            Self::Confused => "confused",
            Self::Smug => "smug",
            Self::Questioning => "questioning",
            Self::Embarrassed => "embarrassed",
        }
    }

    /// Japanese display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Neutral => "ニュートラル",
            Self::Smile => "笑顔",
            Self::Sad => "悲しみ",
            Self::Angry => "怒り",
            Self::Surprised => "驚き",
            Self::Blink => "まばたき",
            Self::Confused => "困惑",
            Self::Smug => "ドヤ顔",
            Self::Questioning => "疑問",
            Self::Embarrassed => "照れ",
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Expression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == needle)
            .ok_or_else(|| Error::InvalidInput(format!("unknown expression: {s}")))
    }
}

/// Classifier output: an expression and how strongly it was observed
///
/// Confidence is classifier-defined; the only contract is "higher is stronger".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpressionCandidate {
    pub expression: Expression,
    pub confidence: f32,
}

impl ExpressionCandidate {
    #[must_use]
    pub const fn new(expression: Expression, confidence: f32) -> Self {
        Self {
            expression,
            confidence,
        }
    }

    /// Fallback result when nothing qualifies
    #[must_use]
    pub const fn neutral() -> Self {
        Self::new(Expression::Neutral, 1.0)
    }
}
