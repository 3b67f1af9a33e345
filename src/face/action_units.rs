//! Action-unit frames as delivered by the landmark detector

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Facial action units consumed by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionUnit {
    MouthSmileLeft,
    MouthSmileRight,
    JawOpen,
    MouthFrownLeft,
    MouthFrownRight,
    BrowInnerUp,
    BrowOuterUpLeft,
    BrowOuterUpRight,
    BrowDownLeft,
    BrowDownRight,
    EyeBlinkLeft,
    EyeBlinkRight,
    EyeWideLeft,
    EyeWideRight,
}

impl ActionUnit {
    pub const ALL: [Self; 14] = [
        Self::MouthSmileLeft,
        Self::MouthSmileRight,
        Self::JawOpen,
        Self::MouthFrownLeft,
        Self::MouthFrownRight,
        Self::BrowInnerUp,
        Self::BrowOuterUpLeft,
        Self::BrowOuterUpRight,
        Self::BrowDownLeft,
        Self::BrowDownRight,
        Self::EyeBlinkLeft,
        Self::EyeBlinkRight,
        Self::EyeWideLeft,
        Self::EyeWideRight,
    ];

    /// Detector category name (camelCase blendshape identifier)
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MouthSmileLeft => "mouthSmileLeft",
            Self::MouthSmileRight => "mouthSmileRight",
            Self::JawOpen => "jawOpen",
            Self::MouthFrownLeft => "mouthFrownLeft",
            Self::MouthFrownRight => "mouthFrownRight",
            Self::BrowInnerUp => "browInnerUp",
            Self::BrowOuterUpLeft => "browOuterUpLeft",
            Self::BrowOuterUpRight => "browOuterUpRight",
            Self::BrowDownLeft => "browDownLeft",
            Self::BrowDownRight => "browDownRight",
            Self::EyeBlinkLeft => "eyeBlinkLeft",
            Self::EyeBlinkRight => "eyeBlinkRight",
            Self::EyeWideLeft => "eyeWideLeft",
            Self::EyeWideRight => "eyeWideRight",
        }
    }

    /// Look up a unit by its detector category name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|unit| unit.name() == name)
    }
}

/// One scored category as reported by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlendshapeCategory {
    pub category_name: String,
    pub score: f32,
}

/// Per-frame action-unit scores
///
/// Scores are nominally in [0, 1] but are stored as given; missing units
/// read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionUnitFrame {
    scores: HashMap<String, f32>,
}

impl ActionUnitFrame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from a detector category list
    ///
    /// Categories the classifier does not consume are discarded.
    #[must_use]
    pub fn from_categories(categories: &[BlendshapeCategory]) -> Self {
        let scores = categories
            .iter()
            .filter(|c| ActionUnit::from_name(&c.category_name).is_some())
            .map(|c| (c.category_name.clone(), c.score))
            .collect();
        Self { scores }
    }

    /// Builder-style setter
    #[must_use]
    pub fn with(mut self, unit: ActionUnit, score: f32) -> Self {
        self.set(unit, score);
        self
    }

    pub fn set(&mut self, unit: ActionUnit, score: f32) {
        self.scores.insert(unit.name().to_string(), score);
    }

    /// Score for a consumed unit, 0 if the detector omitted it
    #[must_use]
    pub fn score(&self, unit: ActionUnit) -> f32 {
        self.get(unit.name())
    }

    /// Score by raw category name, 0 if absent
    #[must_use]
    pub fn get(&self, name: &str) -> f32 {
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

impl<K: Into<String>> FromIterator<(K, f32)> for ActionUnitFrame {
    fn from_iter<I: IntoIterator<Item = (K, f32)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A single analyzed video frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Whether the detector found a face at all
    pub detected: bool,

    #[serde(default)]
    pub frame: ActionUnitFrame,

    /// Capture time in milliseconds
    pub timestamp_ms: u64,
}
