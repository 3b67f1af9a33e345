//! Temporal smoothing of classifier output
//!
//! Three mechanisms keep the displayed expression stable:
//! - a mode filter over the last few samples resists single-frame flicker
//! - a minimum display time holds a new expression unless a clearly
//!   stronger one arrives
//! - silence decay returns to neutral once speech has stopped for a while

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{Expression, ExpressionCandidate};

const DEFAULT_WINDOW_SIZE: usize = 3;
const DEFAULT_MIN_DISPLAY_TIME_MS: u64 = 1500;
const DEFAULT_DECAY_TIMEOUT_MS: u64 = 2000;
const DEFAULT_OVERRIDE_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Smoother tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    /// Number of recent samples considered by the mode filter
    pub window_size: usize,

    /// Time an expression is held before an ordinary switch is allowed
    pub min_display_time_ms: u64,

    /// Silence after which the expression decays to neutral
    pub decay_timeout_ms: u64,

    /// Confidence that may interrupt the minimum display time
    pub override_confidence_threshold: f32,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_display_time_ms: DEFAULT_MIN_DISPLAY_TIME_MS,
            decay_timeout_ms: DEFAULT_DECAY_TIMEOUT_MS,
            override_confidence_threshold: DEFAULT_OVERRIDE_CONFIDENCE_THRESHOLD,
        }
    }
}

/// One classifier result presented to the smoother
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmootherSample {
    pub expression: Expression,
    pub confidence: f32,
    pub is_speaking: bool,
    /// Monotonic time in milliseconds
    pub timestamp_ms: u64,
}

impl SmootherSample {
    #[must_use]
    pub const fn new(candidate: ExpressionCandidate, is_speaking: bool, timestamp_ms: u64) -> Self {
        Self {
            expression: candidate.expression,
            confidence: candidate.confidence,
            is_speaking,
            timestamp_ms,
        }
    }
}

/// Debounces and decays a stream of expression candidates
///
/// One instance per session; not shared between threads.
#[derive(Debug, Clone)]
pub struct ExpressionSmoother {
    config: SmootherConfig,
    history: VecDeque<SmootherSample>,
    current: Expression,
    last_change_ms: u64,
    last_speaking_ms: u64,
}

impl Default for ExpressionSmoother {
    fn default() -> Self {
        Self::new(SmootherConfig::default())
    }
}

impl ExpressionSmoother {
    /// Create a smoother; a zero window is treated as one
    #[must_use]
    pub fn new(config: SmootherConfig) -> Self {
        let config = SmootherConfig {
            window_size: config.window_size.max(1),
            ..config
        };

        Self {
            history: VecDeque::with_capacity(config.window_size + 1),
            config,
            current: Expression::Neutral,
            last_change_ms: 0,
            last_speaking_ms: 0,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SmootherConfig {
        &self.config
    }

    /// Expression currently on display
    #[must_use]
    pub const fn current(&self) -> Expression {
        self.current
    }

    /// Feed one sample and return the expression to display
    pub fn update(&mut self, sample: SmootherSample) -> Expression {
        self.history.push_back(sample);
        while self.history.len() > self.config.window_size {
            self.history.pop_front();
        }

        let now = sample.timestamp_ms;
        if sample.is_speaking {
            self.last_speaking_ms = now;
        }

        let silent_for = now.saturating_sub(self.last_speaking_ms);
        if !sample.is_speaking && silent_for > self.config.decay_timeout_ms {
            if self.current != Expression::Neutral {
                tracing::debug!(from = %self.current, silent_for, "expression decayed to neutral");
                self.switch_to(Expression::Neutral, now);
            }
            return self.current;
        }

        let candidate = self.majority();
        if candidate.expression == self.current {
            return self.current;
        }

        let elapsed = now.saturating_sub(self.last_change_ms);
        if elapsed < self.config.min_display_time_ms {
            if candidate.confidence > self.config.override_confidence_threshold {
                tracing::debug!(
                    from = %self.current,
                    to = %candidate.expression,
                    confidence = candidate.confidence,
                    elapsed,
                    "strong expression overrides display hold"
                );
                self.switch_to(candidate.expression, now);
            }
            return self.current;
        }

        tracing::debug!(from = %self.current, to = %candidate.expression, "expression changed");
        self.switch_to(candidate.expression, now);
        self.current
    }

    /// Most frequent expression in the window
    ///
    /// Ties go to the higher mean confidence; remaining ties keep the
    /// expression seen first. Confidence is that expression's mean.
    #[must_use]
    pub fn majority(&self) -> ExpressionCandidate {
        if self.history.is_empty() {
            return ExpressionCandidate::neutral();
        }

        // (expression, count, total confidence) in first-occurrence order
        let mut tallies: Vec<(Expression, usize, f32)> = Vec::with_capacity(self.history.len());
        for sample in &self.history {
            match tallies.iter_mut().find(|(e, _, _)| *e == sample.expression) {
                Some(tally) => {
                    tally.1 += 1;
                    tally.2 += sample.confidence;
                }
                None => tallies.push((sample.expression, 1, sample.confidence)),
            }
        }

        let mut best = ExpressionCandidate::new(Expression::Neutral, 0.0);
        let mut best_count = 0;
        for (expression, count, total) in tallies {
            #[allow(clippy::cast_precision_loss)]
            let mean = total / count as f32;
            if count > best_count || (count == best_count && mean > best.confidence) {
                best = ExpressionCandidate::new(expression, mean);
                best_count = count;
            }
        }

        best
    }

    /// Clear history and return to neutral
    pub fn reset(&mut self) {
        self.history.clear();
        self.current = Expression::Neutral;
        self.last_change_ms = 0;
        self.last_speaking_ms = 0;
    }

    fn switch_to(&mut self, expression: Expression, now: u64) {
        self.current = expression;
        self.last_change_ms = now;
    }
}
