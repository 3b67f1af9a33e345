//! Loudness-based voice activity
//!
//! Supplies the speaking flag that accompanies every vocal observation.

/// RMS level above which a chunk counts as speech
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 0.01;

/// Tracks whether the microphone currently carries speech
#[derive(Debug, Clone)]
pub struct VoiceActivity {
    threshold: f32,
    speaking: bool,
}

impl Default for VoiceActivity {
    fn default() -> Self {
        Self::new(DEFAULT_SILENCE_THRESHOLD)
    }
}

impl VoiceActivity {
    #[must_use]
    pub const fn new(threshold: f32) -> Self {
        Self {
            threshold,
            speaking: false,
        }
    }

    /// Feed one PCM chunk
    ///
    /// Returns `Some(speaking)` when the flag changed, `None` otherwise.
    pub fn process(&mut self, samples: &[f32]) -> Option<bool> {
        let rms = calculate_rms(samples);
        let speaking = rms > self.threshold;

        if speaking == self.speaking {
            return None;
        }

        self.speaking = speaking;
        tracing::trace!(rms, speaking, "voice activity changed");
        Some(speaking)
    }

    #[must_use]
    pub const fn is_speaking(&self) -> bool {
        self.speaking
    }

    /// Forget the current flag, e.g. when the microphone stops
    pub const fn reset(&mut self) {
        self.speaking = false;
    }
}

/// Calculate RMS level of audio samples
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
