//! Wake word detection and command lookup over normalized transcripts

use serde::Serialize;

use super::commands::{CommandTable, MatchType, VoiceCommand, WakeWordConfig};
use super::normalize::normalize;
use super::similarity::similarity;

/// Transcripts shorter than this (in characters) are never scored by edit
/// distance or reverse containment; short fragments match too much
pub const MIN_FUZZY_CHARS: usize = 3;

/// Transcripts shorter than this never match a command
pub const MIN_COMMAND_CHARS: usize = 2;

const EXACT_SCORE: f32 = 1.0;
const CONTAINS_SCORE: f32 = 0.9;
const CONTAINED_SCORE: f32 = 0.8;

/// Result of wake word detection
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WakeWordMatch {
    pub detected: bool,
    /// Best keyword score, reported even when below the threshold
    pub confidence: f32,
}

/// Best command for a transcript
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CommandMatch<'a> {
    pub command: &'a VoiceCommand,
    pub confidence: f32,
}

/// Check a transcript for any configured wake word
#[must_use]
pub fn detect_wake_word(transcript: &str, config: &WakeWordConfig) -> WakeWordMatch {
    let normalized = normalize(transcript);
    if normalized.is_empty() {
        return WakeWordMatch::default();
    }

    let long_enough = normalized.chars().count() >= MIN_FUZZY_CHARS;
    let best = config
        .keywords
        .iter()
        .map(|keyword| {
            let keyword = normalize(keyword);
            if normalized == keyword {
                EXACT_SCORE
            } else if normalized.contains(&keyword) {
                CONTAINS_SCORE
            } else if !long_enough {
                0.0
            } else if keyword.contains(&normalized) {
                CONTAINED_SCORE
            } else {
                similarity(&normalized, &keyword)
            }
        })
        .fold(0.0_f32, f32::max);

    let result = WakeWordMatch {
        detected: best >= config.min_confidence,
        confidence: best,
    };
    tracing::trace!(transcript, detected = result.detected, confidence = best, "wake word check");
    result
}

impl CommandTable {
    /// Find the best (command, pattern) pair for a transcript
    ///
    /// Returns `None` when the transcript is too short or the best score is
    /// below `min_confidence`. Earlier pairs win ties.
    #[must_use]
    pub fn match_command(&self, transcript: &str, min_confidence: f32) -> Option<CommandMatch<'_>> {
        let normalized = normalize(transcript);
        if normalized.chars().count() < MIN_COMMAND_CHARS {
            return None;
        }

        let mut best: Option<CommandMatch<'_>> = None;
        for command in self.commands() {
            for pattern in &command.patterns {
                let pattern = normalize(pattern);
                let confidence = score_pattern(&normalized, &pattern, command.match_type);
                if best.is_none_or(|b| confidence > b.confidence) {
                    best = Some(CommandMatch {
                        command,
                        confidence,
                    });
                }
            }
        }

        best.filter(|b| b.confidence >= min_confidence)
    }
}

/// Match a transcript against the built-in command table
#[must_use]
pub fn match_command(transcript: &str, min_confidence: f32) -> Option<(VoiceCommand, f32)> {
    let table = CommandTable::default();
    table
        .match_command(transcript, min_confidence)
        .map(|m| (m.command.clone(), m.confidence))
}

fn score_pattern(transcript: &str, pattern: &str, match_type: MatchType) -> f32 {
    match match_type {
        MatchType::Exact => {
            if transcript == pattern {
                EXACT_SCORE
            } else {
                0.0
            }
        }
        MatchType::Fuzzy => similarity(transcript, pattern),
        MatchType::Partial => {
            if transcript == pattern {
                EXACT_SCORE
            } else if transcript.contains(pattern) {
                CONTAINS_SCORE
            } else if pattern.contains(transcript) {
                CONTAINED_SCORE
            } else {
                similarity(transcript, pattern)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::CommandAction;

    fn callback(id: &str, patterns: &[&str], match_type: MatchType) -> VoiceCommand {
        VoiceCommand {
            id: id.to_string(),
            patterns: patterns.iter().map(ToString::to_string).collect(),
            action: CommandAction::Callback {
                handle: id.to_string(),
            },
            match_type,
            description: String::new(),
        }
    }

    #[test]
    fn test_wake_word_exact() {
        let config = WakeWordConfig::default();
        let result = detect_wake_word("りなちゃん", &config);
        assert!(result.detected);
        assert!((result.confidence - 1.0).abs() < f32::EPSILON);

        assert!(detect_wake_word("リナちゃん", &config).detected);
    }

    #[test]
    fn test_wake_word_inside_sentence() {
        let config = WakeWordConfig::default();
        let result = detect_wake_word("ねえりなちゃんきいて", &config);
        assert!(result.detected);
        assert!((result.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_wake_word_empty_and_short() {
        let config = WakeWordConfig::default();
        assert_eq!(detect_wake_word("  、。 ", &config), WakeWordMatch::default());

        // Prefix of a keyword but under the fuzzy minimum
        let result = detect_wake_word("り", &config);
        assert!(!result.detected);
        assert!(result.confidence.abs() < f32::EPSILON);
    }

    #[test]
    fn test_wake_word_partial_keyword() {
        let config = WakeWordConfig::default();
        // Contains "りな", which outranks being a prefix of a longer keyword
        let result = detect_wake_word("りなちゃんぼ", &config);
        assert!(result.detected);
        assert!((result.confidence - 0.9).abs() < 1e-6);

        let config = WakeWordConfig {
            keywords: vec!["hello rina".to_string()],
            ..WakeWordConfig::default()
        };
        let result = detect_wake_word("llori", &config);
        assert!((result.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_wake_word_below_threshold_reports_confidence() {
        let config = WakeWordConfig {
            keywords: vec!["abcdef".to_string()],
            min_confidence: 0.9,
            ..WakeWordConfig::default()
        };
        let result = detect_wake_word("abcxyz", &config);
        assert!(!result.detected);
        assert!((result.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_unrelated_transcript_is_not_wake_word() {
        let config = WakeWordConfig::default();
        assert!(!detect_wake_word("こんにちは", &config).detected);
    }

    #[test]
    fn test_match_editor_command() {
        let (command, confidence) = match_command("エディター起動", 0.7).unwrap();
        assert_eq!(command.id, "open-editor");
        assert!(confidence >= 0.7);
    }

    #[test]
    fn test_match_contains_pattern() {
        let (command, confidence) = match_command("ギャラリーを開いて", 0.7).unwrap();
        assert_eq!(command.id, "open-gallery");
        assert!((confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_match_rejects_short_and_unrelated() {
        assert!(match_command("ほ", 0.7).is_none());
        assert!(match_command("", 0.0).is_none());
        assert!(match_command("きょうのてんき", 0.7).is_none());
    }

    #[test]
    fn test_match_type_exact() {
        let table =
            CommandTable::new(vec![callback("stop", &["すとっぷ"], MatchType::Exact)]).unwrap();
        assert!(table.match_command("すとっぷして", 0.5).is_none());
        let matched = table.match_command("ストップ", 0.5).unwrap();
        assert_eq!(matched.command.id, "stop");
        assert!((matched.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_match_type_fuzzy_uses_similarity() {
        let table =
            CommandTable::new(vec![callback("start", &["すたーと"], MatchType::Fuzzy)]).unwrap();
        // Containment through similarity scores 0.7 + 4/6 * 0.2, not 0.9
        let matched = table.match_command("すたーとして", 0.5).unwrap();
        assert!((matched.confidence - (0.7 + 4.0 / 6.0 * 0.2)).abs() < 1e-6);
    }

    #[test]
    fn test_earlier_pair_wins_tie() {
        let table = CommandTable::new(vec![
            callback("first", &["あいう"], MatchType::Partial),
            callback("second", &["あいう"], MatchType::Partial),
        ])
        .unwrap();
        assert_eq!(table.match_command("あいう", 0.7).unwrap().command.id, "first");
    }
}
