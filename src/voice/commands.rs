//! Voice command and wake word configuration

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::normalize::normalize;
use crate::{Error, Result};

/// Default time to wait for a command after the wake word
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 5000;

/// Default minimum wake word confidence, kept low since the keywords are short
pub const DEFAULT_WAKE_MIN_CONFIDENCE: f32 = 0.5;

/// Default minimum command match confidence
pub const DEFAULT_COMMAND_MIN_CONFIDENCE: f32 = 0.7;

/// What a matched command asks the host to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CommandAction {
    /// Navigate to an application path
    Navigate { path: String },
    /// Invoke a host-registered callback by name
    Callback { handle: String },
}

/// How a command's patterns are compared with the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    #[default]
    Partial,
    Fuzzy,
}

/// A spoken command definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCommand {
    /// Unique command identifier
    pub id: String,

    /// Trigger phrases, compared after normalization
    pub patterns: Vec<String>,

    pub action: CommandAction,

    #[serde(default)]
    pub match_type: MatchType,

    #[serde(default)]
    pub description: String,
}

impl VoiceCommand {
    fn navigate(id: &str, path: &str, patterns: &[&str], description: &str) -> Self {
        Self {
            id: id.to_string(),
            patterns: patterns.iter().map(ToString::to_string).collect(),
            action: CommandAction::Navigate {
                path: path.to_string(),
            },
            match_type: MatchType::Partial,
            description: description.to_string(),
        }
    }
}

/// Ordered set of voice commands with unique ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTable {
    commands: Vec<VoiceCommand>,
}

impl Default for CommandTable {
    fn default() -> Self {
        Self {
            commands: default_commands(),
        }
    }
}

impl CommandTable {
    /// Create a table from command definitions
    ///
    /// # Errors
    ///
    /// Returns error on duplicate ids, commands without patterns, and
    /// patterns that normalize to nothing (they would match any transcript)
    pub fn new(commands: Vec<VoiceCommand>) -> Result<Self> {
        let mut seen = HashSet::new();
        for command in &commands {
            if !seen.insert(command.id.as_str()) {
                return Err(Error::Config(format!("duplicate voice command id: {}", command.id)));
            }
            if command.patterns.is_empty() {
                return Err(Error::Config(format!(
                    "voice command {} has no patterns",
                    command.id
                )));
            }
            if let Some(pattern) = command.patterns.iter().find(|p| normalize(p).is_empty()) {
                return Err(Error::Config(format!(
                    "voice command {} has an empty pattern: {pattern:?}",
                    command.id
                )));
            }
        }
        Ok(Self { commands })
    }

    #[must_use]
    pub fn commands(&self) -> &[VoiceCommand] {
        &self.commands
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&VoiceCommand> {
        self.commands.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Built-in navigation commands
#[must_use]
pub fn default_commands() -> Vec<VoiceCommand> {
    vec![
        VoiceCommand::navigate(
            "go-home",
            "/",
            &["ホーム", "ほーむ", "ホームに戻る", "ほーむにもどる", "戻る", "もどる"],
            "ホーム画面に戻ります",
        ),
        VoiceCommand::navigate(
            "face-mode",
            "/face",
            &[
                "表情認識",
                "ひょうじょうにんしき",
                "カメラモード",
                "かめらもーど",
                "表情認識モード",
                "ひょうじょうにんしきもーど",
            ],
            "表情認識モードを起動します",
        ),
        VoiceCommand::navigate(
            "voice-mode",
            "/voice",
            &[
                "音声感情",
                "おんせいかんじょう",
                "ボイスモード",
                "ぼいすもーど",
                "音声感情モード",
                "おんせいかんじょうもーど",
            ],
            "音声感情モードを起動します",
        ),
        VoiceCommand::navigate(
            "open-gallery",
            "/gallery",
            &["ギャラリー", "ぎゃらりー", "ギャラリーを開く", "ぎゃらりーをひらく"],
            "ギャラリーを開きます",
        ),
        VoiceCommand::navigate(
            "open-editor",
            "/editor",
            &[
                "エディターモード起動",
                "えでぃたーもーどきどう",
                "エディタモード起動",
                "えでぃたもーどきどう",
                "エディターモード",
                "えでぃたーもーど",
                "エディター起動",
                "えでぃたーきどう",
                "エディタ起動",
                "えでぃたきどう",
            ],
            "ドット絵エディターを起動します",
        ),
    ]
}

/// Wake phrase settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WakeWordConfig {
    /// Trigger phrases, compared after normalization
    pub keywords: Vec<String>,

    /// Command window opened by the wake word
    pub command_timeout_ms: u64,

    /// Minimum confidence for a wake word to count
    pub min_confidence: f32,

    /// When false, every final fragment is matched as a command directly
    pub enabled: bool,
}

impl Default for WakeWordConfig {
    fn default() -> Self {
        // Shorter, easier to recognize forms first
        let keywords = [
            "りな",
            "リナ",
            "璃奈",
            "りなちゃん",
            "リナちゃん",
            "璃奈ちゃん",
            "璃奈ちゃんボード",
            "りなちゃんぼーど",
            "リナちゃんボード",
            "りなちゃんボード",
        ];

        Self {
            keywords: keywords.iter().map(ToString::to_string).collect(),
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            min_confidence: DEFAULT_WAKE_MIN_CONFIDENCE,
            enabled: true,
        }
    }
}

impl WakeWordConfig {
    /// Reject keyword lists that could never match or would match everything
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the list is empty or a keyword
    /// normalizes to nothing
    pub fn validate(&self) -> Result<()> {
        if self.keywords.is_empty() {
            return Err(Error::Config("wake_word.keywords must not be empty".to_string()));
        }
        if let Some(keyword) = self.keywords.iter().find(|k| normalize(k).is_empty()) {
            return Err(Error::Config(format!(
                "wake_word.keywords has an empty keyword: {keyword:?}"
            )));
        }
        Ok(())
    }
}

/// Allow-list applied to navigation actions before they reach the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationPolicy {
    pub allowed_paths: Vec<String>,
}

impl Default for NavigationPolicy {
    fn default() -> Self {
        let paths = ["/", "/face", "/voice", "/gallery", "/editor", "/settings"];
        Self {
            allowed_paths: paths.iter().map(ToString::to_string).collect(),
        }
    }
}

impl NavigationPolicy {
    #[must_use]
    pub fn is_allowed(&self, path: &str) -> bool {
        self.allowed_paths.iter().any(|p| p == path)
    }

    /// Pass an action through the allow-list
    ///
    /// Navigation to an unlisted path is dropped; callbacks are untouched.
    #[must_use]
    pub fn filter<'a>(&self, action: &'a CommandAction) -> Option<&'a CommandAction> {
        match action {
            CommandAction::Navigate { path } if !self.is_allowed(path) => {
                tracing::warn!(path, "navigation path not allowed");
                None
            }
            _ => Some(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        let table = CommandTable::new(default_commands()).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(
            table.get("open-editor").map(|c| &c.action),
            Some(&CommandAction::Navigate {
                path: "/editor".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut commands = default_commands();
        commands.push(commands[0].clone());
        assert!(CommandTable::new(commands).is_err());
    }

    #[test]
    fn test_empty_patterns_rejected() {
        let mut command = default_commands().remove(0);
        command.patterns = vec!["  ".to_string()];
        assert!(CommandTable::new(vec![command.clone()]).is_err());

        command.patterns = Vec::new();
        assert!(CommandTable::new(vec![command]).is_err());
    }

    #[test]
    fn test_pattern_empty_after_normalization_rejected() {
        let mut command = default_commands().remove(0);
        command.patterns.push("。".to_string());
        assert!(matches!(CommandTable::new(vec![command]), Err(Error::Config(_))));
    }

    #[test]
    fn test_wake_keywords_validation() {
        assert!(WakeWordConfig::default().validate().is_ok());

        let mut config = WakeWordConfig::default();
        config.keywords.push(" ".to_string());
        assert!(config.validate().is_err());

        config.keywords = vec!["、".to_string()];
        assert!(config.validate().is_err());

        config.keywords.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_action_serde_shape() {
        let action: CommandAction =
            serde_json::from_str(r#"{"type": "navigate", "path": "/face"}"#).unwrap();
        assert_eq!(
            action,
            CommandAction::Navigate {
                path: "/face".to_string()
            }
        );

        let json = serde_json::to_value(CommandAction::Callback {
            handle: "toggle-mic".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "callback");
        assert_eq!(json["handle"], "toggle-mic");
    }

    #[test]
    fn test_match_type_defaults_to_partial() {
        let command: VoiceCommand = serde_json::from_str(
            r#"{
                "id": "x",
                "patterns": ["えっくす"],
                "action": {"type": "callback", "handle": "x"}
            }"#,
        )
        .unwrap();
        assert_eq!(command.match_type, MatchType::Partial);
        assert!(command.description.is_empty());
    }

    #[test]
    fn test_navigation_policy() {
        let policy = NavigationPolicy::default();
        let home = CommandAction::Navigate {
            path: "/".to_string(),
        };
        let admin = CommandAction::Navigate {
            path: "/admin".to_string(),
        };
        let callback = CommandAction::Callback {
            handle: "anything".to_string(),
        };

        assert_eq!(policy.filter(&home), Some(&home));
        assert_eq!(policy.filter(&admin), None);
        assert_eq!(policy.filter(&callback), Some(&callback));
    }
}
