//! Configuration management for the expression and voice pipelines

pub mod file;

use std::path::Path;

use serde::Serialize;

use crate::face::DEFAULT_MIN_CONFIDENCE;
use crate::smoother::SmootherConfig;
use crate::vocal::VocalMapper;
use crate::voice::{
    CommandTable, DEFAULT_COMMAND_MIN_CONFIDENCE, NavigationPolicy, WakeWordConfig,
};
use crate::{Error, Result};

pub use file::{RinaConfigFile, config_file_path, load_config_file, read_config_file};

/// Resolved runtime configuration
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    /// Facial classifier settings
    pub face: FaceConfig,

    /// Expression smoother settings
    pub smoother: SmootherConfig,

    /// Vocal group table
    pub vocal: VocalMapper,

    /// Wake phrase settings
    pub wake_word: WakeWordConfig,

    /// Voice command table and acceptance threshold
    pub commands: CommandsConfig,

    /// Navigation allow-list
    pub navigation: NavigationPolicy,
}

/// Facial classifier configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaceConfig {
    pub min_confidence: f32,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// Voice command configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandsConfig {
    pub min_confidence: f32,
    pub table: CommandTable,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_COMMAND_MIN_CONFIDENCE,
            table: CommandTable::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// A missing or unreadable file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn load() -> Result<Self> {
        Self::from_file(load_config_file())
    }

    /// Load configuration from an explicit file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or the resulting
    /// configuration is invalid
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::from_file(read_config_file(path)?)
    }

    /// Overlay a parsed config file on top of defaults
    ///
    /// # Errors
    ///
    /// Returns error if a replaced table or any threshold is invalid
    pub fn from_file(fc: RinaConfigFile) -> Result<Self> {
        let defaults_smoother = SmootherConfig::default();
        let smoother = SmootherConfig {
            window_size: fc.smoother.window_size.unwrap_or(defaults_smoother.window_size),
            min_display_time_ms: fc
                .smoother
                .min_display_time_ms
                .unwrap_or(defaults_smoother.min_display_time_ms),
            decay_timeout_ms: fc
                .smoother
                .decay_timeout_ms
                .unwrap_or(defaults_smoother.decay_timeout_ms),
            override_confidence_threshold: fc
                .smoother
                .override_confidence_threshold
                .unwrap_or(defaults_smoother.override_confidence_threshold),
        };

        let vocal = match fc.vocal.groups {
            Some(groups) => VocalMapper::new(groups)?,
            None => VocalMapper::default(),
        };

        let defaults_wake = WakeWordConfig::default();
        let wake_word = WakeWordConfig {
            keywords: fc.wake_word.keywords.unwrap_or(defaults_wake.keywords),
            command_timeout_ms: fc
                .wake_word
                .command_timeout_ms
                .unwrap_or(defaults_wake.command_timeout_ms),
            min_confidence: fc
                .wake_word
                .min_confidence
                .unwrap_or(defaults_wake.min_confidence),
            enabled: fc.wake_word.enabled.unwrap_or(defaults_wake.enabled),
        };

        let commands = CommandsConfig {
            min_confidence: fc
                .commands
                .min_confidence
                .unwrap_or(DEFAULT_COMMAND_MIN_CONFIDENCE),
            table: match fc.commands.table {
                Some(table) => CommandTable::new(table)?,
                None => CommandTable::default(),
            },
        };

        let navigation = fc
            .navigation
            .allowed_paths
            .map_or_else(NavigationPolicy::default, |allowed_paths| NavigationPolicy {
                allowed_paths,
            });

        let config = Self {
            face: FaceConfig {
                min_confidence: fc.face.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE),
            },
            smoother,
            vocal,
            wake_word,
            commands,
            navigation,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if self.smoother.window_size == 0 {
            return Err(Error::Config("smoother.window_size must be at least 1".to_string()));
        }

        check_unit_range("face.min_confidence", self.face.min_confidence)?;
        check_unit_range(
            "smoother.override_confidence_threshold",
            self.smoother.override_confidence_threshold,
        )?;
        check_unit_range("wake_word.min_confidence", self.wake_word.min_confidence)?;
        check_unit_range("commands.min_confidence", self.commands.min_confidence)?;

        self.wake_word.validate()?;

        for group in self.vocal.groups() {
            group.validate()?;
        }

        Ok(())
    }
}

fn check_unit_range(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Config(format!("{name} must be within [0, 1], got {value}")))
    }
}
