//! TOML configuration file loading
//!
//! Supports `~/.config/rina/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;
use crate::vocal::ExpressionGroup;
use crate::voice::VoiceCommand;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct RinaConfigFile {
    /// Facial classifier settings
    #[serde(default)]
    pub face: FaceFileConfig,

    /// Expression smoother settings
    #[serde(default)]
    pub smoother: SmootherFileConfig,

    /// Vocal emotion group table
    #[serde(default)]
    pub vocal: VocalFileConfig,

    /// Wake phrase settings
    #[serde(default)]
    pub wake_word: WakeWordFileConfig,

    /// Voice command table
    #[serde(default)]
    pub commands: CommandsFileConfig,

    /// Navigation allow-list
    #[serde(default)]
    pub navigation: NavigationFileConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct FaceFileConfig {
    /// Minimum rule confidence (default 0.3)
    pub min_confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SmootherFileConfig {
    pub window_size: Option<usize>,
    pub min_display_time_ms: Option<u64>,
    pub decay_timeout_ms: Option<u64>,
    pub override_confidence_threshold: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VocalFileConfig {
    /// Replaces the built-in table entirely when present
    pub groups: Option<Vec<ExpressionGroup>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WakeWordFileConfig {
    pub keywords: Option<Vec<String>>,
    pub command_timeout_ms: Option<u64>,
    pub min_confidence: Option<f32>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommandsFileConfig {
    /// Minimum command match confidence (default 0.7)
    pub min_confidence: Option<f32>,

    /// Replaces the built-in command table entirely when present
    pub table: Option<Vec<VoiceCommand>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NavigationFileConfig {
    pub allowed_paths: Option<Vec<String>>,
}

/// Load the TOML config file from the standard path
///
/// Returns `RinaConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> RinaConfigFile {
    let Some(path) = config_file_path() else {
        return RinaConfigFile::default();
    };

    if !path.exists() {
        return RinaConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            RinaConfigFile::default()
        }
    }
}

/// Read and parse a config file at an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML for the schema
pub fn read_config_file(path: &Path) -> Result<RinaConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/rina/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("rina").join("config.toml"))
}
