//! wftempl Configuration Module
//!
//! Persistent defaults for the CLI, stored in `~/.config/wftempl/config.toml`:
//!
//! ```toml
//! [output]
//! format = "yaml"        # yaml | json
//!
//! [substitution]
//! mode = "whole"         # whole | interpolate
//!
//! [store]
//! root = "/srv/templates"
//! ```
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. CLI flags
//! 2. Environment variables (`WFTEMPL_FORMAT`, `WFTEMPL_SUBSTITUTION`, `WFTEMPL_STORE`)
//! 3. Config file
//! 4. Defaults

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::binding::SubstitutionMode;
use crate::error::{Result, WftError};

pub const ENV_FORMAT: &str = "WFTEMPL_FORMAT";
pub const ENV_SUBSTITUTION: &str = "WFTEMPL_SUBSTITUTION";
pub const ENV_STORE: &str = "WFTEMPL_STORE";

/// Rendering of instantiated documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    /// Render a document in this format
    pub fn render(&self, document: &Value) -> Result<String> {
        match self {
            OutputFormat::Yaml => serde_yaml::to_string(document).map_err(WftError::from),
            OutputFormat::Json => serde_json::to_string_pretty(document).map_err(WftError::from),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        })
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WftConfig {
    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub substitution: SubstitutionSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubstitutionSettings {
    #[serde(default)]
    pub mode: SubstitutionMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreSettings {
    /// Root directory of a directory-backed template store
    pub root: Option<PathBuf>,
}

impl WftConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/wftempl/` on Unix, `%APPDATA%/wftempl/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wftempl")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| WftError::ConfigError {
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| WftError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.exists()) {
            fs::create_dir_all(dir).map_err(|e| WftError::ConfigError {
                reason: format!("Failed to create config directory: {}", e),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| WftError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| WftError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })?;

        Ok(())
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    pub fn with_env(self) -> Self {
        self.with_vars(|name| std::env::var(name).ok())
    }

    /// Merge with variables from an arbitrary lookup
    pub fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(raw) = var(ENV_FORMAT) {
            match OutputFormat::parse(&raw) {
                Some(format) => self.output.format = format,
                None => warn!(var = ENV_FORMAT, value = %raw, "Ignoring unknown output format"),
            }
        }

        if let Some(raw) = var(ENV_SUBSTITUTION) {
            match SubstitutionMode::parse(&raw) {
                Some(mode) => self.substitution.mode = mode,
                None => {
                    warn!(var = ENV_SUBSTITUTION, value = %raw, "Ignoring unknown substitution mode")
                }
            }
        }

        if let Some(root) = var(ENV_STORE) {
            self.store.root = Some(PathBuf::from(root));
        }

        self
    }
}
