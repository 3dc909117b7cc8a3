//! Configuration loading and validation.
//!
//! The configuration names the source directories, the destination root and
//! the two kinds of routing rules. It is read from a TOML file and validated
//! eagerly: every field is required and every regex is compiled up front, so
//! a bad rule fails the run before any file is touched.
//!
//! # Configuration File Format
//!
//! ```toml
//! sourcepath = ["~/Downloads", "~/Desktop"]
//! destinationpath = "~/Sorted"
//!
//! [extentiontarget]
//! jpg = "photos"
//! pdf = "documents"
//!
//! # Checked in this order; the first match wins.
//! [[filenameregex]]
//! pattern = 'invoice_(\d{4})\.pdf$'
//! destination = "invoices"
//! ```

use crate::rules::{PatternRule, RuleSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "filetidy.toml";

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// No configuration file was given and none was found in the default locations.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// A required field is absent or empty.
    MissingField(&'static str),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// A filename pattern has no capturing group to take a path segment from.
    MissingCaptureGroup(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::MissingField(field) => {
                write!(f, "Invalid configuration: '{}' is required", field)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::MissingCaptureGroup(pattern) => {
                write!(
                    f,
                    "Regex pattern '{}' needs a capturing group, e.g. '(\\d{{4}})'",
                    pattern
                )
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A filename pattern and the destination subpath it routes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRuleConfig {
    /// Regex matched against the full source path. Needs a capturing group.
    pub pattern: String,
    /// Destination subpath under the destination root.
    pub destination: String,
}

/// The configuration document.
///
/// Fields default to empty when absent so that [`FileTidyConfig::validate`]
/// can name the missing one instead of surfacing a decoder message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTidyConfig {
    /// Directories whose files are organized, in order.
    #[serde(default)]
    pub sourcepath: Vec<String>,

    /// Root directory all routed files land under.
    #[serde(default)]
    pub destinationpath: String,

    /// Extension (no leading dot) to destination subpath.
    #[serde(default)]
    pub extentiontarget: BTreeMap<String, String>,

    /// Pattern rules, in precedence order.
    #[serde(default)]
    pub filenameregex: Vec<PatternRuleConfig>,
}

impl FileTidyConfig {
    /// Load configuration from a file or the default locations.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `filetidy.toml` in the current directory
    /// 3. Look for `~/.config/filetidy/config.toml` in home directory
    ///
    /// Unlike filters, routing rules have no sensible defaults, so finding
    /// nothing is an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if no file exists, or the
    /// errors of [`FileTidyConfig::load_from_file`].
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(home_config) = Self::home_config_path()
            && home_config.exists()
        {
            return Self::load_from_file(&home_config);
        }

        Err(ConfigError::ConfigNotFound(local_config))
    }

    /// Path of the per-user configuration file, if the home directory is known.
    pub fn home_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("filetidy").join("config.toml"))
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&content)
    }

    /// Decode configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Check that every required field is present and non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sourcepath.is_empty() {
            return Err(ConfigError::MissingField("sourcepath"));
        }
        if self.destinationpath.is_empty() {
            return Err(ConfigError::MissingField("destinationpath"));
        }
        if self.extentiontarget.is_empty() {
            return Err(ConfigError::MissingField("extentiontarget"));
        }
        if self.filenameregex.is_empty() {
            return Err(ConfigError::MissingField("filenameregex"));
        }
        Ok(())
    }

    /// Validate and compile the routing rules.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is missing, a pattern does not compile,
    /// or a pattern has no capturing group.
    pub fn compile(&self) -> Result<RuleSet, ConfigError> {
        self.validate()?;

        let patterns = self
            .filenameregex
            .iter()
            .map(|rule| {
                let regex = Regex::new(&rule.pattern).map_err(|e| {
                    ConfigError::InvalidRegexPattern {
                        pattern: rule.pattern.clone(),
                        reason: e.to_string(),
                    }
                })?;
                // group 0 is the whole match
                if regex.captures_len() < 2 {
                    return Err(ConfigError::MissingCaptureGroup(rule.pattern.clone()));
                }
                Ok(PatternRule::new(regex, rule.destination.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let extensions = self
            .extentiontarget
            .iter()
            .map(|(ext, destination)| (ext.clone(), destination.clone()))
            .collect();

        Ok(RuleSet::new(patterns, extensions))
    }
}
