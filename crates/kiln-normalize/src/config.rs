//! Pass configuration (kiln.toml)
//!
//! Every key is optional; an empty file yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "kiln.toml";

/// Errors that can occur while loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Configuration of the normalization pass
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NormalizeConfig {
    /// Method names of the chaining markers
    #[serde(default)]
    pub markers: MarkerNames,

    /// Names used in generated code
    #[serde(default)]
    pub emit: EmitOptions,

    /// Reconciliation of conditional arms
    #[serde(default)]
    pub branches: BranchSettings,
}

/// Method names that identify chaining calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkerNames {
    /// `this.<this_init>(...)` delegates to another initializer of the same type
    #[serde(default = "default_init_name")]
    pub this_init: String,

    /// `super.<super_init>(...)` chains to the parent initializer
    #[serde(default = "default_init_name")]
    pub super_init: String,

    /// `this.<completion>()` marks the object as fully initialized
    #[serde(default = "default_completion")]
    pub completion: String,
}

fn default_init_name() -> String {
    "init".to_string()
}

fn default_completion() -> String {
    "complete".to_string()
}

impl Default for MarkerNames {
    fn default() -> Self {
        Self {
            this_init: default_init_name(),
            super_init: default_init_name(),
            completion: default_completion(),
        }
    }
}

/// Names used in generated code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmitOptions {
    /// Prefix of temporaries (`tmp1`, `tmp2`, ...)
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,

    /// Function producing the default value of a type
    #[serde(default = "default_default_of")]
    pub default_of: String,

    /// Initializer invoked on record-typed temporaries
    #[serde(default = "default_init_name")]
    pub init_method: String,

    /// Name of the synthesized outer formal and field
    #[serde(default = "default_outer_name")]
    pub outer_name: String,
}

fn default_temp_prefix() -> String {
    "tmp".to_string()
}

fn default_default_of() -> String {
    "_defaultOf".to_string()
}

fn default_outer_name() -> String {
    "outer".to_string()
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            temp_prefix: default_temp_prefix(),
            default_of: default_default_of(),
            init_method: default_init_name(),
            outer_name: default_outer_name(),
        }
    }
}

/// `[branches]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BranchSettings {
    /// How the arms of a conditional are reconciled
    #[serde(default)]
    pub policy: BranchPolicy,
}

/// How the arms of a conditional are reconciled
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BranchPolicy {
    /// Arms must agree on phase and initialized fields
    #[default]
    Strict,
    /// The then-arm is merged, then the else-arm
    LastWriterWins,
}

impl NormalizeConfig {
    /// Load a configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from a string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: NormalizeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `kiln.toml` from `dir` when present, else the defaults
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            ("markers.this_init", &self.markers.this_init),
            ("markers.super_init", &self.markers.super_init),
            ("markers.completion", &self.markers.completion),
            ("emit.temp_prefix", &self.emit.temp_prefix),
            ("emit.default_of", &self.emit.default_of),
            ("emit.init_method", &self.emit.init_method),
            ("emit.outer_name", &self.emit.outer_name),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("{} cannot be empty", key)));
            }
        }

        // Both are called on `this`
        if self.markers.this_init == self.markers.completion {
            return Err(ConfigError::ValidationError(format!(
                "markers.this_init and markers.completion must differ (both are '{}')",
                self.markers.this_init
            )));
        }

        Ok(())
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
