//! Configuration loading and typed config structures for the Bastion engine.
//!
//! The canonical configuration lives in `bastion-config.yaml` next to the
//! scenario being run. Every field has a default, so an empty file (or no
//! file at all) yields a working configuration.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `bastion-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Engine-wide settings (seed, checkpoint location, timeouts).
    #[serde(default)]
    pub engine: EngineSection,

    /// Movement phase settings.
    #[serde(default)]
    pub movement: MovementConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `BASTION_SEED` overrides `engine.seed`
    /// - `BASTION_CHECKPOINT` overrides `engine.checkpoint_path`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.engine.apply_env_overrides();
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSection {
    /// Seed for the dice roller.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Where checkpoints are written.
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: String,

    /// Milliseconds to wait for a participant's decision.
    #[serde(default = "default_decision_timeout_ms")]
    pub decision_timeout_ms: u64,
}

impl EngineSection {
    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BASTION_SEED") {
            match val.parse() {
                Ok(seed) => self.seed = seed,
                Err(e) => tracing::warn!(value = %val, error = %e, "ignoring invalid BASTION_SEED"),
            }
        }
        if let Ok(val) = std::env::var("BASTION_CHECKPOINT") {
            self.checkpoint_path = val;
        }
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            checkpoint_path: default_checkpoint_path(),
            decision_timeout_ms: default_decision_timeout_ms(),
        }
    }
}

const fn default_seed() -> u64 {
    42
}

fn default_checkpoint_path() -> String {
    String::from("bastion-checkpoint.json")
}

const fn default_decision_timeout_ms() -> u64 {
    30_000
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Movement phase settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MovementConfig {
    /// Number of sides on the dice anti-air guns roll.
    #[serde(default = "default_dice_sides")]
    pub dice_sides: u32,

    /// An anti-air roll at or below this value hits.
    #[serde(default = "default_aa_hit_on")]
    pub aa_hit_on: u32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            dice_sides: default_dice_sides(),
            aa_hit_on: default_aa_hit_on(),
        }
    }
}

const fn default_dice_sides() -> u32 {
    6
}

const fn default_aa_hit_on() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_uses_defaults() {
        let config = EngineConfig::parse("").unwrap();
        assert_eq!(config.movement, MovementConfig::default());
        assert_eq!(config.movement.dice_sides, 6);
        assert_eq!(config.movement.aa_hit_on, 1);
        assert_eq!(config.logging.filter, "info");
        assert_eq!(config.engine.decision_timeout_ms, 30_000);
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let yaml = r"
movement:
  aa_hit_on: 2
logging:
  filter: debug
";
        let config = EngineConfig::parse(yaml).unwrap();
        assert_eq!(config.movement.aa_hit_on, 2);
        assert_eq!(config.movement.dice_sides, 6);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = EngineConfig::parse("movement: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = EngineConfig::from_file(Path::new("/nonexistent/bastion-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
