//! Configuration for the step controller.
//!
//! This module defines the knobs a host can set on a run. It provides:
//! 1. **Defaults:** Baseline limits used when a field is omitted.
//! 2. **Structure:** `EngineConfig`, deserialized from JSON or built with `Default`.
//! 3. **Loading:** Helpers for reading a config from a string or file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration constants for the engine.
mod defaults {
    /// Maximum number of steps in one timeline before `run` halts with
    /// `StepLimitExceeded`.
    pub const MAX_STEPS: usize = 10_000;

    /// Number of steps `run_with` executes between calls to its observer.
    pub const YIELD_EVERY: usize = 256;
}

/// Error raised while loading an `EngineConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("could not read config '{path}': {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid JSON for `EngineConfig`.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Step controller configuration.
///
/// # Examples
///
/// ```
/// use stepsim_core::config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.max_steps, 10_000);
/// assert!(!config.trace_steps);
///
/// let config = EngineConfig::from_json_str(r#"{ "max_steps": 50 }"#).unwrap();
/// assert_eq!(config.max_steps, 50);
/// assert_eq!(config.yield_every, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Step cap for `run`; counts the steps in the active timeline.
    #[serde(default = "EngineConfig::default_max_steps")]
    pub max_steps: usize,

    /// Steps per batch between yields to the host in `run_with`. Zero is treated as one.
    #[serde(default = "EngineConfig::default_yield_every")]
    pub yield_every: usize,

    /// Log every step's state diff at `info` level.
    #[serde(default)]
    pub trace_steps: bool,
}

impl EngineConfig {
    fn default_max_steps() -> usize {
        defaults::MAX_STEPS
    }

    fn default_yield_every() -> usize {
        defaults::YIELD_EVERY
    }

    /// Parses a config from JSON; omitted fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the JSON is malformed or has wrong field types.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Parse` if its contents are not a valid config.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Batch size actually used by `run_with`, never zero.
    pub fn batch_size(&self) -> usize {
        self.yield_every.max(1)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: defaults::MAX_STEPS,
            yield_every: defaults::YIELD_EVERY,
            trace_steps: false,
        }
    }
}
