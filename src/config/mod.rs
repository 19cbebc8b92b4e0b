//! Training hyperparameter configuration.
//!
//! Provides the optimizer and regularization hyperparameters in one place,
//! loadable from a TOML file so a training run is reproducible without
//! rebuilding.
//!
//! ## Loading Order
//!
//! 1. `--config` CLI flag (path to TOML file), if given.
//! 2. Built-in defaults (see [`defaults`]).
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! config::init(TrainingConfig::load(cli.config.as_deref())?);
//! let rp = config::get().l2_coefficient;
//! ```

pub mod defaults;

use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Hyperparameters governing one training run (§4.5, §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub optimizer: String,
    pub e0: f64,
    pub re: f64,
    pub ae: f64,
    pub max_iteration: usize,
    pub l2_coefficient: f64,
    pub max_length: usize,
    pub disable_wg_cache: bool,
    pub disable_regularization: bool,
    pub disable_adagrad: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            optimizer: defaults::OPTIMIZER.to_string(),
            e0: defaults::E0,
            re: defaults::RE,
            ae: defaults::AE,
            max_iteration: defaults::MAX_ITERATION,
            l2_coefficient: defaults::L2_COEFFICIENT,
            max_length: defaults::MAX_LENGTH,
            disable_wg_cache: false,
            disable_regularization: false,
            disable_adagrad: false,
        }
    }
}

impl TrainingConfig {
    /// Loads from `path` if given, overlaying built-in defaults; falls back
    /// to pure defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)?;
                let config: TrainingConfig = toml::from_str(&text)
                    .map_err(|e| crate::error::CrfError::Input(format!("invalid config: {e}")))?;
                Ok(config)
            }
            None => Ok(TrainingConfig::default()),
        }
    }
}

static TRAINING_CONFIG: OnceLock<TrainingConfig> = OnceLock::new();

/// Initialize the global training configuration. Must be called exactly
/// once before any call to `get()`.
pub fn init(config: TrainingConfig) {
    if TRAINING_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once — ignoring");
    }
}

/// Get a reference to the global training configuration.
///
/// Panics if `init()` has not been called — a missing config is a startup
/// bug, not a recoverable condition.
pub fn get() -> &'static TrainingConfig {
    TRAINING_CONFIG
        .get()
        .expect("config::get() called before config::init() — this is a startup bug")
}

pub fn is_initialized() -> bool {
    TRAINING_CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = TrainingConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: TrainingConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.optimizer, config.optimizer);
        assert_eq!(parsed.max_iteration, config.max_iteration);
    }
}
