//! Engine configuration.
//!
//! Search budgets and soft-constraint weights can be set in code or loaded
//! from TOML. Every field has a default, so a partial file is enough.
//!
//! # Example
//!
//! ```
//! use u_timetable::config::TimetableConfig;
//!
//! let config = TimetableConfig::from_toml_str(r#"
//!     pool_size = 2
//!
//!     [search]
//!     max_iterations = 20000
//!     tie_break_seed = 7
//!
//!     [search.weights]
//!     compactness = 5.0
//! "#).unwrap();
//!
//! assert_eq!(config.pool_size, 2);
//! assert_eq!(config.search.max_iterations, 20_000);
//! assert_eq!(config.search.max_backtracks, 500);
//! assert_eq!(config.search.tie_break_seed, Some(7));
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Weights of the built-in soft rules. A zero weight disables the rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftWeights {
    pub compactness: f64,
    pub load_balance: f64,
    pub capacity_fit: f64,
}

impl Default for SoftWeights {
    fn default() -> Self {
        Self {
            compactness: 3.0,
            load_balance: 1.0,
            capacity_fit: 1.0,
        }
    }
}

/// Budgets and tuning of a single scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Backtracks allowed per episode before the stuck section is dropped.
    pub max_backtracks: u32,
    /// Placement attempts allowed per run.
    pub max_iterations: u64,
    /// Wall-clock limit per run, in milliseconds.
    pub max_duration_millis: u64,
    /// Seed for randomized tie-breaking. `None` = catalog order.
    pub tie_break_seed: Option<u64>,
    /// Soft-constraint weights.
    pub weights: SoftWeights,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_backtracks: 500,
            max_iterations: 50_000,
            max_duration_millis: 10_000,
            tie_break_seed: None,
            weights: SoftWeights::default(),
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_backtracks(mut self, n: u32) -> Self {
        self.max_backtracks = n;
        self
    }

    pub fn with_max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.max_duration_millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.tie_break_seed = Some(seed);
        self
    }

    pub fn with_weights(mut self, weights: SoftWeights) -> Self {
        self.weights = weights;
        self
    }

    /// The wall-clock limit as a `Duration`.
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_millis)
    }

    /// Checks that the weights are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        for (name, value) in [
            ("compactness", w.compactness),
            ("load_balance", w.load_balance),
            ("capacity_fit", w.capacity_fit),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "weight '{name}' must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableConfig {
    /// Worker threads shared by all semesters' runs.
    pub pool_size: usize,
    /// Per-run search options.
    pub search: SearchOptions,
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            pool_size: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            search: SearchOptions::default(),
        }
    }
}

impl TimetableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads and validates configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_search(mut self, search: SearchOptions) -> Self {
        self.search = search;
        self
    }

    /// Rejects a zero-sized pool and negative weights.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid("pool_size must be at least 1".into()));
        }
        self.search.validate()
    }
}
