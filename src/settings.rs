//! Optimizer knobs and the JSON settings-file contract.
//!
//! [`OptimizerConfig`] is the in-process configuration; [`Settings`] (feature
//! `serde`) is the file shape, which also carries the initial population.

use crate::parameter::DEFAULT_LEARNING_RATE;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use crate::AlgorithmDeclaration;

/// How the slot to overwrite is chosen when a candidate replaces a member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum EvictionPolicy {
    /// Roulette wheel over member scores, the same draw as parent selection.
    /// Better members are *more* likely to be overwritten.
    #[default]
    ScoreProportional,
    /// Overwrite the lowest-scoring member (lowest slot on ties).
    WorstMember,
}

/// Optimizer configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizerConfig {
    /// Points per evaluation cycle.
    pub window_size: usize,
    /// Maximum number of live configurations.
    pub ensemble_size: usize,
    /// Candidates proposed per cycle. Also sets the spread contraction,
    /// `1 / new_configurations_per_cycle`.
    pub new_configurations_per_cycle: usize,
    /// Try in-place option updates on duplicated candidates before rebuilding.
    pub keep_current_model: bool,
    /// Reinforcement rate for categorical / boolean parameters, in `(0, 1]`.
    pub categorical_learning_rate: f64,
    pub eviction: EvictionPolicy,
    /// Seed for the optimizer's generator.
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            window_size: 1000,
            ensemble_size: 10,
            new_configurations_per_cycle: 10,
            keep_current_model: true,
            categorical_learning_rate: DEFAULT_LEARNING_RATE,
            eviction: EvictionPolicy::ScoreProportional,
            seed: 0,
        }
    }
}

impl OptimizerConfig {
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_ensemble_size(mut self, ensemble_size: usize) -> Self {
        self.ensemble_size = ensemble_size;
        self
    }

    pub fn with_new_configurations(mut self, per_cycle: usize) -> Self {
        self.new_configurations_per_cycle = per_cycle;
        self
    }

    pub fn with_keep_current_model(mut self, keep: bool) -> Self {
        self.keep_current_model = keep;
        self
    }

    pub fn with_learning_rate(mut self, rate: f64) -> Self {
        self.categorical_learning_rate = rate;
        self
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// `1 / new_configurations_per_cycle`.
    pub fn shrink_factor(&self) -> f64 {
        1.0 / self.new_configurations_per_cycle.max(1) as f64
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::InvalidSettings("windowSize must be at least 1".to_string()));
        }
        if self.ensemble_size == 0 {
            return Err(Error::InvalidSettings("ensembleSize must be at least 1".to_string()));
        }
        if self.new_configurations_per_cycle == 0 {
            return Err(Error::InvalidSettings(
                "newConfigurationsPerCycle must be at least 1".to_string(),
            ));
        }
        let rate = self.categorical_learning_rate;
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(Error::InvalidSettings(format!(
                "categoricalLearningRate must be in (0, 1], got {rate}"
            )));
        }
        Ok(())
    }
}

/// The settings file: optimizer knobs plus the initial population.
///
/// ```json
/// {
///   "windowSize": 1000,
///   "ensembleSize": 10,
///   "newConfigurations": 10,
///   "algorithms": [
///     { "algorithm": "kmeans",
///       "parameters": [ { "parameter": "k", "type": "integer", "value": 3, "range": [2, 12] } ] }
///   ]
/// }
/// ```
#[cfg(feature = "serde")]
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub window_size: usize,
    pub ensemble_size: usize,
    #[serde(alias = "newConfigurations")]
    pub new_configurations_per_cycle: usize,
    #[serde(default = "default_keep_current_model")]
    pub keep_current_model: bool,
    #[serde(default = "default_learning_rate")]
    pub categorical_learning_rate: f64,
    #[serde(default)]
    pub eviction: EvictionPolicy,
    #[serde(default)]
    pub seed: Option<u64>,
    pub algorithms: Vec<AlgorithmDeclaration>,
}

#[cfg(feature = "serde")]
fn default_keep_current_model() -> bool {
    true
}

#[cfg(feature = "serde")]
fn default_learning_rate() -> f64 {
    DEFAULT_LEARNING_RATE
}

#[cfg(feature = "serde")]
impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.config().validate()?;
        if settings.algorithms.is_empty() {
            return Err(Error::InvalidSettings(
                "algorithms must declare at least one configuration".to_string(),
            ));
        }
        Ok(settings)
    }

    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Optimizer knobs; the seed defaults to `0` when absent.
    pub fn config(&self) -> OptimizerConfig {
        OptimizerConfig {
            window_size: self.window_size,
            ensemble_size: self.ensemble_size,
            new_configurations_per_cycle: self.new_configurations_per_cycle,
            keep_current_model: self.keep_current_model,
            categorical_learning_rate: self.categorical_learning_rate,
            eviction: self.eviction,
            seed: self.seed.unwrap_or_default(),
        }
    }

    /// Split into optimizer knobs and the initial population.
    pub fn into_parts(self) -> (OptimizerConfig, Vec<AlgorithmDeclaration>) {
        let config = self.config();
        (config, self.algorithms)
    }
}
