//! Dreamer evaluation configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::algorithms::{DEFAULT_DISCRETE, DEFAULT_HORIZON, DEFAULT_LAMBDA};
use crate::runners::{EvalConfig, EvalError, PreprocessingRules};

/// Settings for evaluating a trained Dreamer agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DreamerEvalConfig {
    /// Environment identifier passed to the factory.
    pub env_id: String,
    /// Seed for environment construction and reset.
    pub seed: u64,
    /// Stop after the first step.
    pub dry_run: bool,
    /// Imagination horizon for lambda returns.
    pub horizon: usize,
    /// Lambda of the lambda returns.
    pub lmbda: f32,
    /// Number of categorical variables in the stochastic state.
    pub stochastic_size: usize,
    /// Classes per categorical variable.
    pub discrete_size: usize,
    /// Image observation channels.
    pub cnn_keys: Vec<String>,
    /// Vector observation channels.
    pub mlp_keys: Vec<String>,
    /// Run name suffix (`test_<test_name>`).
    pub test_name: String,
    /// Optional hard limit on episode length.
    pub max_steps: Option<usize>,
}

impl Default for DreamerEvalConfig {
    fn default() -> Self {
        Self {
            env_id: String::new(),
            seed: 42,
            dry_run: false,
            horizon: DEFAULT_HORIZON,
            lmbda: DEFAULT_LAMBDA,
            stochastic_size: 32,
            discrete_size: DEFAULT_DISCRETE,
            cnn_keys: Vec::new(),
            mlp_keys: Vec::new(),
            test_name: String::new(),
            max_steps: None,
        }
    }
}

impl DreamerEvalConfig {
    /// Create a config for the given environment.
    pub fn new(env_id: impl Into<String>) -> Self {
        Self {
            env_id: env_id.into(),
            ..Default::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration.
    ///
    /// # Validation Rules
    /// - `env_id` must be set
    /// - `horizon`, `stochastic_size`, `discrete_size` must be > 0
    /// - `lmbda` must be in [0, 1]
    /// - `cnn_keys` and `mlp_keys` are disjoint and not both empty
    /// - `max_steps`, when set, must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.env_id.is_empty() {
            return Err(ConfigError::Missing("env_id"));
        }
        for (field, value) in [
            ("horizon", self.horizon),
            ("stochastic_size", self.stochastic_size),
            ("discrete_size", self.discrete_size),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidCount { field, value });
            }
        }
        if let Some(0) = self.max_steps {
            return Err(ConfigError::InvalidCount {
                field: "max_steps",
                value: 0,
            });
        }
        if !(0.0..=1.0).contains(&self.lmbda) {
            return Err(ConfigError::OutOfRange {
                field: "lmbda",
                value: f64::from(self.lmbda),
                range: "[0, 1]",
            });
        }
        if self.cnn_keys.is_empty() && self.mlp_keys.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        if let Some(key) = self.cnn_keys.iter().find(|k| self.mlp_keys.contains(k)) {
            return Err(ConfigError::OverlappingKeys(key.clone()));
        }
        Ok(())
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable dry run.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the imagination horizon.
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set lambda.
    pub fn with_lmbda(mut self, lmbda: f32) -> Self {
        self.lmbda = lmbda;
        self
    }

    /// Set the stochastic state layout.
    pub fn with_stochastic(mut self, stochastic_size: usize, discrete_size: usize) -> Self {
        self.stochastic_size = stochastic_size;
        self.discrete_size = discrete_size;
        self
    }

    /// Set the image channels.
    pub fn with_cnn_keys<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.cnn_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the vector channels.
    pub fn with_mlp_keys<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.mlp_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the run name suffix.
    pub fn with_test_name(mut self, test_name: impl Into<String>) -> Self {
        self.test_name = test_name.into();
        self
    }

    /// Limit episode length.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Flattened stochastic state size.
    pub fn stochastic_dim(&self) -> usize {
        self.stochastic_size * self.discrete_size
    }

    /// Channel partition for the evaluation loop.
    pub fn preprocessing_rules(&self) -> Result<PreprocessingRules, ConfigError> {
        PreprocessingRules::new(self.cnn_keys.iter().cloned(), self.mlp_keys.iter().cloned())
            .map_err(|e| match e {
                EvalError::OverlappingKeys(key) => ConfigError::OverlappingKeys(key),
                other => ConfigError::Invalid(other.to_string()),
            })
    }

    /// Episode settings for the evaluation loop.
    pub fn eval_config(&self) -> EvalConfig {
        EvalConfig {
            seed: self.seed,
            dry_run: self.dry_run,
            test_name: self.test_name.clone(),
            max_steps: self.max_steps,
        }
    }
}
