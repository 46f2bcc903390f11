//! Greedy evaluation of a trained recurrent player.
//!
//! One episode is played with exploration disabled:
//!
//! 1. build the environment from `(seed, run_name)` and reset it with the seed
//! 2. fix the player to one environment and reset its latent state
//! 3. preprocess the observation, pick the greedy action, step the environment
//! 4. stop on `terminated`, `truncated`, dry run, or the step limit
//! 5. close the environment and report the cumulative reward
//!
//! Environment and player failures abort the episode and propagate; the
//! environment is closed on every path.

use std::collections::BTreeSet;

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithms::ShapeError;
use crate::environment::{DictEnv, EnvAction, EnvError, Observation, Space};
use crate::metrics::{single_metric, MetricsSink};
use crate::player::{ActionMask, GreedyActions, Player, PreprocessedObs};

/// Metric written once per evaluated episode.
pub const CUMULATIVE_REWARD_METRIC: &str = "Test/cumulative_reward";

/// Prefix of vector channels forwarded as action masks.
pub const MASK_PREFIX: &str = "mask";

/// Failure of an evaluation episode.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Environment creation, reset, step or close failed.
    #[error(transparent)]
    Env(#[from] EnvError),

    /// A channel is listed as both image and vector.
    #[error("channel {0} is listed in both cnn_keys and mlp_keys")]
    OverlappingKeys(String),

    /// Image channels are `[C, H, W]`.
    #[error("image channel {channel} must have rank 3, got shape {shape:?}")]
    ImageRank { channel: String, shape: Vec<usize> },

    /// Image data does not fill its declared shape.
    #[error("image channel {channel} has shape {shape:?} but {len} values")]
    ImageSize {
        channel: String,
        shape: Vec<usize>,
        len: usize,
    },

    /// The player could not advance its latent state.
    #[error("player failed: {0}")]
    Player(#[from] ShapeError),

    /// The player returned no action component.
    #[error("player returned no action components")]
    EmptyAction,

    /// Converted action does not fit the action space.
    #[error("action has {actual} elements, action space {shape:?} expects {expected}")]
    ActionShape {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// Reading tensor data back to the host failed.
    #[error("tensor data error: {0}")]
    TensorData(String),
}

/// Partition of observation channels into image and vector groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreprocessingRules {
    cnn_keys: BTreeSet<String>,
    mlp_keys: BTreeSet<String>,
}

impl PreprocessingRules {
    /// Create rules from two disjoint key sets.
    pub fn new<I, J, S, T>(cnn_keys: I, mlp_keys: J) -> Result<Self, EvalError>
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let cnn_keys: BTreeSet<String> = cnn_keys.into_iter().map(Into::into).collect();
        let mlp_keys: BTreeSet<String> = mlp_keys.into_iter().map(Into::into).collect();

        if let Some(key) = cnn_keys.intersection(&mlp_keys).next() {
            return Err(EvalError::OverlappingKeys(key.clone()));
        }

        Ok(Self { cnn_keys, mlp_keys })
    }

    /// Image channel names.
    pub fn cnn_keys(&self) -> &BTreeSet<String> {
        &self.cnn_keys
    }

    /// Vector channel names.
    pub fn mlp_keys(&self) -> &BTreeSet<String> {
        &self.mlp_keys
    }
}

/// Episode-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Seed for environment construction and reset.
    pub seed: u64,
    /// Stop after the first step.
    pub dry_run: bool,
    /// Suffix of the run name (`test_<name>`); empty for `test`.
    pub test_name: String,
    /// Optional hard limit on the number of steps.
    pub max_steps: Option<usize>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            dry_run: false,
            test_name: String::new(),
            max_steps: None,
        }
    }
}

impl EvalConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
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

    /// Set the test name.
    pub fn with_test_name(mut self, test_name: impl Into<String>) -> Self {
        self.test_name = test_name.into();
        self
    }

    /// Limit the episode length.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Name handed to the environment factory.
    pub fn run_name(&self) -> String {
        if self.test_name.is_empty() {
            "test".to_string()
        } else {
            format!("test_{}", self.test_name)
        }
    }
}

/// Play one greedy episode and return its cumulative reward.
///
/// # Arguments
///
/// * `player` - trained player, exclusively borrowed for the episode
/// * `env_factory` - builds the environment from `(seed, run_name)`
/// * `rules` - image/vector channel partition
/// * `config` - seed, dry run and step limit
/// * `sink` - receives the reward line and the cumulative reward metric
///
/// # Returns
///
/// The sum of rewards over the episode. On error nothing is written to
/// `sink`.
pub fn run_episode<B, P, E, F, S>(
    player: &mut P,
    env_factory: F,
    rules: &PreprocessingRules,
    config: &EvalConfig,
    sink: &mut S,
) -> Result<f32, EvalError>
where
    B: Backend,
    P: Player<B> + ?Sized,
    E: DictEnv,
    F: FnOnce(u64, &str) -> Result<E, EnvError>,
    S: MetricsSink + ?Sized,
{
    let run_name = config.run_name();
    let mut env = env_factory(config.seed, &run_name)?;

    let played = play(player, &mut env, rules, config);
    let closed = env.close();

    let total = match (played, closed) {
        (Ok(total), Ok(())) => total,
        (Ok(_), Err(e)) => return Err(e.into()),
        (Err(e), Ok(())) => return Err(e),
        (Err(e), Err(close_err)) => {
            log::warn!("failed to close {} after aborted episode: {}", run_name, close_err);
            return Err(e);
        }
    };

    sink.print(&format!("Test - Reward: {}", total));
    sink.log_metrics(&single_metric(CUMULATIVE_REWARD_METRIC, f64::from(total)), 0);
    log::info!("{}: cumulative reward {}", run_name, total);

    Ok(total)
}

fn play<B, P, E>(
    player: &mut P,
    env: &mut E,
    rules: &PreprocessingRules,
    config: &EvalConfig,
) -> Result<f32, EvalError>
where
    B: Backend,
    P: Player<B> + ?Sized,
    E: DictEnv,
{
    let (mut obs, _info) = env.reset(Some(config.seed))?;
    player.set_num_envs(1);
    player.init_states();
    let device = player.device();

    let mut total = 0.0f32;
    let mut steps = 0usize;
    loop {
        let preprocessed = preprocess_observation::<B>(&obs, rules, &device)?;
        let mask = action_masks(&preprocessed);
        let actions = player.greedy_action(&preprocessed, &mask)?;
        let action = actions_to_env(actions, env.action_space())?;

        let outcome = env.step(&action)?;
        total += outcome.reward;
        steps += 1;
        log::debug!("step {}: reward {} (total {})", steps, outcome.reward, total);

        let limit_reached = config.max_steps.is_some_and(|max| steps >= max);
        if outcome.done() || config.dry_run || limit_reached {
            break;
        }
        obs = outcome.observation;
    }

    Ok(total)
}

/// Convert an observation into the player's tensor layout.
///
/// Image channels become `[1, 1, C, H, W]` scaled by `1/255` and shifted by
/// `-0.5`; vector channels become `[1, 1, N]` untouched. Channels outside
/// both key sets are dropped. Image data must hold exactly `C * H * W`
/// values.
pub fn preprocess_observation<B: Backend>(
    obs: &Observation,
    rules: &PreprocessingRules,
    device: &B::Device,
) -> Result<PreprocessedObs<B>, EvalError> {
    let mut out = PreprocessedObs::default();

    for (name, array) in obs {
        if rules.cnn_keys.contains(name) {
            let [c, h, w] = <[usize; 3]>::try_from(array.shape.as_slice()).map_err(|_| {
                EvalError::ImageRank {
                    channel: name.clone(),
                    shape: array.shape.clone(),
                }
            })?;
            if c * h * w != array.len() {
                return Err(EvalError::ImageSize {
                    channel: name.clone(),
                    shape: array.shape.clone(),
                    len: array.len(),
                });
            }
            let image = Tensor::<B, 5>::from_data(TensorData::new(array.data.clone(), [1, 1, c, h, w]), device)
                .div_scalar(255.0)
                .sub_scalar(0.5);
            out.images.insert(name.clone(), image);
        } else if rules.mlp_keys.contains(name) {
            let vector =
                Tensor::<B, 3>::from_data(TensorData::new(array.data.clone(), [1, 1, array.len()]), device);
            out.vectors.insert(name.clone(), vector);
        }
    }

    Ok(out)
}

/// Vector channels whose name marks them as action masks.
pub fn action_masks<B: Backend>(obs: &PreprocessedObs<B>) -> ActionMask<B> {
    obs.vectors
        .iter()
        .filter(|(name, _)| name.starts_with(MASK_PREFIX))
        .map(|(name, tensor)| (name.clone(), tensor.clone()))
        .collect()
}

/// Convert the player's output into the environment's action encoding.
///
/// Continuous components are concatenated on the last dimension. Discrete
/// components are reduced to the arg-max index of each component. The
/// result takes the shape of `action_space` and must fill it exactly.
pub fn actions_to_env<B: Backend>(
    actions: GreedyActions<B>,
    action_space: &Space,
) -> Result<EnvAction, EvalError> {
    if actions.components.is_empty() {
        return Err(EvalError::EmptyAction);
    }

    let shape = action_space.shape();
    let expected = action_space.element_count();

    let action = if actions.continuous {
        let values = Tensor::cat(actions.components, 2)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| EvalError::TensorData(format!("{:?}", e)))?;
        EnvAction::Continuous {
            shape: shape.clone(),
            values,
        }
    } else {
        let indices: Vec<Tensor<B, 3, Int>> = actions
            .components
            .into_iter()
            .map(|component| component.argmax(2))
            .collect();
        let indices = Tensor::cat(indices, 2)
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .map_err(|e| EvalError::TensorData(format!("{:?}", e)))?;
        EnvAction::Discrete {
            shape: shape.clone(),
            indices,
        }
    };

    if action.len() != expected {
        return Err(EvalError::ActionShape {
            shape,
            expected,
            actual: action.len(),
        });
    }

    Ok(action)
}
