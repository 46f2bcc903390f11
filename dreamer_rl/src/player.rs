//! Player contract for greedy evaluation.
//!
//! A player owns the trained world model and actor together with the
//! recurrent latent state it carries between environment steps. The
//! evaluation loop drives it through [`Player`] only.

use std::collections::BTreeMap;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::algorithms::{compute_stochastic_state, ShapeError};

/// Observation after preprocessing, on the player's device.
#[derive(Debug, Clone)]
pub struct PreprocessedObs<B: Backend> {
    /// Image channels `[1, 1, C, H, W]`, scaled to `[-0.5, 0.5]`.
    pub images: BTreeMap<String, Tensor<B, 5>>,
    /// Vector channels `[1, 1, N]`, values unchanged.
    pub vectors: BTreeMap<String, Tensor<B, 3>>,
}

impl<B: Backend> Default for PreprocessedObs<B> {
    fn default() -> Self {
        Self {
            images: BTreeMap::new(),
            vectors: BTreeMap::new(),
        }
    }
}

impl<B: Backend> PreprocessedObs<B> {
    /// Number of channels kept.
    pub fn len(&self) -> usize {
        self.images.len() + self.vectors.len()
    }

    /// True when every channel was dropped.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Action-mask channels (`mask*`) keyed by name.
pub type ActionMask<B> = BTreeMap<String, Tensor<B, 3>>;

/// Output of greedy action selection for a single environment.
#[derive(Debug, Clone)]
pub struct GreedyActions<B: Backend> {
    /// One tensor per action component, `[1, 1, component_dim]`.
    ///
    /// Continuous components hold the action values, discrete components
    /// hold a distribution (or one-hot) over the component's choices.
    pub components: Vec<Tensor<B, 3>>,
    /// True for continuous action spaces.
    pub continuous: bool,
}

impl<B: Backend> GreedyActions<B> {
    /// Continuous action components.
    pub fn continuous(components: Vec<Tensor<B, 3>>) -> Self {
        Self {
            components,
            continuous: true,
        }
    }

    /// Discrete action components.
    pub fn discrete(components: Vec<Tensor<B, 3>>) -> Self {
        Self {
            components,
            continuous: false,
        }
    }
}

/// Recurrent agent driven by the evaluation loop.
pub trait Player<B: Backend> {
    /// Device the player's tensors live on.
    fn device(&self) -> B::Device;

    /// Number of parallel environments the player expects.
    fn num_envs(&self) -> usize;

    /// Change the number of parallel environments.
    fn set_num_envs(&mut self, n: usize);

    /// Reset the recurrent latent state for a new episode.
    fn init_states(&mut self);

    /// Select the greedy action and advance the latent state by one step.
    ///
    /// A [`ShapeError`] aborts the episode.
    fn greedy_action(
        &mut self,
        obs: &PreprocessedObs<B>,
        mask: &ActionMask<B>,
    ) -> Result<GreedyActions<B>, ShapeError>;
}

impl<B: Backend, P: Player<B> + ?Sized> Player<B> for &mut P {
    fn device(&self) -> B::Device {
        (**self).device()
    }

    fn num_envs(&self) -> usize {
        (**self).num_envs()
    }

    fn set_num_envs(&mut self, n: usize) {
        (**self).set_num_envs(n)
    }

    fn init_states(&mut self) {
        (**self).init_states()
    }

    fn greedy_action(
        &mut self,
        obs: &PreprocessedObs<B>,
        mask: &ActionMask<B>,
    ) -> Result<GreedyActions<B>, ShapeError> {
        (**self).greedy_action(obs, mask)
    }
}

/// Latent state carried by a recurrent player between steps.
///
/// Replaced by a fresh value each step; tensors are never updated in place.
#[derive(Debug, Clone)]
pub struct RecurrentState<B: Backend> {
    /// Deterministic recurrent state `[1, n_envs, recurrent_size]`.
    pub recurrent: Tensor<B, 3>,
    /// Flattened stochastic state `[1, n_envs, stochastic_size * discrete]`.
    pub stochastic: Tensor<B, 3>,
}

impl<B: Backend> RecurrentState<B> {
    /// All-zero state for the start of an episode.
    pub fn zeros(
        n_envs: usize,
        recurrent_size: usize,
        stochastic_size: usize,
        discrete: usize,
        device: &B::Device,
    ) -> Self {
        Self {
            recurrent: Tensor::zeros([1, n_envs, recurrent_size], device),
            stochastic: Tensor::zeros([1, n_envs, stochastic_size * discrete], device),
        }
    }

    /// Build the next state from a recurrent output and representation logits.
    ///
    /// # Arguments
    ///
    /// * `recurrent` - `[1, n_envs, recurrent_size]`
    /// * `logits` - `[1, n_envs, stochastic_size * discrete]`
    /// * `discrete` - classes per categorical variable
    pub fn from_logits(
        recurrent: Tensor<B, 3>,
        logits: Tensor<B, 3>,
        discrete: usize,
    ) -> Result<Self, ShapeError> {
        let dims = logits.dims();
        let sample: Tensor<B, 4> = compute_stochastic_state(logits, discrete)?;

        Ok(Self {
            recurrent,
            stochastic: sample.reshape(dims),
        })
    }

    /// Latent features `[1, n_envs, recurrent_size + stochastic_size * discrete]`.
    pub fn latent(&self) -> Tensor<B, 3> {
        Tensor::cat(vec![self.stochastic.clone(), self.recurrent.clone()], 2)
    }

    /// Number of environments the state covers.
    pub fn num_envs(&self) -> usize {
        self.recurrent.dims()[1]
    }
}
