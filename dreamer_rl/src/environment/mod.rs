//! Environment abstraction for evaluation.
//!
//! Environments expose named observation channels (images, vectors, masks)
//! and a single action space. The evaluation loop only depends on the
//! [`DictEnv`] trait; concrete engines are adapted by explicit wrappers such
//! as [`arena::ArenaWrapper`].

pub mod arena;
pub mod spaces;

use std::collections::BTreeMap;

use thiserror::Error;

pub use spaces::{ElementKind, ObservationSpace, Space};

/// Extra per-step information returned by the environment.
pub type Info = serde_json::Map<String, serde_json::Value>;

/// One observation channel: a dense array in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObsArray {
    /// Array shape (`[]` for scalars).
    pub shape: Vec<usize>,
    /// Row-major values, `shape.iter().product()` entries.
    pub data: Vec<f32>,
}

impl ObsArray {
    /// Create an array, checking that `data` fills `shape`.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, EnvError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(EnvError::ShapeMismatch {
                channel: None,
                expected: shape,
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Scalar observation with shape `[]`.
    pub fn scalar(value: f32) -> Self {
        Self {
            shape: vec![],
            data: vec![value],
        }
    }

    /// 1D observation.
    pub fn vector(data: Vec<f32>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Same data under a new shape with the same element count.
    pub fn reshaped(self, shape: Vec<usize>) -> Result<Self, EnvError> {
        Self::new(shape, self.data)
    }
}

/// Observation dictionary: channel name to array.
pub type Observation = BTreeMap<String, ObsArray>;

/// Action in the encoding the environment expects.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvAction {
    /// Continuous components, row-major over `shape`.
    Continuous { shape: Vec<usize>, values: Vec<f32> },
    /// Discrete indices, row-major over `shape` (`[]` for a single index).
    Discrete { shape: Vec<usize>, indices: Vec<i64> },
}

impl EnvAction {
    /// Declared shape of the action.
    pub fn shape(&self) -> &[usize] {
        match self {
            EnvAction::Continuous { shape, .. } | EnvAction::Discrete { shape, .. } => shape,
        }
    }

    /// Number of scalar elements.
    pub fn len(&self) -> usize {
        match self {
            EnvAction::Continuous { values, .. } => values.len(),
            EnvAction::Discrete { indices, .. } => indices.len(),
        }
    }

    /// True when the action carries no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a single environment step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Observation after the step.
    pub observation: Observation,
    /// Scalar reward.
    pub reward: f32,
    /// Episode ended due to goal/failure.
    pub terminated: bool,
    /// Episode ended due to a time limit.
    pub truncated: bool,
    /// Extra information.
    pub info: Info,
}

impl StepOutcome {
    /// Terminal OR truncated.
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Failure raised by an environment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    /// The environment could not be created.
    #[error("failed to create environment: {0}")]
    Creation(String),

    /// The engine reported an error during reset/step/close.
    #[error("environment engine error: {0}")]
    Engine(String),

    /// Action does not fit the declared action space.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// Array data does not fill the declared shape.
    #[error("channel {channel:?}: {len} values do not fill shape {expected:?}")]
    ShapeMismatch {
        channel: Option<String>,
        expected: Vec<usize>,
        len: usize,
    },

    /// Space kind the adapter cannot express.
    #[error("unsupported space for channel {0}")]
    UnsupportedSpace(String),

    /// Operation after `close`.
    #[error("environment is closed")]
    Closed,
}

/// Single dictionary-observation environment.
///
/// Calls are blocking; the evaluation loop drives one instance at a time.
pub trait DictEnv {
    /// Spaces of the observation channels.
    fn observation_space(&self) -> &ObservationSpace;

    /// Space of the action.
    fn action_space(&self) -> &Space;

    /// Start a new episode.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, Info), EnvError>;

    /// Apply one action.
    fn step(&mut self, action: &EnvAction) -> Result<StepOutcome, EnvError>;

    /// Release the environment.
    fn close(&mut self) -> Result<(), EnvError>;
}

impl<E: DictEnv + ?Sized> DictEnv for Box<E> {
    fn observation_space(&self) -> &ObservationSpace {
        (**self).observation_space()
    }

    fn action_space(&self) -> &Space {
        (**self).action_space()
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, Info), EnvError> {
        (**self).reset(seed)
    }

    fn step(&mut self, action: &EnvAction) -> Result<StepOutcome, EnvError> {
        (**self).step(action)
    }

    fn close(&mut self) -> Result<(), EnvError> {
        (**self).close()
    }
}
