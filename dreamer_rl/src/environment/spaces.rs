//! Observation and action spaces for dictionary environments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Element type declared by a `Box` space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    #[default]
    Float,
    Int,
    Byte,
}

/// A single observation or action space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Space {
    /// Bounded n-dimensional array; `low`/`high` are flattened to `shape`.
    Box {
        low: Vec<f32>,
        high: Vec<f32>,
        shape: Vec<usize>,
        dtype: ElementKind,
    },
    /// Single index in `0..n`.
    Discrete { n: usize },
    /// One index per component, component `i` in `0..nvec[i]`.
    MultiDiscrete { nvec: Vec<usize> },
}

impl Space {
    /// Box space with scalar bounds broadcast over `shape`.
    pub fn uniform_box(low: f32, high: f32, shape: Vec<usize>, dtype: ElementKind) -> Self {
        let n = shape.iter().product();
        Space::Box {
            low: vec![low; n],
            high: vec![high; n],
            shape,
            dtype,
        }
    }

    /// Declared shape. Discrete spaces are scalars (`[]`).
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Space::Box { shape, .. } => shape.clone(),
            Space::Discrete { .. } => vec![],
            Space::MultiDiscrete { nvec } => vec![nvec.len()],
        }
    }

    /// Number of scalar elements a value of this space holds.
    pub fn element_count(&self) -> usize {
        self.shape().iter().product()
    }

    /// True for spaces whose values are indices.
    pub fn is_discrete(&self) -> bool {
        matches!(self, Space::Discrete { .. } | Space::MultiDiscrete { .. })
    }
}

/// Named observation channels and their spaces.
pub type ObservationSpace = BTreeMap<String, Space>;
