//! Neural network utilities for the world model and actor/critic.
//!
//! # Modules
//!
//! - [`xavier`]: Xavier/Glorot normal initialization policy for burn layers

pub mod xavier;

pub use xavier::{InitWeights, XavierNormal};
