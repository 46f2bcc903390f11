//! Algorithm components for the world-model core.
//!
//! - `stochastic_state`: straight-through one-hot sampling of the discrete latent
//! - `lambda_return`: bootstrapped λ-returns for actor/critic targets
//! - `shape_error`: input-contract violations shared by both

pub mod lambda_return;
pub mod shape_error;
pub mod stochastic_state;

#[cfg(test)]
mod tests;

pub use lambda_return::{
    compute_lambda_values, compute_lambda_values_scalar, DEFAULT_HORIZON, DEFAULT_LAMBDA,
};
pub use shape_error::ShapeError;
pub use stochastic_state::{compute_stochastic_state, stochastic_probs, DEFAULT_DISCRETE};
