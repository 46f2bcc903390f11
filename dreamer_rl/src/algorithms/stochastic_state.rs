//! Discrete stochastic latent state for the world model.
//!
//! The representation and transition models emit logits for a factored
//! categorical distribution: `num_categories` independent categoricals with
//! `discrete` classes each. The sampled state is a stack of one-hot vectors.
//!
//! # Straight-through gradient
//!
//! Sampling is not differentiable, so the returned tensor is built as
//!
//! ```text
//! sample = one_hot + (probs - probs.detach())
//! ```
//!
//! The bracketed term is exactly zero in the forward pass, so the value is the
//! discrete one-hot sample, while the backward pass sees the gradient of
//! `softmax(logits)`.

use burn::tensor::activation::softmax;
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Int, Tensor};

use super::shape_error::ShapeError;

/// Default number of classes per categorical variable.
pub const DEFAULT_DISCRETE: usize = 32;

/// Smallest uniform draw; Gumbel noise is bounded below by about -4.5.
const UNIFORM_LOW: f32 = f32::MIN_POSITIVE;

/// Largest `f32` below 1; Gumbel noise is bounded above by about 16.6.
const UNIFORM_HIGH: f32 = 1.0 - f32::EPSILON / 2.0;

/// Sample the stochastic state from transition/representation logits.
///
/// # Arguments
///
/// * `logits` - `[..., num_categories * discrete]`
/// * `discrete` - number of classes per category
///
/// # Returns
///
/// `[..., num_categories, discrete]` where every `[..., c, :]` slice is
/// exactly one-hot. `D2` must equal `D + 1`.
///
/// # Errors
///
/// [`ShapeError`] when `D2 != D + 1`, `discrete == 0`, or the trailing
/// dimension is not a multiple of `discrete`.
pub fn compute_stochastic_state<B: Backend, const D: usize, const D2: usize>(
    logits: Tensor<B, D>,
    discrete: usize,
) -> Result<Tensor<B, D2>, ShapeError> {
    let logits: Tensor<B, D2> = split_categories(logits, discrete)?;
    let device = logits.device();
    let dims = logits.dims();
    let class_dim = D2 - 1;

    let probs = softmax(logits.clone(), class_dim);

    // Gumbel-max: argmax(logits + g) is a draw from Categorical(softmax(logits))
    let uniform = Tensor::<B, D2>::random(dims, Distribution::Uniform(0.0, 1.0), &device);
    let gumbel = gumbel_noise(uniform);
    let index: Tensor<B, D2, Int> = (logits.detach() + gumbel).argmax(class_dim);

    let mut class_shape = [1usize; D2];
    class_shape[class_dim] = discrete;
    let classes: Tensor<B, D2, Int> =
        Tensor::<B, 1, Int>::arange(0..discrete as i64, &device).reshape(class_shape);

    let one_hot = index.expand(dims).equal(classes.expand(dims)).float();

    Ok(one_hot + (probs.clone() - probs.detach()))
}

/// `-ln(-ln(u))` with `u` clamped so the result stays finite.
///
/// Logit gaps wider than the noise range (about 21) make the lower class
/// unreachable; its true probability there is below `e^-21`.
fn gumbel_noise<B: Backend, const D: usize>(uniform: Tensor<B, D>) -> Tensor<B, D> {
    uniform
        .clamp(UNIFORM_LOW, UNIFORM_HIGH)
        .log()
        .neg()
        .log()
        .neg()
}

/// Softmax relaxation of the factored categorical, `[..., num_categories, discrete]`.
pub fn stochastic_probs<B: Backend, const D: usize, const D2: usize>(
    logits: Tensor<B, D>,
    discrete: usize,
) -> Result<Tensor<B, D2>, ShapeError> {
    let logits: Tensor<B, D2> = split_categories(logits, discrete)?;
    Ok(softmax(logits, D2 - 1))
}

/// Reshape the trailing dimension into `(num_categories, discrete)`.
fn split_categories<B: Backend, const D: usize, const D2: usize>(
    logits: Tensor<B, D>,
    discrete: usize,
) -> Result<Tensor<B, D2>, ShapeError> {
    if D2 != D + 1 {
        return Err(ShapeError::RankMismatch { input: D, output: D2 });
    }
    if discrete == 0 {
        return Err(ShapeError::InvalidArgument {
            name: "discrete",
            reason: "must be at least 1".to_string(),
        });
    }

    let dims = logits.dims();
    let trailing = dims[D - 1];
    if trailing % discrete != 0 {
        return Err(ShapeError::NotDivisible { trailing, discrete });
    }

    let mut split = [0usize; D2];
    split[..D - 1].copy_from_slice(&dims[..D - 1]);
    split[D2 - 2] = trailing / discrete;
    split[D2 - 1] = discrete;

    Ok(logits.reshape(split))
}
