//! Tests for the straight-through stochastic state sampler.
//!
//! # Critical Dangers Tested
//!
//! 1. Every category slice must be exactly one-hot (no relaxation leaking into values)
//! 2. Gradients must reach the logits through the softmax relaxation
//! 3. Samples follow the categorical distribution given by the logits

use burn::backend::{Autodiff, NdArray};
use burn::tensor::{Distribution, Tensor};

use crate::algorithms::stochastic_state::{compute_stochastic_state, DEFAULT_DISCRETE};

type TestBackend = NdArray<f32>;
type TestAutodiffBackend = Autodiff<NdArray<f32>>;

#[test]
fn test_every_category_is_one_hot() {
    let device = Default::default();
    let categories = 8;
    let logits = Tensor::<TestBackend, 2>::random(
        [5, categories * DEFAULT_DISCRETE],
        Distribution::Normal(0.0, 3.0),
        &device,
    );

    let state: Tensor<TestBackend, 3> = compute_stochastic_state(logits, DEFAULT_DISCRETE).unwrap();
    assert_eq!(state.dims(), [5, categories, DEFAULT_DISCRETE]);

    let data = state.into_data().to_vec::<f32>().unwrap();
    for slice in data.chunks(DEFAULT_DISCRETE) {
        let ones = slice.iter().filter(|&&x| x == 1.0).count();
        let zeros = slice.iter().filter(|&&x| x == 0.0).count();
        assert_eq!(ones, 1, "expected exactly one 1 in {:?}", slice);
        assert_eq!(zeros, DEFAULT_DISCRETE - 1, "non-binary entries in {:?}", slice);
    }
}

/// Sequence-major logits `[T, B, S * D]` keep their leading dims.
#[test]
fn test_sequence_logits_rank_three() {
    let device = Default::default();
    let logits = Tensor::<TestBackend, 3>::random([4, 2, 3 * 6], Distribution::Default, &device);

    let state: Tensor<TestBackend, 4> = compute_stochastic_state(logits, 6).unwrap();

    assert_eq!(state.dims(), [4, 2, 3, 6]);
    let sums = state.sum_dim(3).into_data().to_vec::<f32>().unwrap();
    assert!(sums.iter().all(|&s| s == 1.0));
}

/// A dominant logit is selected essentially always.
#[test]
fn test_peaked_logits_select_argmax() {
    let device = Default::default();
    let logits = Tensor::<TestBackend, 1>::from_floats([0.0, 0.0, 50.0, 0.0], &device)
        .reshape([1, 4]);

    for _ in 0..20 {
        let state: Tensor<TestBackend, 3> = compute_stochastic_state(logits.clone(), 4).unwrap();
        let data = state.into_data().to_vec::<f32>().unwrap();
        assert_eq!(data, vec![0.0, 0.0, 1.0, 0.0]);
    }
}

/// Empirical class frequencies follow softmax(logits).
#[test]
fn test_samples_follow_categorical() {
    let device = Default::default();
    let n = 4000;
    // softmax([ln 1, ln 3]) = [0.25, 0.75]
    let row = [0.0f32, 3.0f32.ln()];
    let flat: Vec<f32> = (0..n).flat_map(|_| row).collect();
    let logits = Tensor::<TestBackend, 1>::from_floats(flat.as_slice(), &device).reshape([n, 2]);

    let state: Tensor<TestBackend, 3> = compute_stochastic_state(logits, 2).unwrap();
    let second: f32 = state
        .narrow(2, 1, 1)
        .sum()
        .into_scalar();
    let freq = second / n as f32;

    assert!((freq - 0.75).abs() < 0.05, "expected ~0.75, got {}", freq);
}

/// The straight-through path delivers a nonzero gradient to the logits.
#[test]
fn test_gradient_reaches_logits() {
    let device = Default::default();
    let categories = 2;
    let discrete = 4;
    let logits = Tensor::<TestAutodiffBackend, 2>::random(
        [3, categories * discrete],
        Distribution::Normal(0.0, 1.0),
        &device,
    )
    .require_grad();

    let state: Tensor<TestAutodiffBackend, 3> =
        compute_stochastic_state(logits.clone(), discrete).unwrap();

    // Non-uniform downstream weights: a constant weight would cancel against
    // the softmax constraint and give a zero gradient.
    let weights = Tensor::<TestAutodiffBackend, 1>::from_floats([1.0, -2.0, 3.0, 0.5], &device)
        .reshape([1, 1, discrete]);
    let loss = (state * weights).sum();

    let grads = loss.backward();
    let logits_grad = logits.grad(&grads);
    assert!(logits_grad.is_some(), "logits should have gradients");

    let grad_values = logits_grad.unwrap().into_data().to_vec::<f32>().unwrap();
    assert_eq!(grad_values.len(), 3 * categories * discrete);
    let total: f32 = grad_values.iter().map(|g| g.abs()).sum();
    assert!(total > 1e-6, "straight-through gradient should be nonzero");
}

/// Forward values on the autodiff backend are still exactly one-hot.
#[test]
fn test_autodiff_values_exact() {
    let device = Default::default();
    let logits = Tensor::<TestAutodiffBackend, 2>::random([2, 3 * 5], Distribution::Default, &device)
        .require_grad();

    let state: Tensor<TestAutodiffBackend, 3> = compute_stochastic_state(logits, 5).unwrap();
    let data = state.into_data().to_vec::<f32>().unwrap();

    assert!(data.iter().all(|&x| x == 0.0 || x == 1.0));
    assert_eq!(data.iter().filter(|&&x| x == 1.0).count(), 2 * 3);
}
