//! Xavier (Glorot) normal initialization.
//!
//! Every dense and 2D convolutional layer of the world model and of the
//! actor/critic starts from
//!
//! - weight ~ N(0, gain² · 2 / (fan_in + fan_out))
//! - bias = 0
//!
//! Other layer kinds keep whatever their own config produced.
//!
//! # Fans
//!
//! - Linear (burn layout `[d_input, d_output]`): fan_in = d_input, fan_out = d_output
//! - Conv2d (`[out, in / groups, k_h, k_w]`) and ConvTranspose2d
//!   (`[in, out / groups, k_h, k_w]`): fan_in = dim1 · k_h · k_w,
//!   fan_out = dim0 · k_h · k_w
//!
//! # Usage
//!
//! ```ignore
//! use dreamer_rl::nn::InitWeights;
//!
//! let mut encoder = LinearConfig::new(64, 512).init(&device);
//! encoder.init_weights();
//! // ...then build the optimizer
//! ```
//!
//! Initialization must run once per layer before any optimizer state exists.
//! Walking the submodules of a composite model is up to its owner.

use burn::module::Param;
use burn::nn::conv::{Conv2d, ConvTranspose2d};
use burn::nn::{Embedding, LayerNorm, Linear};
use burn::prelude::*;
use burn::tensor::Distribution;

/// Variance-scaling normal distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XavierNormal {
    /// Multiplier on the standard deviation.
    pub gain: f64,
}

impl Default for XavierNormal {
    fn default() -> Self {
        Self { gain: 1.0 }
    }
}

impl XavierNormal {
    /// Create with the given gain.
    pub fn new(gain: f64) -> Self {
        Self { gain }
    }

    /// Standard deviation for the given fans.
    pub fn std(&self, fan_in: usize, fan_out: usize) -> f64 {
        self.gain * (2.0 / (fan_in + fan_out) as f64).sqrt()
    }

    /// Sample a weight tensor of the given shape.
    pub fn sample<B: Backend, const D: usize>(
        &self,
        shape: [usize; D],
        fan_in: usize,
        fan_out: usize,
        device: &B::Device,
    ) -> Tensor<B, D> {
        Tensor::random(shape, Distribution::Normal(0.0, self.std(fan_in, fan_out)), device)
    }
}

/// In-place parameter initialization, dispatched on layer kind.
///
/// The default method does nothing: layers without an explicit
/// implementation are skipped.
pub trait InitWeights {
    /// Initialize with the standard policy (gain 1).
    fn init_weights(&mut self) {
        self.init_weights_with(&XavierNormal::default());
    }

    /// Initialize with an explicit distribution.
    fn init_weights_with(&mut self, _init: &XavierNormal) {}
}

impl<B: Backend> InitWeights for Linear<B> {
    fn init_weights_with(&mut self, init: &XavierNormal) {
        let weight = self.weight.val();
        let device = weight.device();
        let [d_input, d_output] = weight.dims();

        self.weight = Param::from_tensor(init.sample([d_input, d_output], d_input, d_output, &device));
        zero_bias(&mut self.bias);
    }
}

impl<B: Backend> InitWeights for Conv2d<B> {
    fn init_weights_with(&mut self, init: &XavierNormal) {
        self.weight = conv_weight(&self.weight, init);
        zero_bias(&mut self.bias);
    }
}

impl<B: Backend> InitWeights for ConvTranspose2d<B> {
    fn init_weights_with(&mut self, init: &XavierNormal) {
        self.weight = conv_weight(&self.weight, init);
        zero_bias(&mut self.bias);
    }
}

// Skipped: normalization and lookup layers keep their own initialization.
impl<B: Backend> InitWeights for LayerNorm<B> {}
impl<B: Backend> InitWeights for Embedding<B> {}

fn conv_weight<B: Backend>(weight: &Param<Tensor<B, 4>>, init: &XavierNormal) -> Param<Tensor<B, 4>> {
    let weight = weight.val();
    let device = weight.device();
    let dims = weight.dims();
    let receptive = dims[2] * dims[3];

    Param::from_tensor(init.sample(dims, dims[1] * receptive, dims[0] * receptive, &device))
}

fn zero_bias<B: Backend>(bias: &mut Option<Param<Tensor<B, 1>>>) {
    if let Some(b) = bias.as_mut() {
        let value = b.val();
        *b = Param::from_tensor(value.zeros_like());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::nn::conv::{Conv2dConfig, ConvTranspose2dConfig};
    use burn::nn::{LayerNormConfig, LinearConfig};

    type TestBackend = NdArray<f32>;

    fn values<const D: usize>(tensor: Tensor<TestBackend, D>) -> Vec<f32> {
        tensor.into_data().to_vec::<f32>().unwrap()
    }

    fn variance(data: &[f32]) -> f32 {
        let n = data.len() as f32;
        let mean = data.iter().sum::<f32>() / n;
        data.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n
    }

    #[test]
    fn test_linear_bias_zero_and_xavier_variance() {
        let device = Default::default();
        let mut linear = LinearConfig::new(256, 128).init::<TestBackend>(&device);
        linear.init_weights();

        let bias = values(linear.bias.as_ref().unwrap().val());
        assert!(bias.iter().all(|&b| b == 0.0), "bias must be all zero");

        let weight = values(linear.weight.val());
        let expected = 2.0 / (256.0 + 128.0);
        let var = variance(&weight);
        assert!(
            (var - expected).abs() / expected < 0.1,
            "expected variance ~{}, got {}",
            expected,
            var
        );
    }

    #[test]
    fn test_linear_shape_preserved() {
        let device = Default::default();
        let mut linear = LinearConfig::new(7, 3).init::<TestBackend>(&device);
        linear.init_weights();

        assert_eq!(linear.weight.val().dims(), [7, 3]);
        assert_eq!(linear.bias.as_ref().unwrap().val().dims(), [3]);
    }

    #[test]
    fn test_linear_without_bias() {
        let device = Default::default();
        let mut linear = LinearConfig::new(8, 8)
            .with_bias(false)
            .init::<TestBackend>(&device);
        linear.init_weights();

        assert!(linear.bias.is_none());
    }

    #[test]
    fn test_conv2d_variance() {
        let device = Default::default();
        let mut conv = Conv2dConfig::new([16, 32], [4, 4]).init::<TestBackend>(&device);
        conv.init_weights();

        let bias = values(conv.bias.as_ref().unwrap().val());
        assert!(bias.iter().all(|&b| b == 0.0));

        // fan_in = 16 * 16, fan_out = 32 * 16
        let expected = 2.0 / (16.0 * 16.0 + 32.0 * 16.0);
        let var = variance(&values(conv.weight.val()));
        assert!((var - expected).abs() / expected < 0.15, "got {}", var);
    }

    #[test]
    fn test_conv_transpose2d_variance() {
        let device = Default::default();
        let mut deconv = ConvTranspose2dConfig::new([32, 16], [4, 4]).init::<TestBackend>(&device);
        deconv.init_weights();

        let bias = values(deconv.bias.as_ref().unwrap().val());
        assert!(bias.iter().all(|&b| b == 0.0));

        let expected = 2.0 / (32.0 * 16.0 + 16.0 * 16.0);
        let var = variance(&values(deconv.weight.val()));
        assert!((var - expected).abs() / expected < 0.15, "got {}", var);
    }

    #[test]
    fn test_gain_scales_std() {
        let init = XavierNormal::new(2.0);
        let base = XavierNormal::default();

        assert!((init.std(10, 30) - 2.0 * base.std(10, 30)).abs() < 1e-12);
    }

    #[test]
    fn test_layer_norm_untouched() {
        let device = Default::default();
        let mut norm = LayerNormConfig::new(4).init::<TestBackend>(&device);
        let before = values(norm.gamma.val());

        norm.init_weights();

        assert_eq!(values(norm.gamma.val()), before);
    }
}
