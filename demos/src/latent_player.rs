//! Untrained recurrent player with a discrete latent state.
//!
//! ```text
//! h_t    = tanh(W_h [z_{t-1}, h_{t-1}])
//! z_t    ~ one_hot(Categorical(encoder([obs_t, h_t])))
//! action = argmax(actor([z_t, h_t]) + mask penalty)
//! ```
//!
//! Weights are Xavier-initialized and never trained; the demo only shows
//! the data flow through the evaluation loop.

use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation::softmax;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use dreamer_rl::{
    ActionMask, GreedyActions, InitWeights, Player, PreprocessedObs, RecurrentState, ShapeError,
};

const MASK_PENALTY: f32 = 1e4;

pub struct LatentPlayer<B: Backend> {
    recurrent: Linear<B>,
    encoder: Linear<B>,
    actor: Linear<B>,
    recurrent_size: usize,
    stochastic_size: usize,
    discrete: usize,
    num_envs: usize,
    state: RecurrentState<B>,
    device: B::Device,
}

impl<B: Backend> LatentPlayer<B> {
    pub fn new(
        obs_dim: usize,
        n_actions: usize,
        recurrent_size: usize,
        stochastic_size: usize,
        discrete: usize,
        device: &B::Device,
    ) -> Self {
        let latent = recurrent_size + stochastic_size * discrete;

        let mut recurrent = LinearConfig::new(latent, recurrent_size).init(device);
        let mut encoder = LinearConfig::new(obs_dim + recurrent_size, stochastic_size * discrete).init(device);
        let mut actor = LinearConfig::new(latent, n_actions).init(device);
        recurrent.init_weights();
        encoder.init_weights();
        actor.init_weights();

        Self {
            recurrent,
            encoder,
            actor,
            recurrent_size,
            stochastic_size,
            discrete,
            num_envs: 1,
            state: RecurrentState::zeros(1, recurrent_size, stochastic_size, discrete, device),
            device: device.clone(),
        }
    }

    fn features(&self, obs: &PreprocessedObs<B>) -> Tensor<B, 3> {
        let mut parts: Vec<Tensor<B, 3>> = obs
            .images
            .values()
            .map(|image| {
                let [_, _, c, h, w] = image.dims();
                image.clone().reshape([1, self.num_envs, c * h * w])
            })
            .collect();
        parts.extend(
            obs.vectors
                .iter()
                .filter(|(name, _)| !name.starts_with("mask"))
                .map(|(_, v)| v.clone()),
        );
        Tensor::cat(parts, 2)
    }
}

impl<B: Backend> Player<B> for LatentPlayer<B> {
    fn device(&self) -> B::Device {
        self.device.clone()
    }

    fn num_envs(&self) -> usize {
        self.num_envs
    }

    fn set_num_envs(&mut self, n: usize) {
        self.num_envs = n;
    }

    fn init_states(&mut self) {
        self.state = RecurrentState::zeros(
            self.num_envs,
            self.recurrent_size,
            self.stochastic_size,
            self.discrete,
            &self.device,
        );
    }

    fn greedy_action(
        &mut self,
        obs: &PreprocessedObs<B>,
        mask: &ActionMask<B>,
    ) -> Result<GreedyActions<B>, ShapeError> {
        let recurrent = self.recurrent.forward(self.state.latent()).tanh();
        let logits = self
            .encoder
            .forward(Tensor::cat(vec![self.features(obs), recurrent.clone()], 2));
        self.state = RecurrentState::from_logits(recurrent, logits, self.discrete)?;

        let mut action_logits = self.actor.forward(self.state.latent());
        if let Some(mask) = mask.get("mask_action") {
            action_logits = action_logits + mask.clone().sub_scalar(1.0).mul_scalar(MASK_PENALTY);
        }

        Ok(GreedyActions::discrete(vec![softmax(action_logits, 2)]))
    }
}
