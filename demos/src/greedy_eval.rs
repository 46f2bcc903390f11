//! Greedy evaluation of an untrained latent player on the corridor.

use burn::backend::NdArray;
use dreamer_rl::{
    run_episode, ConsoleSink, CsvSink, DictEnv, DreamerEvalConfig, MultiSink, Space,
};

use crate::corridor::Corridor;
use crate::latent_player::LatentPlayer;

type B = NdArray<f32>;

const CORRIDOR_LENGTH: usize = 8;
const RECURRENT_SIZE: usize = 32;

pub fn run(dry_run: bool) {
    let config = match DreamerEvalConfig::new("corridor")
        .with_cnn_keys(["frame"])
        .with_mlp_keys(["position", "mask_action"])
        .with_stochastic(8, 8)
        .with_dry_run(dry_run)
        .with_max_steps(100)
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            log::error!("invalid config: {}", e);
            return;
        }
    };

    let rules = match config.preprocessing_rules() {
        Ok(rules) => rules,
        Err(e) => {
            log::error!("invalid channel partition: {}", e);
            return;
        }
    };

    // Sizes come from a probe env's declared spaces
    let probe = match Corridor::new(CORRIDOR_LENGTH, 50, config.seed) {
        Ok(env) => env,
        Err(e) => {
            log::error!("failed to create corridor: {}", e);
            return;
        }
    };
    let obs_dim: usize = probe
        .observation_space()
        .iter()
        .filter(|(name, _)| rules.cnn_keys().contains(*name) || rules.mlp_keys().contains(*name))
        .filter(|(name, _)| !name.starts_with("mask"))
        .map(|(_, space)| space.element_count())
        .sum();
    let n_actions = match probe.action_space() {
        Space::Discrete { n } => *n,
        other => {
            log::error!("unsupported action space {:?}", other);
            return;
        }
    };

    let device = Default::default();
    let mut player = LatentPlayer::<B>::new(
        obs_dim,
        n_actions,
        RECURRENT_SIZE,
        config.stochastic_size,
        config.discrete_size,
        &device,
    );

    let mut sink = MultiSink::new().add(ConsoleSink::new());
    match CsvSink::new("greedy_eval.csv") {
        Ok(csv) => sink = sink.add(csv),
        Err(e) => log::warn!("CSV output disabled: {}", e),
    }

    let result = run_episode(
        &mut player,
        |seed, run_name| {
            log::info!("creating {} for {}", config.env_id, run_name);
            Corridor::new(CORRIDOR_LENGTH, 50, seed)
        },
        &rules,
        &config.eval_config(),
        &mut sink,
    );

    match result {
        Ok(reward) => println!("Episode finished with reward {:.3}", reward),
        Err(e) => log::error!("evaluation failed: {}", e),
    }
}
