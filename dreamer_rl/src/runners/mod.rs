//! Runners driving a trained player through an environment.
//!
//! - [`run_episode`]: one greedy evaluation episode with cumulative-reward reporting

pub mod greedy_eval;

#[cfg(test)]
mod tests;

pub use greedy_eval::{
    action_masks, actions_to_env, preprocess_observation, run_episode, EvalConfig, EvalError,
    PreprocessingRules, CUMULATIVE_REWARD_METRIC, MASK_PREFIX,
};
