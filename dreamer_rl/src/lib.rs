//! # Dreamer RL: world-model core on burn
//!
//! Building blocks for Dreamer-style model-based agents: the discrete
//! latent sampler, the lambda-return estimator and the greedy evaluation
//! loop that drives a trained recurrent player through an environment.
//!
//! ## Data Flow
//!
//! ```text
//! ┌──────────────┐  logits   ┌──────────────────────┐  latent   ┌──────────┐
//! │ World model  ├──────────►│ compute_stochastic_  ├──────────►│  Player  │
//! │ (external)   │           │ state (one-hot, STE) │           │ (greedy) │
//! └──────┬───────┘           └──────────────────────┘           └────┬─────┘
//!        │ rewards, values, continues                                │ action
//!        ▼                                                           ▼
//! ┌──────────────────────┐  targets                  ┌──────────────────────┐
//! │ compute_lambda_values├──────► actor/critic loss  │ run_episode (DictEnv)│
//! └──────────────────────┘       (external)          └──────────┬───────────┘
//!                                                               ▼
//!                                                    MetricsSink: cumulative reward
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dreamer_rl::{run_episode, DreamerEvalConfig, ConsoleSink};
//!
//! let config = DreamerEvalConfig::new("doapp")
//!     .with_cnn_keys(["frame"])
//!     .with_mlp_keys(["stage"])
//!     .build()?;
//!
//! let reward = run_episode(
//!     &mut player,
//!     |seed, run_name| make_env(&config.env_id, seed, run_name),
//!     &config.preprocessing_rules()?,
//!     &config.eval_config(),
//!     &mut ConsoleSink::new(),
//! )?;
//! ```

pub mod algorithms;
pub mod config;
pub mod environment;
pub mod metrics;
pub mod nn;
pub mod player;
pub mod runners;

// Algorithms
pub use algorithms::{
    compute_lambda_values, compute_lambda_values_scalar, compute_stochastic_state, stochastic_probs,
    ShapeError, DEFAULT_DISCRETE, DEFAULT_HORIZON, DEFAULT_LAMBDA,
};

// Initialization
pub use nn::{InitWeights, XavierNormal};

// Environment
pub use environment::arena::{ArenaConfig, ArenaEngine, ArenaWrapper};
pub use environment::{
    DictEnv, ElementKind, EnvAction, EnvError, Info, ObsArray, Observation, ObservationSpace, Space,
    StepOutcome,
};

// Player
pub use player::{ActionMask, GreedyActions, Player, PreprocessedObs, RecurrentState};

// Evaluation
pub use runners::{run_episode, EvalConfig, EvalError, PreprocessingRules};

// Metrics
pub use metrics::{ConsoleSink, CsvSink, MemorySink, Metrics, MetricsSink, MultiSink};

// Configuration
pub use config::{
    register_model_configs, ConfigError, ConfigStore, DreamerEvalConfig, FinetuneMode,
    HuggingFaceConfig, LoraConfig, ModelConfig,
};
