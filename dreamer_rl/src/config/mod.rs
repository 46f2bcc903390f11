//! Configuration schemas.
//!
//! - [`DreamerEvalConfig`]: greedy evaluation of a Dreamer agent
//! - [`ModelConfig`] and friends: RLHF model selection and fine-tuning
//! - [`ConfigStore`]: named presets grouped by kind
//!
//! All configs are plain serde structs with `with_*` builder methods and a
//! `validate()` returning [`ConfigError`].

pub mod dreamer;
pub mod rlhf;
pub mod store;

use thiserror::Error;

pub use dreamer::DreamerEvalConfig;
pub use rlhf::{FinetuneMode, HuggingFaceConfig, LoraConfig, ModelConfig, ModelConfigBuilder};
pub use store::{register_model_configs, ConfigStore, MODEL_GROUP};

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field was not set.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A count parameter must be positive.
    #[error("{field} must be > 0, got {value}")]
    InvalidCount { field: &'static str, value: usize },

    /// A parameter is outside its valid range.
    #[error("{field} must be in {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        range: &'static str,
    },

    /// A channel is listed as both image and vector.
    #[error("channel {0} is listed in both cnn_keys and mlp_keys")]
    OverlappingKeys(String),

    /// Neither image nor vector channels were selected.
    #[error("at least one of cnn_keys or mlp_keys must be non-empty")]
    NoChannels,

    /// LoRA fine-tuning without LoRA settings.
    #[error("finetune_mode lora requires lora_config")]
    LoraConfigRequired,

    /// Derived runtime settings could not be built.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// The config could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
