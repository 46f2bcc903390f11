//! RLHF model configuration.
//!
//! A [`ModelConfig`] names a pretrained language model, how its weights are
//! loaded ([`HuggingFaceConfig`]) and which part of it is fine-tuned
//! ([`FinetuneMode`], [`LoraConfig`]).
//!
//! ```ignore
//! let model = ModelConfig::builder()
//!     .name("facebook/opt-350m")
//!     .finetune_mode(FinetuneMode::Lora)
//!     .lora_config(LoraConfig::new("('q_proj','v_proj')"))
//!     .build()?;
//! assert_eq!(model.library_config.model_name, "facebook/opt-350m");
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Which parameters are trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinetuneMode {
    #[default]
    All,
    LastLayer,
    Lora,
}

/// Loading options for the `transformers` library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuggingFaceConfig {
    /// Library name.
    pub name: String,
    /// Model to load. Empty until resolved from the owning model's name.
    pub model_name: String,
    pub trust_remote_code: bool,
    pub load_in_8bit: bool,
    pub low_cpu_mem_usage: bool,
    pub use_cache: bool,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            name: "transformers".to_string(),
            model_name: String::new(),
            trust_remote_code: false,
            load_in_8bit: false,
            low_cpu_mem_usage: false,
            use_cache: false,
        }
    }
}

impl HuggingFaceConfig {
    /// Allow custom model code from the hub.
    pub fn with_trust_remote_code(mut self, trust: bool) -> Self {
        self.trust_remote_code = trust;
        self
    }

    /// Load weights quantized to 8 bits.
    pub fn with_load_in_8bit(mut self, load_in_8bit: bool) -> Self {
        self.load_in_8bit = load_in_8bit;
        self
    }

    /// Reduce peak memory while loading.
    pub fn with_low_cpu_mem_usage(mut self, low: bool) -> Self {
        self.low_cpu_mem_usage = low;
        self
    }

    /// Keep the key/value cache during generation.
    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }
}

/// Low-rank adaptation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraConfig {
    /// Target module names, as a tuple literal (e.g. `('q_proj','v_proj')`).
    pub targets: String,
    #[serde(default = "default_lora_rank")]
    pub rank: usize,
    #[serde(default = "default_lora_alpha")]
    pub alpha: f32,
    #[serde(default)]
    pub dropout: f32,
}

fn default_lora_rank() -> usize {
    16
}

fn default_lora_alpha() -> f32 {
    16.0
}

impl LoraConfig {
    /// LoRA on the given targets with rank 16, alpha 16, no dropout.
    pub fn new(targets: impl Into<String>) -> Self {
        Self {
            targets: targets.into(),
            rank: default_lora_rank(),
            alpha: default_lora_alpha(),
            dropout: 0.0,
        }
    }

    /// Set the rank.
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    /// Set the scaling numerator.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the dropout probability.
    pub fn with_dropout(mut self, dropout: f32) -> Self {
        self.dropout = dropout;
        self
    }

    /// Check rank, targets and dropout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::Missing("lora_config.targets"));
        }
        if self.rank == 0 {
            return Err(ConfigError::InvalidCount {
                field: "lora_config.rank",
                value: 0,
            });
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ConfigError::OutOfRange {
                field: "lora_config.dropout",
                value: f64::from(self.dropout),
                range: "[0, 1)",
            });
        }
        Ok(())
    }
}

/// Pretrained model selection and fine-tuning policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Hub identifier of the model.
    pub name: String,
    /// Name of the embedding-size attribute in the model config.
    pub embedding_dim_name: Option<String>,
    /// Attribute holding the transformer body.
    pub transformer_name: Option<String>,
    /// Causal (decoder-only) language model.
    pub casual: bool,
    pub freeze_transformer: bool,
    pub disable_dropout: bool,
    pub library_config: HuggingFaceConfig,
    pub finetune_mode: FinetuneMode,
    pub lora_config: Option<LoraConfig>,
}

impl ModelConfig {
    /// Start building a model config.
    pub fn builder() -> ModelConfigBuilder {
        ModelConfigBuilder::default()
    }

    /// `facebook/opt-350m` with LoRA on the query/value projections.
    pub fn opt() -> Self {
        Self::preset(
            ModelConfig::builder()
                .name("facebook/opt-350m")
                .embedding_dim_name("word_embed_proj_dim")
                .lora_config(LoraConfig::new("('q_proj','v_proj')")),
        )
    }

    /// `gpt2-medium` with LoRA on the fused attention projection.
    pub fn gpt2() -> Self {
        Self::preset(
            ModelConfig::builder()
                .name("gpt2-medium")
                .embedding_dim_name("n_embd")
                .lora_config(LoraConfig::new("('c_attn',)")),
        )
    }

    /// `microsoft/phi-1_5`, which ships custom model code.
    pub fn phi() -> Self {
        Self::preset(
            ModelConfig::builder()
                .name("microsoft/phi-1_5")
                .library_config(HuggingFaceConfig::default().with_trust_remote_code(true)),
        )
    }

    fn preset(builder: ModelConfigBuilder) -> Self {
        let name = builder.name.clone().unwrap_or_default();
        builder.into_config(name)
    }

    /// Check cross-field consistency.
    ///
    /// # Validation Rules
    /// - `name` must be set
    /// - `finetune_mode == Lora` requires `lora_config`
    /// - `lora_config`, when present, must be valid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Missing("name"));
        }
        if self.finetune_mode == FinetuneMode::Lora && self.lora_config.is_none() {
            return Err(ConfigError::LoraConfigRequired);
        }
        if let Some(lora) = &self.lora_config {
            lora.validate()?;
        }
        Ok(())
    }

    /// Parse from JSON, resolving the library model name.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        if config.library_config.model_name.is_empty() {
            config.library_config.model_name = config.name.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Builder for [`ModelConfig`]; `name` is mandatory.
#[derive(Debug, Clone, Default)]
pub struct ModelConfigBuilder {
    name: Option<String>,
    embedding_dim_name: Option<String>,
    transformer_name: Option<String>,
    casual: Option<bool>,
    freeze_transformer: bool,
    disable_dropout: bool,
    library_config: Option<HuggingFaceConfig>,
    finetune_mode: FinetuneMode,
    lora_config: Option<LoraConfig>,
}

impl ModelConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn embedding_dim_name(mut self, name: impl Into<String>) -> Self {
        self.embedding_dim_name = Some(name.into());
        self
    }

    pub fn transformer_name(mut self, name: impl Into<String>) -> Self {
        self.transformer_name = Some(name.into());
        self
    }

    pub fn casual(mut self, casual: bool) -> Self {
        self.casual = Some(casual);
        self
    }

    pub fn freeze_transformer(mut self, freeze: bool) -> Self {
        self.freeze_transformer = freeze;
        self
    }

    pub fn disable_dropout(mut self, disable: bool) -> Self {
        self.disable_dropout = disable;
        self
    }

    pub fn library_config(mut self, config: HuggingFaceConfig) -> Self {
        self.library_config = Some(config);
        self
    }

    pub fn finetune_mode(mut self, mode: FinetuneMode) -> Self {
        self.finetune_mode = mode;
        self
    }

    pub fn lora_config(mut self, config: LoraConfig) -> Self {
        self.lora_config = Some(config);
        self
    }

    /// Build and validate.
    ///
    /// The library config's `model_name` is filled from `name` unless it
    /// was set explicitly.
    pub fn build(self) -> Result<ModelConfig, ConfigError> {
        let name = self.name.clone().ok_or(ConfigError::Missing("name"))?;
        let config = self.into_config(name);
        config.validate()?;
        Ok(config)
    }

    fn into_config(self, name: String) -> ModelConfig {
        let mut library_config = self.library_config.unwrap_or_default();
        if library_config.model_name.is_empty() {
            library_config.model_name = name.clone();
        }

        ModelConfig {
            name,
            embedding_dim_name: self.embedding_dim_name,
            transformer_name: self.transformer_name,
            casual: self.casual.unwrap_or(true),
            freeze_transformer: self.freeze_transformer,
            disable_dropout: self.disable_dropout,
            library_config,
            finetune_mode: self.finetune_mode,
            lora_config: self.lora_config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_name() {
        assert!(matches!(
            ModelConfig::builder().build(),
            Err(ConfigError::Missing("name"))
        ));
    }

    #[test]
    fn test_builder_defaults_and_model_name_resolution() {
        let config = ModelConfig::builder().name("my/model").build().unwrap();

        assert!(config.casual);
        assert!(!config.freeze_transformer);
        assert!(!config.disable_dropout);
        assert_eq!(config.finetune_mode, FinetuneMode::All);
        assert!(config.lora_config.is_none());
        assert_eq!(config.library_config.name, "transformers");
        assert_eq!(config.library_config.model_name, "my/model");
        assert!(!config.library_config.trust_remote_code);
        assert!(!config.library_config.load_in_8bit);
        assert!(!config.library_config.low_cpu_mem_usage);
        assert!(!config.library_config.use_cache);
    }

    #[test]
    fn test_presets() {
        let opt = ModelConfig::opt();
        assert_eq!(opt.name, "facebook/opt-350m");
        assert_eq!(opt.embedding_dim_name.as_deref(), Some("word_embed_proj_dim"));
        assert_eq!(opt.lora_config.as_ref().unwrap().targets, "('q_proj','v_proj')");
        assert_eq!(opt.library_config.model_name, "facebook/opt-350m");

        let gpt2 = ModelConfig::gpt2();
        assert_eq!(gpt2.name, "gpt2-medium");
        assert_eq!(gpt2.embedding_dim_name.as_deref(), Some("n_embd"));
        assert_eq!(gpt2.lora_config.as_ref().unwrap().targets, "('c_attn',)");

        let phi = ModelConfig::phi();
        assert_eq!(phi.name, "microsoft/phi-1_5");
        assert!(phi.library_config.trust_remote_code);
        assert!(phi.lora_config.is_none());
        assert_eq!(phi.library_config.model_name, "microsoft/phi-1_5");

        for preset in [opt, gpt2, phi] {
            assert!(preset.validate().is_ok());
        }
    }

    #[test]
    fn test_lora_defaults() {
        let lora = LoraConfig::new("('q_proj',)");

        assert_eq!(lora.rank, 16);
        assert_eq!(lora.alpha, 16.0);
        assert_eq!(lora.dropout, 0.0);
    }

    #[test]
    fn test_lora_mode_requires_lora_config() {
        let result = ModelConfig::builder()
            .name("facebook/opt-350m")
            .finetune_mode(FinetuneMode::Lora)
            .build();

        assert!(matches!(result, Err(ConfigError::LoraConfigRequired)));
    }

    #[test]
    fn test_lora_validation() {
        assert!(matches!(
            LoraConfig::new("('c_attn',)").with_rank(0).validate(),
            Err(ConfigError::InvalidCount { .. })
        ));
        assert!(matches!(
            LoraConfig::new("('c_attn',)").with_dropout(1.0).validate(),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(LoraConfig::new("('c_attn',)").with_dropout(0.1).validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let config = ModelConfig::from_json(
            r#"{
                "name": "gpt2",
                "embedding_dim_name": "n_embd",
                "transformer_name": null,
                "casual": true,
                "freeze_transformer": true,
                "disable_dropout": false,
                "library_config": {"use_cache": true},
                "finetune_mode": "last_layer",
                "lora_config": null
            }"#,
        )
        .unwrap();

        assert_eq!(config.finetune_mode, FinetuneMode::LastLayer);
        assert_eq!(config.library_config.name, "transformers");
        assert_eq!(config.library_config.model_name, "gpt2");
        assert!(config.library_config.use_cache);
    }

    #[test]
    fn test_finetune_mode_serde() {
        assert_eq!(serde_json::to_string(&FinetuneMode::LastLayer).unwrap(), r#""last_layer""#);
        assert_eq!(serde_json::to_string(&FinetuneMode::Lora).unwrap(), r#""lora""#);
    }
}
