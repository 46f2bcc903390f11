//! Named configuration presets.

use std::collections::BTreeMap;

use super::rlhf::ModelConfig;

/// Group holding the RLHF model presets.
pub const MODEL_GROUP: &str = "model";

/// Registry of model configs keyed by `(group, name)`.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    entries: BTreeMap<(String, String), ModelConfig>,
}

impl ConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a config, replacing any previous entry with the same key.
    pub fn store(&mut self, group: impl Into<String>, name: impl Into<String>, node: ModelConfig) {
        let key = (group.into(), name.into());
        if self.entries.insert(key.clone(), node).is_some() {
            log::debug!("replaced config {}/{}", key.0, key.1);
        }
    }

    /// Look up a config.
    pub fn get(&self, group: &str, name: &str) -> Option<&ModelConfig> {
        self.entries.get(&(group.to_string(), name.to_string()))
    }

    /// Names registered in a group, sorted.
    pub fn names(&self, group: &str) -> Vec<&str> {
        self.entries
            .keys()
            .filter(|(g, _)| g == group)
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Number of stored configs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Register the `opt`, `gpt2` and `phi` presets in the `model` group.
pub fn register_model_configs(store: &mut ConfigStore) {
    store.store(MODEL_GROUP, "opt", ModelConfig::opt());
    store.store(MODEL_GROUP, "gpt2", ModelConfig::gpt2());
    store.store(MODEL_GROUP, "phi", ModelConfig::phi());
}
