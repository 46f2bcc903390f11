//! Adapter for the fighting-game arena engine.
//!
//! The engine speaks its own dialect: scalar and discrete observation
//! channels, settings and wrapper dictionaries, a 4-tuple step result.
//! [`ArenaWrapper`] owns the engine and implements [`DictEnv`] by forwarding
//! each call explicitly, converting spaces and observations on the way.
//!
//! ## Settings resolution
//!
//! - `frame_shape` is removed from the settings (resizing is done by the wrapper)
//! - `sticky_actions > 1` forces `step_ratio = 1`
//! - `hwc_obs_resize`, `frame_stack` and `dilation` wrappers are removed
//! - `flatten`, `sticky_actions` and `hwc_obs_resize` are always set
//!
//! ```ignore
//! let config = ArenaConfig::new("doapp")
//!     .with_screen_size(64, 64)
//!     .with_sticky_actions(4);
//! let env = ArenaWrapper::new(config, |id, resolved, seed, rank| {
//!     MyEngine::connect(id, resolved, seed, rank)
//! })?;
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::spaces::{ElementKind, ObservationSpace, Space};
use super::{DictEnv, EnvAction, EnvError, Info, ObsArray, Observation, StepOutcome};

/// Domain tag written into every info dictionary.
pub const ENV_DOMAIN: &str = "DIAMBRA";

/// Raw step result of the engine: observation, reward, done, info.
pub type EngineStep = (Observation, f32, bool, Info);

/// The external engine handle.
pub trait ArenaEngine {
    /// Engine-native observation spaces (may contain discrete channels).
    fn observation_space(&self) -> &ObservationSpace;

    /// Engine-native action space (`Discrete` or `MultiDiscrete`).
    fn action_space(&self) -> &Space;

    /// Start a new episode.
    fn reset(&mut self) -> Result<Observation, EnvError>;

    /// Apply one action.
    fn step(&mut self, action: &EnvAction) -> Result<EngineStep, EnvError>;

    /// Current frame as an RGB array, if the engine renders.
    fn render(&mut self) -> Result<Option<ObsArray>, EnvError>;

    /// Shut the engine down.
    fn close(&mut self) -> Result<(), EnvError>;
}

/// User-facing configuration of the arena adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Game identifier.
    pub id: String,
    /// `"discrete"` or `"multi_discrete"` (case-insensitive).
    pub action_space: String,
    /// Output frame size `(height, width)`.
    pub screen_size: (usize, usize),
    /// Single-channel frames.
    pub grayscale: bool,
    /// Expose attack button combinations as actions.
    pub attack_but_combination: bool,
    /// Number of frames each action is repeated.
    pub sticky_actions: usize,
    /// Engine seed.
    pub seed: Option<u64>,
    /// Engine rank in a multi-engine setup.
    pub rank: usize,
    /// Extra engine settings.
    pub settings: serde_json::Map<String, Value>,
    /// Extra engine wrapper options.
    pub wrappers: serde_json::Map<String, Value>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            action_space: "discrete".to_string(),
            screen_size: (64, 64),
            grayscale: false,
            attack_but_combination: true,
            sticky_actions: 1,
            seed: None,
            rank: 0,
            settings: serde_json::Map::new(),
            wrappers: serde_json::Map::new(),
        }
    }
}

impl ArenaConfig {
    /// Create a config for the given game.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set the action space kind.
    pub fn with_action_space(mut self, action_space: impl Into<String>) -> Self {
        self.action_space = action_space.into();
        self
    }

    /// Set a square or rectangular screen size.
    pub fn with_screen_size(mut self, height: usize, width: usize) -> Self {
        self.screen_size = (height, width);
        self
    }

    /// Enable or disable grayscale frames.
    pub fn with_grayscale(mut self, grayscale: bool) -> Self {
        self.grayscale = grayscale;
        self
    }

    /// Set the sticky action count.
    pub fn with_sticky_actions(mut self, sticky_actions: usize) -> Self {
        self.sticky_actions = sticky_actions;
        self
    }

    /// Set the engine seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the engine rank.
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    /// Add an engine setting.
    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// Add an engine wrapper option.
    pub fn with_wrapper(mut self, key: impl Into<String>, value: Value) -> Self {
        self.wrappers.insert(key.into(), value);
        self
    }

    /// True when the discrete action space was requested.
    pub fn is_discrete(&self) -> bool {
        self.action_space.to_lowercase() == "discrete"
    }

    /// Settings and wrappers as handed to the engine.
    pub fn resolve(&self) -> ResolvedArena {
        let mut settings = self.settings.clone();
        if settings.remove("frame_shape").is_some_and(|v| !v.is_null()) {
            log::warn!("The arena frame_shape setting is disabled");
        }
        settings.insert("action_space".into(), json!(self.action_space.to_lowercase()));
        settings.insert(
            "attack_but_combination".into(),
            json!(self.attack_but_combination),
        );

        if self.sticky_actions > 1 {
            let step_ratio = settings.get("step_ratio").and_then(Value::as_f64);
            if step_ratio.map_or(true, |r| r > 1.0) {
                log::warn!(
                    "step_ratio parameter modified to 1 because the sticky action is active ({})",
                    self.sticky_actions
                );
            }
            settings.insert("step_ratio".into(), json!(1));
        }

        let mut wrappers = self.wrappers.clone();
        for disabled in ["hwc_obs_resize", "frame_stack", "dilation"] {
            if wrappers.remove(disabled).is_some_and(|v| !v.is_null()) {
                log::warn!("The arena {} wrapper is disabled", disabled);
            }
        }
        let channels = if self.grayscale { 1 } else { 3 };
        let (height, width) = self.screen_size;
        wrappers.insert("flatten".into(), json!(true));
        wrappers.insert("sticky_actions".into(), json!(self.sticky_actions));
        wrappers.insert("hwc_obs_resize".into(), json!([height, width, channels]));

        ResolvedArena { settings, wrappers }
    }
}

/// Engine settings after resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArena {
    pub settings: serde_json::Map<String, Value>,
    pub wrappers: serde_json::Map<String, Value>,
}

/// [`DictEnv`] over an [`ArenaEngine`].
pub struct ArenaWrapper<E> {
    engine: E,
    observation_space: ObservationSpace,
    action_space: Space,
}

impl<E: ArenaEngine> ArenaWrapper<E> {
    /// Resolve the config and build the engine through `make_engine`.
    ///
    /// `make_engine` receives the game id, the resolved settings, the seed
    /// and the rank.
    pub fn new<F>(config: ArenaConfig, make_engine: F) -> Result<Self, EnvError>
    where
        F: FnOnce(&str, &ResolvedArena, Option<u64>, usize) -> Result<E, EnvError>,
    {
        let resolved = config.resolve();
        let engine = make_engine(&config.id, &resolved, config.seed, config.rank)?;
        Self::from_engine(engine, config.is_discrete())
    }

    /// Wrap an already constructed engine.
    pub fn from_engine(engine: E, discrete: bool) -> Result<Self, EnvError> {
        let action_space = match (discrete, engine.action_space()) {
            (true, Space::Discrete { n }) => Space::Discrete { n: *n },
            (false, Space::MultiDiscrete { nvec }) => Space::MultiDiscrete { nvec: nvec.clone() },
            _ => return Err(EnvError::UnsupportedSpace("action".to_string())),
        };

        let observation_space: ObservationSpace = engine
            .observation_space()
            .iter()
            .map(|(key, space)| (key.clone(), convert_space(space)))
            .collect();

        Ok(Self {
            engine,
            observation_space,
            action_space,
        })
    }

    /// Get a reference to the underlying engine.
    pub fn inner(&self) -> &E {
        &self.engine
    }

    /// Get a mutable reference to the underlying engine.
    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Consume the wrapper and return the underlying engine.
    pub fn into_inner(self) -> E {
        self.engine
    }

    /// Current RGB frame.
    pub fn render(&mut self) -> Result<Option<ObsArray>, EnvError> {
        self.engine.render()
    }

    fn convert_obs(&self, obs: Observation) -> Result<Observation, EnvError> {
        obs.into_iter()
            .map(|(key, value)| {
                let shape = self
                    .observation_space
                    .get(&key)
                    .map(Space::shape)
                    .ok_or_else(|| EnvError::UnsupportedSpace(key.clone()))?;
                let len = value.len();
                let value = value.reshaped(shape.clone()).map_err(|_| EnvError::ShapeMismatch {
                    channel: Some(key.clone()),
                    expected: shape,
                    len,
                })?;
                Ok((key, value))
            })
            .collect()
    }
}

impl<E: ArenaEngine> DictEnv for ArenaWrapper<E> {
    fn observation_space(&self) -> &ObservationSpace {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reset(&mut self, _seed: Option<u64>) -> Result<(Observation, Info), EnvError> {
        // The engine is seeded at construction
        let obs = self.engine.reset()?;
        let mut info = Info::new();
        info.insert("env_domain".into(), json!(ENV_DOMAIN));
        Ok((self.convert_obs(obs)?, info))
    }

    fn step(&mut self, action: &EnvAction) -> Result<StepOutcome, EnvError> {
        let (obs, reward, done, mut info) = self.engine.step(action)?;
        let env_done = info.get("env_done").and_then(Value::as_bool).unwrap_or(false);
        info.insert("env_domain".into(), json!(ENV_DOMAIN));

        Ok(StepOutcome {
            observation: self.convert_obs(obs)?,
            reward,
            terminated: done || env_done,
            truncated: false,
            info,
        })
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.engine.close()
    }
}

/// Express an engine space as a `Box`.
fn convert_space(space: &Space) -> Space {
    match space {
        Space::Box { .. } => space.clone(),
        Space::Discrete { n } => Space::Box {
            low: vec![0.0],
            high: vec![n.saturating_sub(1) as f32],
            shape: vec![1],
            dtype: ElementKind::Int,
        },
        Space::MultiDiscrete { nvec } => Space::Box {
            low: vec![0.0; nvec.len()],
            high: nvec.iter().map(|&n| n.saturating_sub(1) as f32).collect(),
            shape: vec![nvec.len()],
            dtype: ElementKind::Int,
        },
    }
}
