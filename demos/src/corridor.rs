//! A one-dimensional corridor with dictionary observations.
//!
//! The agent starts at a random cell in the left half and must walk to the
//! last cell. Observations:
//!
//! - `frame`: `[1, 1, length]` image, 255 at the agent's cell
//! - `position`: `[1]`, the normalized position
//! - `mask_action`: `[2]`, 0 for moves that would leave the corridor

use dreamer_rl::{
    DictEnv, ElementKind, EnvAction, EnvError, Info, ObsArray, Observation, ObservationSpace, Space,
    StepOutcome,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const STEP_PENALTY: f32 = -0.01;
const GOAL_REWARD: f32 = 1.0;

pub struct Corridor {
    length: usize,
    max_steps: usize,
    position: usize,
    steps: usize,
    rng: StdRng,
    observation_space: ObservationSpace,
    action_space: Space,
    closed: bool,
}

impl Corridor {
    pub fn new(length: usize, max_steps: usize, seed: u64) -> Result<Self, EnvError> {
        if length < 2 {
            return Err(EnvError::Creation(format!("corridor length {} < 2", length)));
        }

        let mut observation_space = ObservationSpace::new();
        observation_space.insert(
            "frame".into(),
            Space::uniform_box(0.0, 255.0, vec![1, 1, length], ElementKind::Byte),
        );
        observation_space.insert(
            "position".into(),
            Space::uniform_box(0.0, 1.0, vec![1], ElementKind::Float),
        );
        observation_space.insert(
            "mask_action".into(),
            Space::uniform_box(0.0, 1.0, vec![2], ElementKind::Float),
        );

        Ok(Self {
            length,
            max_steps,
            position: 0,
            steps: 0,
            rng: StdRng::seed_from_u64(seed),
            observation_space,
            action_space: Space::Discrete { n: 2 },
            closed: false,
        })
    }

    fn observation(&self) -> Result<Observation, EnvError> {
        let mut frame = vec![0.0; self.length];
        frame[self.position] = 255.0;
        let can_left = if self.position > 0 { 1.0 } else { 0.0 };

        let mut obs = Observation::new();
        obs.insert("frame".into(), ObsArray::new(vec![1, 1, self.length], frame)?);
        obs.insert(
            "position".into(),
            ObsArray::vector(vec![self.position as f32 / (self.length - 1) as f32]),
        );
        obs.insert("mask_action".into(), ObsArray::vector(vec![can_left, 1.0]));
        Ok(obs)
    }
}

impl DictEnv for Corridor {
    fn observation_space(&self) -> &ObservationSpace {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, Info), EnvError> {
        if self.closed {
            return Err(EnvError::Closed);
        }
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.position = self.rng.gen_range(0..self.length / 2);
        self.steps = 0;
        Ok((self.observation()?, Info::new()))
    }

    fn step(&mut self, action: &EnvAction) -> Result<StepOutcome, EnvError> {
        if self.closed {
            return Err(EnvError::Closed);
        }
        let index = match action {
            EnvAction::Discrete { indices, .. } if indices.len() == 1 => indices[0],
            other => return Err(EnvError::InvalidAction(format!("{:?}", other))),
        };
        match index {
            0 => self.position = self.position.saturating_sub(1),
            1 => self.position = (self.position + 1).min(self.length - 1),
            i => return Err(EnvError::InvalidAction(format!("index {} out of range", i))),
        }
        self.steps += 1;

        let terminated = self.position == self.length - 1;
        let reward = if terminated { GOAL_REWARD } else { STEP_PENALTY };
        log::trace!("corridor step {}: position {}", self.steps, self.position);

        Ok(StepOutcome {
            observation: self.observation()?,
            reward,
            terminated,
            truncated: !terminated && self.steps >= self.max_steps,
            info: Info::new(),
        })
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.closed = true;
        Ok(())
    }
}
