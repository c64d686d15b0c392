#![warn(missing_docs)]
//! Core components of a DQN training harness.
//!
//! This crate defines the seams between the parts of a value-based
//! reinforcement learning setup and provides the parts that do not depend on
//! a tensor backend:
//!
//! * [`Env`], [`Obs`], [`Act`] and [`Step`] describe an environment.
//! * [`Policy`] and [`Agent`] describe what acts in it and learns from it.
//! * [`replay_buffer`] holds a uniform ring replay buffer and the
//!   [`StepProcessor`] turning environment steps into transitions.
//! * [`Trainer`] runs the training loop, [`Evaluator`] scores an agent.
//! * [`record`] carries telemetry from the loop to a recorder.
//! * [`RandomAgent`] is the uniform baseline.
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Act, Agent, Configurable, Env, EnvSpec, ExperienceBufferBase, Info, Obs, Policy,
    ReplayBufferBase, Step, StepProcessor, TransitionBatch,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod random_agent;
pub use random_agent::RandomAgent;

mod trainer;
pub use trainer::{EpisodeStats, Sampler, TrainSummary, Trainer, TrainerConfig};

#[cfg(test)]
pub(crate) mod test_util;
