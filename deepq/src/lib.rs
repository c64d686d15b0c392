//! Train, evaluate and benchmark DQN agents on Atari games.
//!
//! A run is described by one YAML file, deserialized into [`DqnAtariConfig`].
//! See `configs/breakout.yaml` for the settings of Mnih et al. (2015).
//!
//! The entry points [`train`], [`eval`] and [`random`] are generic over the
//! [`Emulator`](deepq_atari_env::Emulator), so that they run on the
//! Arcade Learning Environment as well as on the scripted emulator used in
//! tests.
pub mod config;
mod run;
pub use config::{DqnAtariConfig, EvalEnvConfig, Seeds};
pub use run::{eval, random, show_config, train, Dqn, Env, Evaluator, ReplayBuffer, StepProc};
