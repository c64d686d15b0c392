//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum DeepqError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// A batch was requested from a replay buffer holding no transitions.
    #[error("Cannot sample a batch from an empty replay buffer")]
    EmptyReplayBuffer,

    /// An action index outside of the action set of the environment.
    #[error("Invalid action {act}: the environment has {n_actions} actions")]
    InvalidAction {
        /// The given action index.
        act: usize,

        /// The number of discrete actions.
        n_actions: usize,
    },

    /// A configuration value that cannot be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A network name missing from the model registry.
    #[error("Unknown model '{name}', available models: {available:?}")]
    UnknownModel {
        /// The requested name.
        name: String,

        /// Names in the registry.
        available: Vec<String>,
    },
}
