//! Generic implementation of a uniform replay buffer.
//!
//! # Key Components
//!
//! - [`SimpleReplayBuffer`]: a fixed-capacity ring buffer of transitions with
//!   uniform sampling
//! - [`GenericTransitionBatch`]: a batch of transitions with arbitrary
//!   observation and action containers
//! - [`BatchBase`]: the storage interface those containers implement
//! - [`SimpleStepProcessor`]: turns environment steps into transitions
//!
//! # Examples
//!
//! ```ignore
//! use deepq_core::replay_buffer::{
//!     SimpleReplayBuffer, SimpleReplayBufferConfig, SimpleStepProcessor,
//!     SimpleStepProcessorConfig,
//! };
//!
//! let config = SimpleReplayBufferConfig::default().capacity(10000).seed(42);
//! let mut buffer = SimpleReplayBuffer::<TensorBatch, TensorBatch>::build(&config);
//!
//! let processor_config = SimpleStepProcessorConfig::default();
//! let mut processor = SimpleStepProcessor::<MyEnv, TensorBatch, TensorBatch>::build(&processor_config);
//! ```
mod base;
mod batch;
mod config;
mod step_proc;
pub use base::SimpleReplayBuffer;
pub use batch::{BatchBase, GenericTransitionBatch};
pub use config::SimpleReplayBufferConfig;
pub use step_proc::{SimpleStepProcessor, SimpleStepProcessorConfig};
