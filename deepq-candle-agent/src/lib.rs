//! DQN agent and Q-networks implemented with [candle](https://crates.io/crates/candle-core).
//!
//! * [`dqn::Dqn`] is the agent, an implementation of [`deepq_core::Agent`].
//! * [`qnet`] resolves Q-networks by name: `NatureCnn` and `Mlp`.
//! * [`opt::OptimizerConfig`] selects AdamW, Adam or RMSprop.
pub mod cnn;
pub mod dqn;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod qnet;
pub mod util;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The GPU device of the given ordinal.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl TryFrom<Device> for candle_core::Device {
    type Error = candle_core::Error;

    fn try_from(device: Device) -> Result<Self, Self::Error> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}
