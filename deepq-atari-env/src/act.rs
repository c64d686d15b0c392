//! Action for [`AtariEnv`](crate::AtariEnv).
use anyhow::{ensure, Result};
use deepq_core::{replay_buffer::BatchBase, Act};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Index into the action set of the emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct AtariAct {
    pub act: u8,
}

impl AtariAct {
    pub fn new(act: u8) -> Self {
        Self { act }
    }
}

impl Act for AtariAct {}

impl From<u8> for AtariAct {
    fn from(act: u8) -> Self {
        Self { act }
    }
}

/// Indices that do not fit in `u8` become 255, which no game accepts.
impl From<usize> for AtariAct {
    fn from(act: usize) -> Self {
        Self {
            act: u8::try_from(act).unwrap_or(u8::MAX),
        }
    }
}

/// Actions part of a batch in a replay buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AtariActBatch {
    /// One action index per transition.
    pub buf: Vec<u8>,
}

impl AtariActBatch {
    /// The number of actions in the batch.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl BatchBase for AtariActBatch {
    fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
        }
    }

    fn push(&mut self, ix: usize, data: Self) -> Result<()> {
        let capacity = self.buf.len();
        ensure!(capacity > 0, "cannot push into a batch of zero capacity");
        for (j, a) in data.buf.into_iter().enumerate() {
            self.buf[(ix + j) % capacity] = a;
        }
        Ok(())
    }

    fn sample(&self, ixs: &[usize]) -> Result<Self> {
        let buf = ixs
            .iter()
            .map(|&ix| {
                self.buf.get(ix).copied().ok_or_else(|| {
                    anyhow::anyhow!("index {} out of range ({})", ix, self.buf.len())
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { buf })
    }
}

impl From<AtariAct> for AtariActBatch {
    fn from(act: AtariAct) -> Self {
        Self { buf: vec![act.act] }
    }
}

#[cfg(feature = "candle")]
mod candle {
    use super::*;
    use candle_core::{Device, Tensor};

    /// A tensor of shape `[1, 1]` and dtype `i64`.
    impl TryFrom<AtariAct> for Tensor {
        type Error = candle_core::Error;

        fn try_from(act: AtariAct) -> Result<Self, Self::Error> {
            Tensor::from_vec(vec![act.act as i64], (1, 1), &Device::Cpu)
        }
    }

    /// A tensor of shape `[batch_size, 1]` and dtype `i64`.
    impl TryFrom<AtariActBatch> for Tensor {
        type Error = candle_core::Error;

        fn try_from(batch: AtariActBatch) -> Result<Self, Self::Error> {
            let n = batch.len();
            let buf = batch.buf.into_iter().map(i64::from).collect::<Vec<_>>();
            Tensor::from_vec(buf, (n, 1), &Device::Cpu)
        }
    }
}
