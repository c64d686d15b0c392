//! Observation for [`AtariEnv`](crate::AtariEnv).
use anyhow::{bail, ensure, Result};
use deepq_core::{replay_buffer::BatchBase, Obs};

/// Stacked preprocessed frames.
///
/// `frames` is laid out channel-first with shape `[channels, height, width]`,
/// the oldest frame first.
#[derive(Debug, Clone, PartialEq)]
pub struct AtariObs {
    pub frames: Vec<u8>,
    pub shape: [usize; 3],
}

impl AtariObs {
    pub fn new(frames: Vec<u8>, shape: [usize; 3]) -> Result<Self> {
        ensure!(
            frames.len() == shape.iter().product::<usize>(),
            "{} bytes do not match the shape {:?}",
            frames.len(),
            shape
        );
        Ok(Self { frames, shape })
    }

    /// Returns the `i`-th channel.
    pub fn channel(&self, i: usize) -> &[u8] {
        let m = self.shape[1] * self.shape[2];
        &self.frames[i * m..(i + 1) * m]
    }
}

impl Obs for AtariObs {}

/// Observations part of a batch in a replay buffer.
///
/// The storage is allocated on the first push, when the size of an
/// observation is known.
#[derive(Debug, Clone, PartialEq)]
pub struct AtariObsBatch {
    /// The number of observations in the batch.
    pub n: usize,

    /// Shape of a single observation.
    pub shape: [usize; 3],

    /// Observations, one after another.
    pub buf: Vec<u8>,

    capacity: usize,
}

impl AtariObsBatch {
    /// The length of an observation in bytes.
    pub fn m(&self) -> usize {
        self.shape.iter().product()
    }
}

impl BatchBase for AtariObsBatch {
    fn new(capacity: usize) -> Self {
        Self {
            n: 0,
            shape: [0; 3],
            buf: vec![],
            capacity,
        }
    }

    fn push(&mut self, ix: usize, data: Self) -> Result<()> {
        ensure!(self.capacity > 0, "cannot push into a batch of zero capacity");
        if self.buf.is_empty() {
            self.shape = data.shape;
            self.buf = vec![0; self.capacity * data.m()];
        } else if self.shape != data.shape {
            bail!(
                "observation of shape {:?} pushed into a batch of {:?}",
                data.shape,
                self.shape
            );
        }

        let m = self.m();
        for (j, obs) in data.buf.chunks(m).enumerate() {
            let k = (ix + j) % self.capacity;
            self.buf[k * m..(k + 1) * m].copy_from_slice(obs);
        }
        self.n = (self.n + data.n).min(self.capacity);
        Ok(())
    }

    fn sample(&self, ixs: &[usize]) -> Result<Self> {
        let m = self.m();
        let mut buf = Vec::with_capacity(ixs.len() * m);
        for &ix in ixs {
            ensure!(ix < self.n, "index {} out of range ({})", ix, self.n);
            buf.extend_from_slice(&self.buf[ix * m..(ix + 1) * m]);
        }

        Ok(Self {
            n: ixs.len(),
            shape: self.shape,
            buf,
            capacity: ixs.len(),
        })
    }
}

impl From<AtariObs> for AtariObsBatch {
    fn from(obs: AtariObs) -> Self {
        Self {
            n: 1,
            shape: obs.shape,
            buf: obs.frames,
            capacity: 1,
        }
    }
}

#[cfg(feature = "candle")]
mod candle {
    use super::*;
    use candle_core::{Device, Tensor};
    use std::convert::TryFrom;

    /// A tensor of shape `[1, C, H, W]` and dtype `u8`.
    impl TryFrom<AtariObs> for Tensor {
        type Error = candle_core::Error;

        fn try_from(obs: AtariObs) -> Result<Self, Self::Error> {
            let [c, h, w] = obs.shape;
            Tensor::from_vec(obs.frames, (1, c, h, w), &Device::Cpu)
        }
    }

    /// A tensor of shape `[N, C, H, W]` and dtype `u8`.
    impl TryFrom<AtariObsBatch> for Tensor {
        type Error = candle_core::Error;

        fn try_from(batch: AtariObsBatch) -> Result<Self, Self::Error> {
            let [c, h, w] = batch.shape;
            Tensor::from_vec(batch.buf, (batch.n, c, h, w), &Device::Cpu)
        }
    }
}
