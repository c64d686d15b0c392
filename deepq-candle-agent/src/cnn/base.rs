use super::CnnConfig;
use crate::model::SubModel1;
use anyhow::{bail, Result};
use candle_core::{DType::F32, Device, Tensor};
use candle_nn::{
    conv::Conv2dConfig,
    conv2d, linear,
    sequential::{seq, Sequential},
    Module, VarBuilder,
};

/// (kernel, stride, out channels) of the convolutional layers.
const CONVS: [(usize, usize, usize); 3] = [(8, 4, 32), (4, 2, 64), (3, 1, 64)];

#[allow(clippy::upper_case_acronyms)]
/// Convolutional neural network, which has the same architecture of the DQN paper.
///
/// The input is a batch of stacked frames `[batch, channels, height, width]`
/// of any dtype; it is scaled by `1/255`.
pub struct Cnn {
    device: Device,
    seq: Sequential,
}

impl Cnn {
    fn stride(s: usize) -> Conv2dConfig {
        Conv2dConfig {
            stride: s,
            ..Default::default()
        }
    }

    /// Returns the number of features after the convolutional layers.
    fn flatten_dim(in_shape: &[usize; 3]) -> Result<usize> {
        let (mut h, mut w) = (in_shape[1], in_shape[2]);
        for (k, s, _) in CONVS.iter() {
            if h < *k || w < *k {
                bail!(
                    "Input of {}x{} is too small for the convolutional layers",
                    in_shape[1],
                    in_shape[2]
                );
            }
            h = (h - k) / s + 1;
            w = (w - k) / s + 1;
        }
        Ok(CONVS[2].2 * h * w)
    }

    fn create_net(vb: &VarBuilder, config: &CnnConfig) -> Result<Sequential> {
        let flatten_dim = Self::flatten_dim(&config.in_shape)?;
        let (k1, s1, c1) = CONVS[0];
        let (k2, s2, c2) = CONVS[1];
        let (k3, s3, c3) = CONVS[2];
        let seq = seq()
            .add_fn(|xs| xs.to_dtype(F32)? / 255.0)
            .add(conv2d(config.in_shape[0], c1, k1, Self::stride(s1), vb.pp("c1"))?)
            .add_fn(|xs| xs.relu())
            .add(conv2d(c1, c2, k2, Self::stride(s2), vb.pp("c2"))?)
            .add_fn(|xs| xs.relu())
            .add(conv2d(c2, c3, k3, Self::stride(s3), vb.pp("c3"))?)
            .add_fn(|xs| xs.relu()?.flatten_from(1))
            .add(linear(flatten_dim, 512, vb.pp("l1"))?)
            .add_fn(|xs| xs.relu())
            .add(linear(512, config.out_dim, vb.pp("l2"))?);

        Ok(seq)
    }
}

impl Module for Cnn {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        self.seq.forward(&xs.to_device(&self.device)?)
    }
}

impl SubModel1 for Cnn {
    type Config = CnnConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, x: &Self::Input) -> Result<Tensor> {
        Ok(Module::forward(self, x)?)
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vb.device().clone();
        let seq = Self::create_net(&vb, &config)?;
        Ok(Self { device, seq })
    }
}
