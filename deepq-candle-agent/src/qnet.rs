//! Q-networks selected by name.
//!
//! The registry maps a name in [`QNetConfig::name`] to a factory building the
//! network. Available names are `NatureCnn` and `Mlp`.
use crate::{
    cnn::{Cnn, CnnConfig},
    mlp::{Mlp, MlpConfig},
    model::SubModel1,
    util::OutDim,
};
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::{Module, VarBuilder};
use deepq_core::error::DeepqError;
use serde::{Deserialize, Serialize};
use std::convert::TryInto;

/// Builds a network from a [`VarBuilder`] and a configuration.
pub type QNetFactory = fn(VarBuilder, &QNetConfig) -> Result<Box<dyn Module>>;

fn nature_cnn(vb: VarBuilder, config: &QNetConfig) -> Result<Box<dyn Module>> {
    let in_shape: [usize; 3] = config.in_shape.as_slice().try_into().map_err(|_| {
        DeepqError::InvalidConfig(format!(
            "NatureCnn expects in_shape [channels, height, width], got {:?}",
            config.in_shape
        ))
    })?;
    let cnn = Cnn::build(vb, CnnConfig::new(in_shape, config.out_dim))?;
    Ok(Box::new(cnn))
}

fn mlp(vb: VarBuilder, config: &QNetConfig) -> Result<Box<dyn Module>> {
    let in_dim = config.in_shape.iter().product();
    let mlp = Mlp::build(
        vb,
        MlpConfig::new(in_dim, config.units.clone(), config.out_dim),
    )?;
    Ok(Box::new(mlp))
}

const REGISTRY: &[(&str, QNetFactory)] = &[("NatureCnn", nature_cnn), ("Mlp", mlp)];

/// Returns the registered networks.
pub fn registry() -> &'static [(&'static str, QNetFactory)] {
    REGISTRY
}

/// Returns the factory registered with `name`.
pub fn lookup(name: &str) -> Result<QNetFactory, DeepqError> {
    registry()
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
        .ok_or_else(|| DeepqError::UnknownModel {
            name: name.to_string(),
            available: registry().iter().map(|(n, _)| n.to_string()).collect(),
        })
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`QNet`].
pub struct QNetConfig {
    /// Name of the network in the registry.
    pub name: String,

    /// Shape of a single observation.
    pub in_shape: Vec<usize>,

    /// Number of actions.
    #[serde(default)]
    pub out_dim: usize,

    /// Sizes of hidden layers, used by `Mlp`.
    #[serde(default)]
    pub units: Vec<usize>,
}

impl QNetConfig {
    /// Constructs [`QNetConfig`].
    pub fn new(name: impl Into<String>, in_shape: Vec<usize>, out_dim: usize) -> Self {
        Self {
            name: name.into(),
            in_shape,
            out_dim,
            units: vec![],
        }
    }

    /// Sets hidden layer sizes.
    pub fn units(mut self, units: Vec<usize>) -> Self {
        self.units = units;
        self
    }

    /// Sets the shape of a single observation.
    pub fn in_shape(mut self, in_shape: Vec<usize>) -> Self {
        self.in_shape = in_shape;
        self
    }
}

impl OutDim for QNetConfig {
    fn get_out_dim(&self) -> usize {
        self.out_dim
    }

    fn set_out_dim(&mut self, out_dim: usize) {
        self.out_dim = out_dim;
    }
}

/// A Q-network built from the registry.
///
/// Maps a batch of observations to a `[batch, n_actions]` tensor of action values.
pub struct QNet {
    device: Device,
    net: Box<dyn Module>,
}

impl SubModel1 for QNet {
    type Config = QNetConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let factory = lookup(&config.name)?;
        let device = vb.device().clone();
        let net = factory(vb, &config)?;
        Ok(Self { device, net })
    }

    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        Ok(self.net.forward(&xs.to_device(&self.device)?)?)
    }
}
