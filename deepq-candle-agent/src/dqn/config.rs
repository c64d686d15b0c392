//! Configuration of DQN agent.
use super::{DqnModelConfig, EpsilonGreedy};
use crate::{opt::OptimizerConfig, util::CriticLoss, util::OutDim, Device};
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn) agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<Q>
where
    Q: OutDim,
{
    /// Q-network and its optimizer.
    pub model_config: DqnModelConfig<Q>,

    /// Number of transitions in a batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Discount factor.
    #[serde(default = "default_discount_factor")]
    pub discount_factor: f64,

    /// Interval of copying the Q-network into the target network, in optimization steps.
    #[serde(default = "default_target_update_interval")]
    pub target_update_interval: usize,

    /// Exploration during training.
    #[serde(default)]
    pub explorer: EpsilonGreedy,

    /// Epsilon in evaluation mode.
    #[serde(default)]
    pub eps_eval: f64,

    /// Loss between predicted and target action values.
    #[serde(default)]
    pub critic_loss: CriticLoss,

    /// Device on which the networks live.
    #[serde(default)]
    pub device: Device,

    /// Random seed of exploration.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_batch_size() -> usize {
    32
}

fn default_discount_factor() -> f64 {
    0.99
}

fn default_target_update_interval() -> usize {
    10_000
}

fn default_seed() -> u64 {
    42
}

impl<Q> Default for DqnConfig<Q>
where
    Q: OutDim,
{
    fn default() -> Self {
        Self {
            model_config: DqnModelConfig::default(),
            batch_size: default_batch_size(),
            discount_factor: default_discount_factor(),
            target_update_interval: default_target_update_interval(),
            explorer: EpsilonGreedy::default(),
            eps_eval: 0.0,
            critic_loss: CriticLoss::default(),
            device: Device::default(),
            seed: default_seed(),
        }
    }
}

impl<Q> DqnConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the configuration of the Q-network.
    pub fn q_config(mut self, v: Q) -> Self {
        self.model_config = self.model_config.q_config(v);
        self
    }

    /// Sets the number of actions.
    pub fn out_dim(mut self, v: usize) -> Self {
        self.model_config = self.model_config.out_dim(v);
        self
    }

    /// Sets the optimizer.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.model_config = self.model_config.opt_config(v);
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the interval of target network synchronization.
    pub fn target_update_interval(mut self, v: usize) -> Self {
        self.target_update_interval = v;
        self
    }

    /// Sets the explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Sets epsilon in evaluation mode.
    pub fn eps_eval(mut self, v: f64) -> Self {
        self.eps_eval = v;
        self
    }

    /// Sets the critic loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
