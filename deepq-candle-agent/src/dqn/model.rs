use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::OutDim,
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

/// Q-network and optimizer settings of [`DqnModel`].
///
/// `q_config` may be left out of a file and filled in once the environment
/// is known.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnModelConfig<Q>
where
    Q: OutDim,
{
    pub q_config: Option<Q>,
    pub opt_config: OptimizerConfig,
}

impl<Q> Default for DqnModelConfig<Q>
where
    Q: OutDim,
{
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<Q> DqnModelConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets the number of actions. Has no effect before `q_config` is set.
    pub fn out_dim(mut self, v: usize) -> Self {
        if let Some(q_config) = self.q_config.as_mut() {
            q_config.set_out_dim(v);
        }
        self
    }

    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }
}

/// A Q-network with its own variables and optimizer.
///
/// The online and the target networks of [`Dqn`](super::Dqn) are two
/// instances; only the online one is ever stepped by the optimizer.
pub struct DqnModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim,
{
    varmap: VarMap,
    n_actions: usize,
    q: Q,
    opt: Optimizer,
}

impl<Q> DqnModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    pub fn build(config: DqnModelConfig<Q::Config>, device: &Device) -> Result<Self> {
        let q_config = config.q_config.context("q_config is not set")?;
        let n_actions = q_config.get_out_dim();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let q = Q::build(vb, q_config)?;
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            varmap,
            n_actions,
            q,
            opt,
        })
    }

    /// Action values of a batch of observations, `[batch, n_actions]`.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        self.q.forward(obs)
    }

    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    pub fn out_dim(&self) -> usize {
        self.n_actions
    }

    /// Writes the variables as safetensors.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.varmap.save(path)?;
        debug!("Saved Q-network to {:?}", path);
        Ok(())
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.varmap
            .load(path)
            .with_context(|| format!("failed to load Q-network from {:?}", path))?;
        debug!("Loaded Q-network from {:?}", path);
        Ok(())
    }
}
