//! DQN agent implemented with candle.
use super::{config::DqnConfig, explorer::EpsilonGreedy, model::DqnModel};
use crate::{
    model::SubModel1,
    util::{argmax, hard_update, smooth_l1_loss, CriticLoss, OutDim},
};
use anyhow::Result;
use candle_core::{shape::D, DType, Device, Tensor};
use candle_nn::loss::mse;
use deepq_core::{
    record::{Record, RecordValue},
    Agent, Configurable, Env, Policy, ReplayBufferBase, TransitionBatch,
};
use log::info;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    convert::{TryFrom, TryInto},
    fs::{self, File},
    io::{BufReader, Write},
    marker::PhantomData,
    path::Path,
};

/// Step counters saved next to the parameters.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
struct DqnMeta {
    env_steps: usize,
    n_opts: usize,
}

#[allow(clippy::upper_case_acronyms)]
/// DQN agent implemented with candle.
///
/// Actions are taken epsilon-greedily from the online network `qnet`. Each
/// optimization step regresses `Q(s, a)` towards
/// `r + discount_factor * max_a' Q_tgt(s', a') * (1 - terminated)`, and every
/// `target_update_interval` optimization steps the online parameters are
/// copied into the target network `qnet_tgt`. The target network starts as
/// a copy of the online network.
///
/// Epsilon is a function of the number of actions taken in training mode.
/// In evaluation mode epsilon is `eps_eval` and the counter does not advance.
pub struct Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: TryInto<Tensor, Error = candle_core::Error>,
    E::Act: From<usize>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: TryInto<Tensor, Error = candle_core::Error>,
    <R::Batch as TransitionBatch>::ActBatch: TryInto<Tensor, Error = candle_core::Error>,
{
    target_update_interval: usize,
    batch_size: usize,
    qnet: DqnModel<Q>,
    qnet_tgt: DqnModel<Q>,
    train: bool,
    phantom: PhantomData<(E, R)>,
    discount_factor: f64,
    explorer: EpsilonGreedy,
    eps_eval: f64,
    device: Device,
    n_actions: usize,
    env_steps: usize,
    n_opts: usize,
    critic_loss: CriticLoss,
    rng: SmallRng,
}

impl<E, Q, R> Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: TryInto<Tensor, Error = candle_core::Error>,
    E::Act: From<usize>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: TryInto<Tensor, Error = candle_core::Error>,
    <R::Batch as TransitionBatch>::ActBatch: TryInto<Tensor, Error = candle_core::Error>,
{
    /// Returns `(loss, mean of the predicted action values)`.
    fn update_critic(&mut self, buffer: &mut R) -> Result<(f32, f32)> {
        let batch = buffer.batch(self.batch_size)?;
        let (obs, act, next_obs, reward, is_terminated, _is_truncated) = batch.unpack();
        let batch_size = reward.len();
        let obs: Tensor = obs.try_into()?;
        let act: Tensor = act.try_into()?;
        let act = act.to_device(&self.device)?;
        let next_obs: Tensor = next_obs.try_into()?;
        let reward = Tensor::from_slice(&reward[..], (batch_size,), &self.device)?;
        let is_not_terminated = {
            let v = is_terminated
                .into_iter()
                .map(|v| 1f32 - v as f32)
                .collect::<Vec<_>>();
            Tensor::from_vec(v, (batch_size,), &self.device)?
        };

        let pred = self
            .qnet
            .forward(&obs)?
            .gather(&act.reshape((batch_size, 1))?, D::Minus1)?
            .squeeze(D::Minus1)?;

        let tgt = {
            let q = self.qnet_tgt.forward(&next_obs)?.max(D::Minus1)?;
            let q = q.mul(&is_not_terminated)?.affine(self.discount_factor, 0.0)?;
            reward.add(&q)?.detach()
        };

        let loss = match self.critic_loss {
            CriticLoss::Mse => mse(&pred, &tgt)?,
            CriticLoss::SmoothL1 => smooth_l1_loss(&pred, &tgt)?,
        };

        self.qnet.backward_step(&loss)?;

        let q_mean = pred.mean_all()?.to_scalar::<f32>()?;
        Ok((loss.to_scalar::<f32>()?, q_mean))
    }

    fn opt_(&mut self, buffer: &mut R) -> Result<Record> {
        let (loss, q_mean) = self.update_critic(buffer)?;
        self.n_opts += 1;

        if self.n_opts % self.target_update_interval == 0 {
            hard_update(self.qnet_tgt.get_varmap(), self.qnet.get_varmap())?;
        }

        Ok(Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss)),
            ("q_mean", RecordValue::Scalar(q_mean)),
            ("epsilon", RecordValue::Scalar(self.epsilon() as f32)),
            ("n_opts", RecordValue::Scalar(self.n_opts as f32)),
        ]))
    }

    /// Returns epsilon of the current mode and step.
    pub fn epsilon(&self) -> f64 {
        match self.train {
            true => self.explorer.epsilon(self.env_steps),
            false => self.eps_eval,
        }
    }

    /// Returns the online network.
    pub fn qnet(&self) -> &DqnModel<Q> {
        &self.qnet
    }

    /// Returns the target network.
    pub fn qnet_tgt(&self) -> &DqnModel<Q> {
        &self.qnet_tgt
    }

    /// Returns the number of actions taken in training mode.
    pub fn env_steps(&self) -> usize {
        self.env_steps
    }

    /// Returns the number of optimization steps.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Returns the action values of a single observation.
    pub fn action_values(&self, obs: &E::Obs) -> Result<Vec<f32>> {
        let obs: Tensor = obs.clone().try_into()?;
        let q = self.qnet.forward(&obs)?;
        Ok(q.flatten_all()?.to_dtype(DType::F32)?.to_vec1()?)
    }
}

impl<E, Q, R> Configurable<E> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: TryInto<Tensor, Error = candle_core::Error>,
    E::Act: From<usize>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: TryInto<Tensor, Error = candle_core::Error>,
    <R::Batch as TransitionBatch>::ActBatch: TryInto<Tensor, Error = candle_core::Error>,
{
    type Config = DqnConfig<Q::Config>;

    /// Constructs DQN agent.
    fn build(config: Self::Config) -> Result<Self> {
        if config.target_update_interval == 0 || config.batch_size == 0 {
            return Err(deepq_core::error::DeepqError::InvalidConfig(
                "target_update_interval and batch_size must be positive".to_string(),
            )
            .into());
        }
        config.explorer.validate()?;
        let device = candle_core::Device::try_from(config.device)?;
        let qnet = DqnModel::build(config.model_config.clone(), &device)?;
        let qnet_tgt = DqnModel::build(config.model_config, &device)?;
        hard_update(qnet_tgt.get_varmap(), qnet.get_varmap())?;
        let n_actions = qnet.out_dim();
        if n_actions == 0 {
            return Err(deepq_core::error::DeepqError::InvalidConfig(
                "the Q-network has no output".to_string(),
            )
            .into());
        }

        Ok(Dqn {
            qnet,
            qnet_tgt,
            target_update_interval: config.target_update_interval,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            train: true,
            explorer: config.explorer,
            eps_eval: config.eps_eval,
            device,
            n_actions,
            env_steps: 0,
            n_opts: 0,
            critic_loss: config.critic_loss,
            phantom: PhantomData,
            rng: SmallRng::seed_from_u64(config.seed),
        })
    }
}

impl<E, Q, R> Policy<E> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: TryInto<Tensor, Error = candle_core::Error>,
    E::Act: From<usize>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: TryInto<Tensor, Error = candle_core::Error>,
    <R::Batch as TransitionBatch>::ActBatch: TryInto<Tensor, Error = candle_core::Error>,
{
    /// Takes a random action with probability epsilon, the greedy one otherwise.
    ///
    /// Ties between action values go to the first action.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let eps = self.epsilon();
        if self.train {
            self.env_steps += 1;
        }

        let act = if self.rng.gen::<f64>() < eps {
            self.rng.gen_range(0..self.n_actions)
        } else {
            argmax(&self.action_values(obs)?)
        };

        Ok(act.into())
    }
}

impl<E, Q, R> Agent<E, R> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: TryInto<Tensor, Error = candle_core::Error>,
    E::Act: From<usize>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: TryInto<Tensor, Error = candle_core::Error>,
    <R::Batch as TransitionBatch>::ActBatch: TryInto<Tensor, Error = candle_core::Error>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt_with_record(&mut self, buffer: &mut R) -> Result<Record> {
        self.opt_(buffer)
    }

    /// Saves `qnet.safetensors`, `qnet_tgt.safetensors` and `meta.yaml`.
    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(path.join("qnet.safetensors"))?;
        self.qnet_tgt.save(path.join("qnet_tgt.safetensors"))?;
        let meta = DqnMeta {
            env_steps: self.env_steps,
            n_opts: self.n_opts,
        };
        let mut file = File::create(path.join("meta.yaml"))?;
        file.write_all(serde_yaml::to_string(&meta)?.as_bytes())?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet.load(path.join("qnet.safetensors"))?;
        self.qnet_tgt.load(path.join("qnet_tgt.safetensors"))?;
        let file = File::open(path.join("meta.yaml"))?;
        let meta: DqnMeta = serde_yaml::from_reader(BufReader::new(file))?;
        self.env_steps = meta.env_steps;
        self.n_opts = meta.n_opts;
        info!(
            "Loaded DQN agent at {} env steps, {} opt steps",
            self.env_steps, self.n_opts
        );
        Ok(())
    }
}
