use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use deepq_candle_agent::{
    dqn::{Dqn, DqnConfig, DqnModel, EpsilonGreedy},
    opt::OptimizerConfig,
    qnet::{QNet, QNetConfig},
};
use deepq_core::{
    error::DeepqError,
    record::{AggregateRecorder, NullRecorder, Record},
    replay_buffer::{
        BatchBase, GenericTransitionBatch, SimpleReplayBuffer, SimpleReplayBufferConfig,
        SimpleStepProcessor, SimpleStepProcessorConfig,
    },
    Act, Agent, Configurable, DefaultEvaluator, Env, EnvSpec, Evaluator, ExperienceBufferBase,
    Obs, Policy, ReplayBufferBase, Step, StepProcessor, Trainer, TrainerConfig,
};
use std::convert::TryFrom;
use tempdir::TempDir;

const OBS_DIM: usize = 2;

#[derive(Clone, Debug)]
struct ToyObs(Vec<f32>);

impl Obs for ToyObs {}

impl TryFrom<ToyObs> for Tensor {
    type Error = candle_core::Error;

    fn try_from(obs: ToyObs) -> Result<Self, Self::Error> {
        Tensor::from_vec(obs.0, (1, OBS_DIM), &Device::Cpu)
    }
}

#[derive(Clone, Debug, PartialEq)]
struct ToyAct(usize);

impl Act for ToyAct {}

impl From<usize> for ToyAct {
    fn from(a: usize) -> Self {
        Self(a)
    }
}

/// `OBS_DIM` floats per transition.
struct ObsBatch(Vec<f32>);

impl BatchBase for ObsBatch {
    fn new(capacity: usize) -> Self {
        Self(vec![0.0; capacity * OBS_DIM])
    }

    fn push(&mut self, ix: usize, data: Self) -> Result<()> {
        let capacity = self.0.len() / OBS_DIM;
        for (j, item) in data.0.chunks(OBS_DIM).enumerate() {
            let k = (ix + j) % capacity;
            self.0[k * OBS_DIM..(k + 1) * OBS_DIM].copy_from_slice(item);
        }
        Ok(())
    }

    fn sample(&self, ixs: &[usize]) -> Result<Self> {
        Ok(Self(
            ixs.iter()
                .flat_map(|&ix| self.0[ix * OBS_DIM..(ix + 1) * OBS_DIM].iter().copied())
                .collect(),
        ))
    }
}

impl From<ToyObs> for ObsBatch {
    fn from(obs: ToyObs) -> Self {
        Self(obs.0)
    }
}

impl TryFrom<ObsBatch> for Tensor {
    type Error = candle_core::Error;

    fn try_from(b: ObsBatch) -> Result<Self, Self::Error> {
        let n = b.0.len() / OBS_DIM;
        Tensor::from_vec(b.0, (n, OBS_DIM), &Device::Cpu)
    }
}

struct ActBatch(Vec<i64>);

impl BatchBase for ActBatch {
    fn new(capacity: usize) -> Self {
        Self(vec![0; capacity])
    }

    fn push(&mut self, ix: usize, data: Self) -> Result<()> {
        let capacity = self.0.len();
        for (j, a) in data.0.into_iter().enumerate() {
            self.0[(ix + j) % capacity] = a;
        }
        Ok(())
    }

    fn sample(&self, ixs: &[usize]) -> Result<Self> {
        Ok(Self(ixs.iter().map(|&ix| self.0[ix]).collect()))
    }
}

impl From<ToyAct> for ActBatch {
    fn from(act: ToyAct) -> Self {
        Self(vec![act.0 as i64])
    }
}

impl TryFrom<ActBatch> for Tensor {
    type Error = candle_core::Error;

    fn try_from(b: ActBatch) -> Result<Self, Self::Error> {
        let n = b.0.len();
        Tensor::from_vec(b.0, (n, 1), &Device::Cpu)
    }
}

/// One-step episodes; action 0 yields reward 1, action 1 yields 0.
struct ToyEnv;

impl ToyEnv {
    fn obs() -> ToyObs {
        ToyObs(vec![1.0, 0.5])
    }
}

impl Env for ToyEnv {
    type Config = ();
    type Obs = ToyObs;
    type Act = ToyAct;
    type Info = ();

    fn build(_config: &(), _seed: i64) -> Result<Self> {
        Ok(Self)
    }

    fn spec(&self) -> EnvSpec {
        EnvSpec {
            n_actions: 2,
            obs_shape: vec![OBS_DIM],
        }
    }

    fn step(&mut self, a: &ToyAct) -> Result<(Step<Self>, Record)> {
        let reward = if a.0 == 0 { 1.0 } else { 0.0 };
        let step = Step::new(Self::obs(), a.clone(), reward, true, false, (), None);
        Ok((step, Record::empty()))
    }

    fn reset(&mut self) -> Result<ToyObs> {
        Ok(Self::obs())
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<ToyObs> {
        self.reset()
    }
}

type ReplayBuffer = SimpleReplayBuffer<ObsBatch, ActBatch>;
type StepProc = SimpleStepProcessor<ToyEnv, ObsBatch, ActBatch>;
type ToyDqn = Dqn<ToyEnv, QNet, ReplayBuffer>;

fn dqn_config(target_update_interval: usize, explorer: EpsilonGreedy) -> DqnConfig<QNetConfig> {
    DqnConfig::default()
        .q_config(QNetConfig::new("Mlp", vec![OBS_DIM], 2).units(vec![16]))
        .opt_config(OptimizerConfig::Adam { lr: 0.01 })
        .batch_size(16)
        .discount_factor(0.9)
        .target_update_interval(target_update_interval)
        .explorer(explorer)
}

/// Fills a replay buffer with transitions of both actions.
fn filled_buffer(n: usize) -> Result<ReplayBuffer> {
    let mut buffer = ReplayBuffer::build(&SimpleReplayBufferConfig::default().capacity(1000));
    for i in 0..n {
        let act = ToyAct(i % 2);
        buffer.push(GenericTransitionBatch {
            obs: ToyEnv::obs().into(),
            act: act.clone().into(),
            next_obs: ToyEnv::obs().into(),
            reward: vec![if act.0 == 0 { 1.0 } else { 0.0 }],
            is_terminated: vec![1],
            is_truncated: vec![0],
        })?;
    }
    Ok(buffer)
}

fn params(model: &DqnModel<QNet>) -> Result<Vec<(String, Vec<f32>)>> {
    let data = model
        .get_varmap()
        .data()
        .lock()
        .map_err(|_| anyhow!("lock failed"))?;
    let mut params = data
        .iter()
        .map(|(k, v)| -> Result<(String, Vec<f32>)> {
            Ok((k.clone(), v.as_tensor().flatten_all()?.to_vec1::<f32>()?))
        })
        .collect::<Result<Vec<_>>>()?;
    params.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(params)
}

#[test]
fn test_converges_to_rewarding_action() -> Result<()> {
    let config = dqn_config(10, EpsilonGreedy::new(1.0, 0.5, 200));
    let mut agent: Box<dyn Agent<ToyEnv, ReplayBuffer>> = Box::new(ToyDqn::build(config)?);
    let mut buffer = ReplayBuffer::build(&SimpleReplayBufferConfig::default().capacity(1000));
    let mut recorder: Box<dyn AggregateRecorder> = Box::new(NullRecorder::new());
    let mut evaluator = DefaultEvaluator::<ToyEnv>::new(&(), 0, 5)?;
    let mut trainer = Trainer::build(
        TrainerConfig::default()
            .max_opts(300)
            .warmup_period(32)
            .eval_interval(100),
    )?;

    let summary = trainer.train(
        ToyEnv::build(&(), 0)?,
        StepProc::build(&SimpleStepProcessorConfig::default()),
        &mut agent,
        &mut buffer,
        &mut recorder,
        &mut evaluator,
    )?;
    assert_eq!(summary.opt_steps, 300);

    agent.eval();
    for _ in 0..10 {
        assert_eq!(agent.sample(&ToyEnv::obs())?, ToyAct(0));
    }
    assert_eq!(evaluator.evaluate(&mut agent)?.get_scalar("eval_reward")?, 1.0);
    Ok(())
}

#[test]
fn test_target_network_synchronization() -> Result<()> {
    let mut agent = ToyDqn::build(dqn_config(5, EpsilonGreedy::default()))?;
    let mut buffer = filled_buffer(64)?;

    // The target network starts as a copy of the online network.
    assert_eq!(params(agent.qnet())?, params(agent.qnet_tgt())?);
    let initial = params(agent.qnet_tgt())?;

    for _ in 0..4 {
        agent.opt(&mut buffer)?;
    }
    assert_eq!(agent.n_opts(), 4);
    assert_eq!(params(agent.qnet_tgt())?, initial);
    assert_ne!(params(agent.qnet())?, initial);

    agent.opt(&mut buffer)?;
    assert_eq!(params(agent.qnet())?, params(agent.qnet_tgt())?);
    let synced = params(agent.qnet_tgt())?;

    agent.opt(&mut buffer)?;
    assert_eq!(params(agent.qnet_tgt())?, synced);
    assert_ne!(params(agent.qnet())?, synced);
    Ok(())
}

#[test]
fn test_opt_record() -> Result<()> {
    let mut agent = ToyDqn::build(dqn_config(5, EpsilonGreedy::new(1.0, 0.1, 100)))?;
    let mut buffer = filled_buffer(32)?;
    for _ in 0..10 {
        agent.sample(&ToyEnv::obs())?;
    }

    let record = agent.opt_with_record(&mut buffer)?;
    assert!(record.get_scalar("loss")? >= 0.0);
    assert!(record.get_scalar("q_mean")?.is_finite());
    assert_eq!(record.get_scalar("n_opts")?, 1.0);
    assert!((record.get_scalar("epsilon")? - 0.91).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_opt_on_empty_buffer_fails() -> Result<()> {
    let mut agent = ToyDqn::build(dqn_config(5, EpsilonGreedy::default()))?;
    let mut buffer = ReplayBuffer::build(&SimpleReplayBufferConfig::default());
    assert!(agent.opt(&mut buffer).is_err());
    assert_eq!(agent.n_opts(), 0);
    Ok(())
}

#[test]
fn test_epsilon_zero_is_greedy() -> Result<()> {
    let mut agent = ToyDqn::build(dqn_config(5, EpsilonGreedy::new(0.0, 0.0, 1)))?;
    let q = agent.action_values(&ToyEnv::obs())?;
    let greedy = if q[1] > q[0] { 1 } else { 0 };
    for _ in 0..100 {
        assert_eq!(agent.sample(&ToyEnv::obs())?, ToyAct(greedy));
    }
    Ok(())
}

#[test]
fn test_epsilon_one_is_uniform() -> Result<()> {
    let mut agent = ToyDqn::build(dqn_config(5, EpsilonGreedy::new(1.0, 1.0, 1)).seed(7))?;
    let n = 4000;
    let mut n_zeros = 0;
    for _ in 0..n {
        if agent.sample(&ToyEnv::obs())? == ToyAct(0) {
            n_zeros += 1;
        }
    }
    let p = n_zeros as f32 / n as f32;
    assert!((p - 0.5).abs() < 0.05, "{}", p);
    assert_eq!(agent.env_steps(), n);
    Ok(())
}

#[test]
fn test_eval_mode_does_not_advance_schedule() -> Result<()> {
    let mut agent = ToyDqn::build(dqn_config(5, EpsilonGreedy::new(1.0, 0.1, 100)))?;
    for _ in 0..10 {
        agent.sample(&ToyEnv::obs())?;
    }
    Agent::<ToyEnv, ReplayBuffer>::eval(&mut agent);
    assert_eq!(agent.epsilon(), 0.0);
    for _ in 0..10 {
        agent.sample(&ToyEnv::obs())?;
    }
    assert_eq!(agent.env_steps(), 10);

    Agent::<ToyEnv, ReplayBuffer>::train(&mut agent);
    assert!((agent.epsilon() - 0.91).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_checkpoint_round_trip() -> Result<()> {
    let dir = TempDir::new("dqn_checkpoint")?;
    let path = dir.path().join("episode_1");

    let mut agent = ToyDqn::build(dqn_config(3, EpsilonGreedy::default()))?;
    let mut buffer = filled_buffer(32)?;
    for _ in 0..7 {
        agent.sample(&ToyEnv::obs())?;
        agent.opt(&mut buffer)?;
    }
    agent.save_params(&path)?;
    for name in ["qnet.safetensors", "qnet_tgt.safetensors", "meta.yaml"] {
        assert!(path.join(name).exists(), "{}", name);
    }

    let mut agent_ = ToyDqn::build(dqn_config(3, EpsilonGreedy::default()).seed(1))?;
    agent_.load_params(&path)?;
    assert_eq!(params(agent_.qnet())?, params(agent.qnet())?);
    assert_eq!(params(agent_.qnet_tgt())?, params(agent.qnet_tgt())?);
    assert_eq!(agent_.env_steps(), 7);
    assert_eq!(agent_.n_opts(), 7);
    assert_eq!(
        agent_.action_values(&ToyEnv::obs())?,
        agent.action_values(&ToyEnv::obs())?
    );
    Ok(())
}

#[test]
fn test_unknown_network_name_fails() {
    let config = DqnConfig::default().q_config(QNetConfig::new("ResNet", vec![OBS_DIM], 2));
    assert!(ToyDqn::build(config).is_err());
}

#[test]
fn test_increasing_epsilon_is_rejected() {
    let config = dqn_config(10, EpsilonGreedy::new(0.1, 0.5, 100));
    let err = match ToyDqn::build(config) {
        Ok(_) => panic!("eps_start below eps_final should be rejected"),
        Err(e) => e,
    };
    assert!(matches!(
        err.downcast_ref::<DeepqError>(),
        Some(DeepqError::InvalidConfig(_))
    ));
}

#[test]
fn test_gather_of_action_values() -> Result<()> {
    // The prediction of a transition is the value of its action.
    let q = Tensor::from_slice(&[1f32, 2.0, 3.0, 4.0], (2, 2), &Device::Cpu)?;
    let a = Tensor::from_slice(&[1i64, 0], (2, 1), &Device::Cpu)?;
    let pred = q
        .gather(&a, candle_core::D::Minus1)?
        .squeeze(candle_core::D::Minus1)?
        .to_dtype(DType::F32)?;
    assert_eq!(pred.to_vec1::<f32>()?, vec![2.0, 3.0]);
    Ok(())
}
