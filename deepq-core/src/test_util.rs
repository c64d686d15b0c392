//! Small environment and agent used in unit tests.
use crate::{
    error::DeepqError,
    record::{Record, RecordValue},
    replay_buffer::BatchBase,
    Act, Agent, Env, EnvSpec, Obs, Policy, ReplayBufferBase, Step,
};
use anyhow::Result;
use std::{fs, path::Path};

impl Obs for Vec<f32> {}

impl Act for usize {}

/// One `f32` per transition.
#[derive(Clone, Debug, PartialEq)]
pub struct VecBatch(pub Vec<f32>);

impl BatchBase for VecBatch {
    fn new(capacity: usize) -> Self {
        Self(vec![0.0; capacity])
    }

    fn push(&mut self, ix: usize, data: Self) -> Result<()> {
        let capacity = self.0.len();
        for (j, v) in data.0.into_iter().enumerate() {
            self.0[(ix + j) % capacity] = v;
        }
        Ok(())
    }

    fn sample(&self, ixs: &[usize]) -> Result<Self> {
        Ok(Self(ixs.iter().map(|&ix| self.0[ix]).collect()))
    }
}

impl From<Vec<f32>> for VecBatch {
    fn from(obs: Vec<f32>) -> Self {
        Self(obs)
    }
}

impl From<usize> for VecBatch {
    fn from(act: usize) -> Self {
        Self(vec![act as f32])
    }
}

/// Walks along a chain of the configured length, one node per step.
///
/// The observation is the position. Action 0 yields reward 1, action 1
/// yields 0. The episode terminates at the end of the chain.
pub struct ChainEnv {
    len: usize,
    pos: usize,
}

impl Env for ChainEnv {
    type Config = usize;
    type Obs = Vec<f32>;
    type Act = usize;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            len: *config,
            pos: 0,
        })
    }

    fn spec(&self) -> EnvSpec {
        EnvSpec {
            n_actions: 2,
            obs_shape: vec![1],
        }
    }

    fn step(&mut self, a: &usize) -> Result<(Step<Self>, Record)> {
        if *a >= 2 {
            return Err(DeepqError::InvalidAction {
                act: *a,
                n_actions: 2,
            }
            .into());
        }
        self.pos += 1;
        let reward = if *a == 0 { 1.0 } else { 0.0 };
        let is_terminated = self.pos >= self.len;
        let step = Step::new(
            vec![self.pos as f32],
            *a,
            reward,
            is_terminated,
            false,
            (),
            None,
        );
        Ok((step, Record::empty()))
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        self.pos = 0;
        Ok(vec![0.0])
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Vec<f32>> {
        self.reset()
    }
}

/// Always takes action 0 and counts its optimization steps.
#[derive(Default)]
pub struct CountingAgent {
    pub n_opts: usize,
    pub train: bool,
}

impl Policy<ChainEnv> for CountingAgent {
    fn sample(&mut self, _obs: &Vec<f32>) -> Result<usize> {
        Ok(0)
    }
}

impl<R: ReplayBufferBase> Agent<ChainEnv, R> for CountingAgent {
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
        let _ = buffer.batch(1)?;
        self.n_opts += 1;
        Ok(Record::from_slice(&[
            ("loss", RecordValue::Scalar(1.0 / self.n_opts as f32)),
            ("n_opts", RecordValue::Scalar(self.n_opts as f32)),
        ]))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        fs::write(path.join("n_opts"), self.n_opts.to_string())?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.n_opts = fs::read_to_string(path.join("n_opts"))?.parse()?;
        Ok(())
    }
}
